//! The owned simulation context
//!
//! `Scenario` bundles everything a tick touches:
//! - engine settings (`Engine`) and numerical parameters (`Parameters`)
//! - particle state (`ParticleStore`) and interaction rules (`InteractionRuleTable`)
//! - the derived spatial index and the active force set (`AccelSet`)
//! - the integrator state machine
//!
//! Renderers and editors hold a `&Scenario` / `&mut Scenario`; there is no
//! global state. One call to [`Scenario::step`] is one tick:
//! rebuild index -> accumulate forces -> `sub_steps` x (integrate -> collide -> boundary)

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::configuration::config::{ParticleConfig, ScenarioConfig};
use crate::error::SimError;
use crate::simulation::boundary::{apply_boundary, BoundaryMode};
use crate::simulation::collisions::resolve_collisions;
use crate::simulation::engine::Engine;
use crate::simulation::forces::{AccelSet, ForceContext, TypedInteraction, TypedInteractionDirect, UniformField};
use crate::simulation::integrator::{IntegrationMethod, Integrator};
use crate::simulation::params::Parameters;
use crate::simulation::quadtree::{QuadPoint, Rect, SpatialIndex};
use crate::simulation::rules::{InteractionRule, InteractionRuleTable};
use crate::simulation::spawn::{SpawnRequest, Spawner};
use crate::simulation::states::{NVec2, ParticleSpec, ParticleStore, AUX_SLOTS};

/// Wall-clock cost of the last tick, for an external throttling collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct StepTiming {
    pub rebuild: Duration,
    pub forces: Duration,
    pub integrate: Duration, // scheme + collisions + boundary, all sub-steps
    pub total: Duration,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct StepReport {
    pub sub_steps: usize,
    pub contacts: usize, // collision contacts resolved over all passes
    pub absorbed: usize, // particles removed by the `absorb` boundary
    pub indexed: usize, // particles inserted into the spatial index for the force pass
}

/// Quality reductions a throttling collaborator may request between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityReduction {
    /// Shrink the store capacity, dropping particles in the removed slots
    Capacity(usize),
    /// Lower the quadtree depth limit
    MaxDepth(usize),
    /// Use fewer integration sub-steps
    SubSteps(usize),
}

/// Padding added around particles that sit outside the world bounds when
/// sizing the index root
const INDEX_PAD: f64 = 1.0;

pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    store: ParticleStore,
    rules: InteractionRuleTable,
    index: SpatialIndex,
    forces: AccelSet,
    integrator: Integrator,
    spawner: Spawner,
    accel: Vec<NVec2>, // scratch buffer for the force pass
    timing: StepTiming,
    t: f64,
}

impl Scenario {
    /// Empty scenario with `type_count` types and default rules
    pub fn new(engine: Engine, parameters: Parameters, type_count: usize) -> Self {
        let store = ParticleStore::with_capacity(parameters.capacity);
        let index = SpatialIndex::new(engine.bounds, parameters.quadtree_capacity, parameters.quadtree_max_depth);
        let integrator = Integrator::new(engine.integrator);
        let spawner = Spawner::new(parameters.seed);
        let forces = default_forces(engine.use_index);

        Self {
            engine,
            parameters,
            store,
            rules: InteractionRuleTable::new(type_count.max(1)),
            index,
            forces,
            integrator,
            spawner,
            accel: Vec::new(),
            timing: StepTiming::default(),
            t: 0.0,
        }
    }

    /// Build a fully-initialized scenario from its YAML-facing configuration
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        // Engine (runtime) from EngineConfig
        let e_cfg = cfg.engine;
        let field = e_cfg.field;
        let engine = Engine {
            integrator: e_cfg.integrator,
            boundary: e_cfg.boundary,
            bounds: Rect::new(e_cfg.bounds[0], e_cfg.bounds[1], e_cfg.bounds[2], e_cfg.bounds[3]),
            collisions: e_cfg.collisions,
            use_index: e_cfg.use_index,
        };

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let defaults = Parameters::default();
        let parameters = Parameters {
            dt: p_cfg.dt,
            sub_steps: p_cfg.sub_steps.max(1),
            damping: p_cfg.damping,
            max_velocity: p_cfg.max_velocity,
            elasticity: p_cfg.elasticity,
            constraint_iterations: p_cfg.constraint_iterations,
            boundary_stiffness: p_cfg.boundary_stiffness.unwrap_or(defaults.boundary_stiffness),
            capacity: p_cfg.capacity,
            quadtree_capacity: p_cfg.quadtree_capacity.unwrap_or(defaults.quadtree_capacity),
            quadtree_max_depth: p_cfg.quadtree_max_depth.unwrap_or(defaults.quadtree_max_depth),
            seed: p_cfg.seed,
        };

        let mut scenario = Scenario::new(engine, parameters, cfg.types.count);

        // Rules: preset first, explicit overrides on top
        if let Some(preset) = &cfg.types.preset {
            scenario.apply_preset(preset)?;
        }
        for o in &cfg.types.rules {
            scenario.set_rule(o.source, o.target, o.rule)?;
        }

        // Forces: typed interaction is installed by `new`, add the optional uniform field
        if let Some([gx, gy]) = field {
            scenario.forces.push(UniformField { g: NVec2::new(gx, gy) });
        }

        // Particles: explicit ones, then spawn groups
        for pc in &cfg.particles {
            scenario.create_particle(particle_spec(pc))?;
        }
        for req in &cfg.spawn {
            scenario.add_particles(req)?;
        }

        info!(
            "built scenario: {} particles, {} types, {:?} integrator, {:?} boundary",
            scenario.store.active_count(),
            scenario.rules.type_count(),
            scenario.engine.integrator,
            scenario.engine.boundary,
        );

        Ok(scenario)
    }

    /// Replace the force set with the typed interaction matching
    /// `engine.use_index`
    pub fn install_default_forces(&mut self) {
        self.forces = default_forces(self.engine.use_index);
    }

    pub fn forces_mut(&mut self) -> &mut AccelSet {
        &mut self.forces
    }

    // read access ==========================================================================

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn rules(&self) -> &InteractionRuleTable {
        &self.rules
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn integration_method(&self) -> IntegrationMethod {
        self.integrator.method()
    }

    /// Simulated time
    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn last_timing(&self) -> StepTiming {
        self.timing
    }

    /// Kinetic energy, sum of 1/2 m |v|^2 over live particles. Potential
    /// energy is not defined for asymmetric rules.
    pub fn system_energy(&self) -> f64 {
        self.store
            .iter_active()
            .map(|i| 0.5 * self.store.m[i] * self.store.v[i].norm_squared())
            .sum()
    }

    // particle mutation ====================================================================

    /// Create one particle after checking its type
    pub fn create_particle(&mut self, spec: ParticleSpec) -> Result<usize, SimError> {
        let type_count = self.rules.type_count();
        if spec.kind >= type_count {
            return Err(SimError::InvalidType { kind: spec.kind, type_count });
        }
        let i = self.store.create(spec)?;
        self.store.sync_history(i, self.parameters.sub_dt());
        Ok(i)
    }

    /// Add up to `req.count` particles. Stops early (with a warning) once the
    /// store is full; returns how many were added.
    pub fn add_particles(&mut self, req: &SpawnRequest) -> Result<usize, SimError> {
        let type_count = self.rules.type_count();
        if let Some(kind) = req.kind {
            if kind >= type_count {
                return Err(SimError::InvalidType { kind, type_count });
            }
        }

        let region = req.region_or(self.engine.bounds);
        let mut added = 0;

        for n in 0..req.count {
            let kind = match req.kind {
                Some(k) => k,
                None => self.spawner.random_kind(type_count),
            };
            let spec = ParticleSpec {
                x: self.spawner.position(req.distribution, &region, n, req.count, kind, type_count),
                v: self.spawner.velocity(req.velocity_scale),
                m: req.mass,
                radius: req.radius,
                kind,
                aux: [0.0; AUX_SLOTS],
            };

            match self.create_particle(spec) {
                Ok(_) => added += 1,
                Err(e @ SimError::CapacityExceeded { .. }) => {
                    warn!("added {added} of {} particles: {e}", req.count);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(added)
    }

    /// Remove up to `count` live particles (of `kind` if given), highest
    /// slots first. Returns how many were removed.
    pub fn remove_particles(&mut self, count: usize, kind: Option<usize>) -> usize {
        let doomed: Vec<usize> = self
            .store
            .iter_active()
            .filter(|&i| kind.map_or(true, |k| self.store.kind[i] == k))
            .collect();
        let doomed: Vec<usize> = doomed.into_iter().rev().take(count).collect();

        for &i in &doomed {
            self.store.remove(i);
        }
        doomed.len()
    }

    pub fn remove_by_type(&mut self, kind: usize) -> usize {
        self.store.remove_by_type(kind)
    }

    pub fn set_position(&mut self, i: usize, x: NVec2) {
        if self.store.is_active(i) {
            self.store.set_position(i, x);
            self.store.sync_history(i, self.parameters.sub_dt());
        }
    }

    pub fn set_velocity(&mut self, i: usize, v: NVec2) {
        if self.store.is_active(i) {
            self.store.set_velocity(i, v);
            self.store.sync_history(i, self.parameters.sub_dt());
        }
    }

    // type / rule editing ==================================================================

    /// Change the number of types. Rules of surviving pairs are kept;
    /// particles of removed types are removed.
    pub fn set_type_count(&mut self, type_count: usize) -> Result<(), SimError> {
        if type_count == 0 {
            return Err(SimError::InvalidType { kind: 0, type_count: 0 });
        }

        let old = self.rules.type_count();
        let mut removed = 0;
        for kind in type_count..old {
            removed += self.store.remove_by_type(kind);
        }
        self.rules.resize(type_count);

        info!("type count {old} -> {type_count}, removed {removed} particles");
        Ok(())
    }

    pub fn rule(&self, source: usize, target: usize) -> Result<InteractionRule, SimError> {
        self.rules.get(source, target)
    }

    /// Out-of-range fields are clamped, see [`InteractionRuleTable::set`]
    pub fn set_rule(&mut self, source: usize, target: usize, rule: InteractionRule) -> Result<(), SimError> {
        self.rules.set(source, target, rule)
    }

    pub fn apply_preset(&mut self, name: &str) -> Result<(), SimError> {
        self.rules.apply_preset(name)
    }

    // configuration mutators ===============================================================

    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) {
        self.engine.boundary = mode;
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.engine.bounds = bounds;
    }

    pub fn set_integration_method(&mut self, method: IntegrationMethod) {
        let dt = self.parameters.sub_dt();
        self.integrator.set_method(method, &mut self.store, dt);
        self.engine.integrator = method;
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.parameters.damping = damping;
    }

    pub fn set_dt(&mut self, dt: f64) {
        let old_dt = self.parameters.sub_dt();
        self.parameters.dt = dt;
        self.retime_history(old_dt);
    }

    pub fn set_sub_steps(&mut self, sub_steps: usize) {
        let old_dt = self.parameters.sub_dt();
        self.parameters.sub_steps = sub_steps.max(1);
        self.retime_history(old_dt);
    }

    pub fn set_max_velocity(&mut self, max_velocity: f64) {
        self.parameters.max_velocity = max_velocity;
    }

    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.parameters.elasticity = elasticity;
    }

    pub fn set_constraint_iterations(&mut self, iterations: usize) {
        self.parameters.constraint_iterations = iterations;
    }

    pub fn set_collisions(&mut self, enabled: bool) {
        self.engine.collisions = enabled;
    }

    pub fn set_quadtree_params(&mut self, capacity: usize, max_depth: usize) {
        self.parameters.quadtree_capacity = capacity;
        self.parameters.quadtree_max_depth = max_depth;
    }

    /// Apply a quality reduction. Safe between any two ticks.
    pub fn reduce_quality(&mut self, request: QualityReduction) {
        match request {
            QualityReduction::Capacity(capacity) => {
                self.parameters.capacity = capacity;
                self.store.set_capacity(capacity);
            }
            QualityReduction::MaxDepth(depth) => {
                self.parameters.quadtree_max_depth = depth;
            }
            QualityReduction::SubSteps(n) => {
                let old_dt = self.parameters.sub_dt();
                self.parameters.sub_steps = n.max(1);
                self.retime_history(old_dt);
            }
        }
        info!("quality reduced: {request:?}");
    }

    /// Verlet velocity lives in `x - x_prev`, measured over the sub-step
    /// length. Rescale it whenever that length changes.
    fn retime_history(&mut self, old_dt: f64) {
        if self.integrator.is_verlet() {
            self.store.rescale_history(old_dt, self.parameters.sub_dt());
        }
    }

    // tick =================================================================================

    /// Rebuild the spatial index from the live particles. The root covers
    /// the world bounds, grown to enclose every live particle.
    pub fn rebuild_index(&mut self) -> usize {
        let mut root = self.engine.bounds;
        for i in self.store.iter_active() {
            let p = self.store.x[i];
            if !root.contains(&p) {
                root = root.expanded_to(&p, INDEX_PAD);
            }
        }

        self.index.set_capacity(self.parameters.quadtree_capacity);
        self.index.set_max_depth(self.parameters.quadtree_max_depth);
        self.index.reset(root);

        let store = &self.store;
        self.index.rebuild(store.iter_active().map(|i| QuadPoint::new(store.x[i], i)))
    }

    /// Compute accelerations for every live particle into the store
    pub fn accumulate_forces(&mut self) {
        self.accel.resize(self.store.slot_count(), NVec2::zeros());

        let ctx = ForceContext {
            store: &self.store,
            rules: &self.rules,
            index: &self.index,
        };
        self.forces.accumulate_accels(&ctx, &mut self.accel);

        let live: Vec<usize> = self.store.iter_active().collect();
        for i in live {
            self.store.a[i] = self.accel[i];
        }
    }

    /// Advance the simulation by one tick of `parameters.dt`
    pub fn step(&mut self) -> StepReport {
        let t0 = Instant::now();
        let mut report = StepReport {
            sub_steps: self.parameters.sub_steps.max(1),
            ..Default::default()
        };

        report.indexed = self.rebuild_index();
        let t_rebuild = t0.elapsed();

        let t1 = Instant::now();
        self.accumulate_forces();
        let t_forces = t1.elapsed();

        let t2 = Instant::now();
        let verlet = self.integrator.is_verlet();
        let sub_dt = self.parameters.sub_dt();

        for _ in 0..report.sub_steps {
            self.integrator.step(&mut self.store, &self.parameters);

            if self.engine.collisions {
                for _ in 0..self.parameters.constraint_iterations {
                    self.rebuild_index();
                    report.contacts += resolve_collisions(
                        &mut self.store,
                        &self.index,
                        self.parameters.elasticity,
                        verlet.then_some(sub_dt),
                    );
                }
            }

            report.absorbed += apply_boundary(&mut self.store, &self.engine.bounds, self.engine.boundary, &self.parameters, verlet);
        }
        let t_integrate = t2.elapsed();

        self.t += self.parameters.dt;
        self.timing = StepTiming {
            rebuild: t_rebuild,
            forces: t_forces,
            integrate: t_integrate,
            total: t0.elapsed(),
        };

        debug!(
            "tick t={:.3}: {} indexed, {} nodes, {} contacts, {} absorbed, {:?}",
            self.t,
            report.indexed,
            self.index.node_count(),
            report.contacts,
            report.absorbed,
            self.timing.total,
        );

        report
    }
}

fn default_forces(use_index: bool) -> AccelSet {
    if use_index {
        AccelSet::new().with(TypedInteraction)
    } else {
        AccelSet::new().with(TypedInteractionDirect)
    }
}

fn particle_spec(pc: &ParticleConfig) -> ParticleSpec {
    let mut aux = [0.0; AUX_SLOTS];
    for (slot, value) in aux.iter_mut().zip(pc.aux.iter()) {
        *slot = *value;
    }
    ParticleSpec {
        x: NVec2::new(pc.x[0], pc.x[1]),
        v: NVec2::new(pc.v[0], pc.v[1]),
        m: pc.m,
        radius: pc.radius,
        kind: pc.kind,
        aux,
    }
}
