//! Force / acceleration contributors for the particle engine
//!
//! Defines the `Acceleration` trait and the `AccelSet` collection, plus the
//! typed pairwise interaction (indexed and direct variants) and a uniform
//! background field

use log::trace;

use crate::error::SimError;
use crate::simulation::quadtree::{Circle, QuadPoint, SpatialIndex};
use crate::simulation::rules::InteractionRuleTable;
use crate::simulation::states::{NVec2, ParticleStore};

/// Separations below this are treated as coincident and skipped
pub const DISTANCE_EPSILON: f64 = 1e-9;

/// Unit vector and length of `delta`
///
/// # Errors
/// `DegenerateGeometry` when `|delta| < DISTANCE_EPSILON`
pub fn checked_direction(delta: NVec2) -> Result<(NVec2, f64), SimError> {
    let d = delta.norm();
    if d < DISTANCE_EPSILON {
        return Err(SimError::DegenerateGeometry { distance: d });
    }
    Ok((delta / d, d))
}

/// Read-only view of everything a force term may look at during a pass
pub struct ForceContext<'a> {
    pub store: &'a ParticleStore,
    pub rules: &'a InteractionRuleTable,
    pub index: &'a SpatialIndex, // must be built from `store`'s current positions
}

/// Trait for acceleration sources
/// Implementations add their contribution into `out[i]` for every live slot `i`
/// and must leave inactive slots alone
pub trait Acceleration {
    fn acceleration(&self, ctx: &ForceContext<'_>, out: &mut [NVec2]);
}

/// Collection of acceleration terms (typed interaction, fields, ...)
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per particle
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    pub fn push(&mut self, term: impl Acceleration + Send + Sync + 'static) {
        self.terms.push(Box::new(term));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compute total accelerations for all live particles
    /// - `out` must have one entry per store slot
    /// - `out[i]` is zeroed then set to the sum of all terms for live `i`
    /// - inactive slots are not touched
    pub fn accumulate_accels(&self, ctx: &ForceContext<'_>, out: &mut [NVec2]) {
        // Zero buffer
        for i in ctx.store.iter_active() {
            out[i] = NVec2::zeros();
        }
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(ctx, out);
        }
    }
}

/// Acceleration on particle `i` due to particle `j` from the typed rules.
///
/// Two rules apply to the ordered visit `(i, j)`:
/// - direct: `rule(type_j -> type_i)`, the force `j` exerts on `i`
/// - reaction: `asymmetry * rule(type_i -> type_j)`, the recoil `i` feels
///   from acting on `j`
///
/// Only `i` is written, `j` gets its share when the outer loop reaches it.
fn pair_acceleration(store: &ParticleStore, rules: &InteractionRuleTable, i: usize, j: usize) -> NVec2 {
    let delta = store.x[j] - store.x[i];
    let (dir, d) = match checked_direction(delta) {
        Ok(v) => v,
        Err(e) => {
            trace!("skipping pair ({i}, {j}): {e}");
            return NVec2::zeros();
        }
    };

    let ki = store.kind[i];
    let kj = store.kind[j];

    let mut f = 0.0;

    let direct = rules.rule(kj, ki);
    if d <= direct.activation_distance {
        f += direct.force(d);
    }

    let reaction = rules.rule(ki, kj);
    if reaction.asymmetry > 0.0 && d <= reaction.activation_distance {
        f += reaction.asymmetry * reaction.force(d);
    }

    dir * (f / store.m[i])
}

/// Typed pairwise interaction using the spatial index for neighbour search
///
/// Each live particle queries a circle of radius `rules.max_reach(type)`,
/// so no pair within activation distance is missed
pub struct TypedInteraction;

impl Acceleration for TypedInteraction {
    fn acceleration(&self, ctx: &ForceContext<'_>, out: &mut [NVec2]) {
        let store = ctx.store;
        let mut neighbours: Vec<QuadPoint> = Vec::new();

        for i in store.iter_active() {
            let reach = ctx.rules.max_reach(store.kind[i]);
            if reach <= 0.0 {
                continue;
            }

            neighbours.clear();
            ctx.index.query_circle_into(&Circle::new(store.x[i], reach), &mut neighbours);

            let mut acc = NVec2::zeros();
            for n in &neighbours {
                let j = n.index;
                if j == i || !store.is_active(j) {
                    continue;
                }
                acc += pair_acceleration(store, ctx.rules, i, j);
            }
            out[i] += acc;
        }
    }
}

/// Typed pairwise interaction summed over every live pair (O(N^2))
/// Same result as [`TypedInteraction`], used as a reference and in benchmarks
pub struct TypedInteractionDirect;

impl Acceleration for TypedInteractionDirect {
    fn acceleration(&self, ctx: &ForceContext<'_>, out: &mut [NVec2]) {
        let store = ctx.store;
        let live: Vec<usize> = store.iter_active().collect();

        for &i in &live {
            let mut acc = NVec2::zeros();
            for &j in &live {
                if j != i {
                    acc += pair_acceleration(store, ctx.rules, i, j);
                }
            }
            out[i] += acc;
        }
    }
}

/// Constant acceleration applied to every live particle (gravity, wind)
pub struct UniformField {
    pub g: NVec2,
}

impl Acceleration for UniformField {
    fn acceleration(&self, ctx: &ForceContext<'_>, out: &mut [NVec2]) {
        for i in ctx.store.iter_active() {
            out[i] += self.g;
        }
    }
}
