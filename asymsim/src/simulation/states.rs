//! Particle storage for the simulation.
//!
//! `ParticleStore` keeps every particle attribute in its own flat array
//! (struct-of-arrays). Slots are addressed by a plain `usize` index that stays
//! valid for as long as the particle is live:
//! - removal only clears the liveness flag, nothing is shifted,
//! - freed slots go onto a free list and are handed out again by `create`.
//!
//! The spatial index and the collision pass keep such indices as
//! back-references, which is why removal never compacts the arrays.

use nalgebra::Vector2;

use crate::error::SimError;

pub type NVec2 = Vector2<f64>;

/// Number of auxiliary scalar slots carried by every particle
pub const AUX_SLOTS: usize = 4;

/// Named auxiliary slots (charge plus three user slots)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxSlot {
    Charge,
    Custom1,
    Custom2,
    Custom3,
}

impl AuxSlot {
    pub fn index(self) -> usize {
        match self {
            AuxSlot::Charge => 0,
            AuxSlot::Custom1 => 1,
            AuxSlot::Custom2 => 2,
            AuxSlot::Custom3 => 3,
        }
    }
}

/// Initial state used to create one particle
#[derive(Debug, Clone)]
pub struct ParticleSpec {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
    pub radius: f64, // collision radius
    pub kind: usize, // particle type
    pub aux: [f64; AUX_SLOTS], // charge / custom scalars
}

impl Default for ParticleSpec {
    fn default() -> Self {
        Self {
            x: NVec2::zeros(),
            v: NVec2::zeros(),
            m: 1.0,
            radius: 2.0,
            kind: 0,
            aux: [0.0; AUX_SLOTS],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticleStore {
    pub(crate) x: Vec<NVec2>,
    pub(crate) v: Vec<NVec2>,
    pub(crate) a: Vec<NVec2>,
    pub(crate) x_prev: Vec<NVec2>, // verlet history
    pub(crate) m: Vec<f64>,
    pub(crate) radius: Vec<f64>,
    pub(crate) kind: Vec<usize>,
    pub(crate) aux: Vec<[f64; AUX_SLOTS]>,
    pub(crate) active: Vec<bool>,
    free: Vec<usize>,
    live: usize,
    capacity: usize,
}

impl ParticleStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            v: Vec::with_capacity(capacity),
            a: Vec::with_capacity(capacity),
            x_prev: Vec::with_capacity(capacity),
            m: Vec::with_capacity(capacity),
            radius: Vec::with_capacity(capacity),
            kind: Vec::with_capacity(capacity),
            aux: Vec::with_capacity(capacity),
            active: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
            capacity,
        }
    }

    /// Create a particle, reusing the most recently freed slot if there is one
    ///
    /// # Errors
    /// - `InvalidParticle` for a non-finite or non-positive mass or radius
    /// - `CapacityExceeded` when every slot up to `capacity` is live
    pub fn create(&mut self, spec: ParticleSpec) -> Result<usize, SimError> {
        let valid = |q: f64| q.is_finite() && q > 0.0;
        if !valid(spec.m) || !valid(spec.radius) {
            return Err(SimError::InvalidParticle { mass: spec.m, radius: spec.radius });
        }

        if let Some(i) = self.free.pop() {
            self.write_slot(i, &spec);
            self.live += 1;
            return Ok(i);
        }

        if self.x.len() >= self.capacity {
            return Err(SimError::CapacityExceeded { capacity: self.capacity });
        }

        let i = self.x.len();
        self.x.push(spec.x);
        self.v.push(spec.v);
        self.a.push(NVec2::zeros());
        self.x_prev.push(spec.x);
        self.m.push(spec.m);
        self.radius.push(spec.radius);
        self.kind.push(spec.kind);
        self.aux.push(spec.aux);
        self.active.push(true);
        self.live += 1;
        Ok(i)
    }

    fn write_slot(&mut self, i: usize, spec: &ParticleSpec) {
        self.x[i] = spec.x;
        self.v[i] = spec.v;
        self.a[i] = NVec2::zeros();
        self.x_prev[i] = spec.x;
        self.m[i] = spec.m;
        self.radius[i] = spec.radius;
        self.kind[i] = spec.kind;
        self.aux[i] = spec.aux;
        self.active[i] = true;
    }

    /// Mark a slot inactive. Inactive or out-of-range indices are ignored.
    pub fn remove(&mut self, i: usize) {
        if !self.is_active(i) {
            return;
        }
        self.active[i] = false;
        self.v[i] = NVec2::zeros();
        self.a[i] = NVec2::zeros();
        self.free.push(i);
        self.live -= 1;
    }

    /// Remove every live particle of type `kind`, returning how many went
    pub fn remove_by_type(&mut self, kind: usize) -> usize {
        let doomed: Vec<usize> = self.iter_active().filter(|&i| self.kind[i] == kind).collect();
        for &i in &doomed {
            self.remove(i);
        }
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.v.clear();
        self.a.clear();
        self.x_prev.clear();
        self.m.clear();
        self.radius.clear();
        self.kind.clear();
        self.aux.clear();
        self.active.clear();
        self.free.clear();
        self.live = 0;
    }

    /// Change the capacity. Shrinking drops every slot at or above the new
    /// capacity (live or not); slots below it keep their indices.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        if self.x.len() <= capacity {
            return;
        }

        let dropped = self.active[capacity..].iter().filter(|&&a| a).count();
        self.live -= dropped;

        self.x.truncate(capacity);
        self.v.truncate(capacity);
        self.a.truncate(capacity);
        self.x_prev.truncate(capacity);
        self.m.truncate(capacity);
        self.radius.truncate(capacity);
        self.kind.truncate(capacity);
        self.aux.truncate(capacity);
        self.active.truncate(capacity);
        self.free.retain(|&i| i < capacity);
    }

    /// Number of live particles
    pub fn active_count(&self) -> usize {
        self.live
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots ever handed out (live + free)
    pub fn slot_count(&self) -> usize {
        self.x.len()
    }

    pub fn is_active(&self, i: usize) -> bool {
        self.active.get(i).copied().unwrap_or(false)
    }

    /// Indices of live slots, ascending
    pub fn iter_active(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.iter().enumerate().filter(|&(_, &a)| a).map(|(i, _)| i)
    }

    // per-slot accessors ====================================================

    pub fn position(&self, i: usize) -> NVec2 {
        self.x[i]
    }

    pub fn velocity(&self, i: usize) -> NVec2 {
        self.v[i]
    }

    pub fn acceleration(&self, i: usize) -> NVec2 {
        self.a[i]
    }

    pub fn previous_position(&self, i: usize) -> NVec2 {
        self.x_prev[i]
    }

    pub fn mass(&self, i: usize) -> f64 {
        self.m[i]
    }

    pub fn radius(&self, i: usize) -> f64 {
        self.radius[i]
    }

    pub fn kind(&self, i: usize) -> usize {
        self.kind[i]
    }

    pub fn aux(&self, i: usize, slot: AuxSlot) -> f64 {
        self.aux[i][slot.index()]
    }

    pub fn set_position(&mut self, i: usize, x: NVec2) {
        self.x[i] = x;
    }

    pub fn set_velocity(&mut self, i: usize, v: NVec2) {
        self.v[i] = v;
    }

    pub fn set_aux(&mut self, i: usize, slot: AuxSlot, value: f64) {
        self.aux[i][slot.index()] = value;
    }

    /// Re-seed the verlet history so the next verlet step continues with the
    /// current velocity: `x_prev = x - v dt`
    pub fn sync_history(&mut self, i: usize, dt: f64) {
        self.x_prev[i] = self.x[i] - self.v[i] * dt;
    }

    /// Keep every live particle's verlet velocity when the step length goes
    /// from `old_dt` to `new_dt`: the stored displacement is scaled by
    /// `new_dt / old_dt`
    pub fn rescale_history(&mut self, old_dt: f64, new_dt: f64) {
        if old_dt <= 0.0 || old_dt == new_dt {
            return;
        }
        let ratio = new_dt / old_dt;
        for i in 0..self.x.len() {
            if self.active[i] {
                self.x_prev[i] = self.x[i] - (self.x[i] - self.x_prev[i]) * ratio;
            }
        }
    }

    // slices for renderers (include inactive slots, check `active()`) ========

    pub fn positions(&self) -> &[NVec2] {
        &self.x
    }

    pub fn velocities(&self) -> &[NVec2] {
        &self.v
    }

    pub fn radii(&self) -> &[f64] {
        &self.radius
    }

    pub fn kinds(&self) -> &[usize] {
        &self.kind
    }

    pub fn active(&self) -> &[bool] {
        &self.active
    }

    /// Largest radius among live particles (0 when empty)
    pub fn max_radius(&self) -> f64 {
        self.iter_active().map(|i| self.radius[i]).fold(0.0, f64::max)
    }
}
