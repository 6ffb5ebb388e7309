//! Numerical parameters for the simulation
//!
//! `Parameters` holds the runtime knobs read every tick:
//! - tick length and sub-step count,
//! - damping, velocity cap and collision elasticity,
//! - collision constraint passes and boundary stiffness,
//! - store capacity, quadtree tuning and spawn seed
//!
//! Every field may change between ticks (UI edits, quality reductions)

use crate::simulation::quadtree::{DEFAULT_MAX_DEPTH, DEFAULT_NODE_CAPACITY};

#[derive(Debug, Clone)]
pub struct Parameters {
    pub dt: f64, // tick length
    pub sub_steps: usize, // integration sub-steps per tick, each dt / sub_steps
    pub damping: f64, // velocity multiplier per sub-step, 1 = none
    pub max_velocity: f64, // speed cap
    pub elasticity: f64, // collision / reflect restitution
    pub constraint_iterations: usize, // collision passes per sub-step
    pub boundary_stiffness: f64, // inward acceleration per unit overshoot for `attract`
    pub capacity: usize, // particle store capacity
    pub quadtree_capacity: usize, // entries per node before a split
    pub quadtree_max_depth: usize, // nodes at this depth never split
    pub seed: u64, // deterministic spawn seed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            dt: 1.0,
            sub_steps: 1,
            damping: 0.98,
            max_velocity: 10.0,
            elasticity: 0.8,
            constraint_iterations: 1,
            boundary_stiffness: 0.05,
            capacity: 5000,
            quadtree_capacity: DEFAULT_NODE_CAPACITY,
            quadtree_max_depth: DEFAULT_MAX_DEPTH,
            seed: 42,
        }
    }
}

impl Parameters {
    /// Length of one integration sub-step
    pub fn sub_dt(&self) -> f64 {
        self.dt / self.sub_steps.max(1) as f64
    }
}
