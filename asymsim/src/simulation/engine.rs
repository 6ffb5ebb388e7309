//! High-level runtime engine settings
//!
//! Selects integrator, boundary policy, world bounds, and whether the
//! spatial index or direct summation is used

use crate::simulation::boundary::BoundaryMode;
use crate::simulation::integrator::IntegrationMethod;
use crate::simulation::quadtree::Rect;

#[derive(Debug, Clone)]
pub struct Engine {
    pub integrator: IntegrationMethod, // euler, verlet or rk4
    pub boundary: BoundaryMode, // what happens at the world edge
    pub bounds: Rect, // world rectangle
    pub collisions: bool, // resolve overlaps between particles
    pub use_index: bool, // false = direct n^2 interaction, true = quadtree
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            integrator: IntegrationMethod::Euler,
            boundary: BoundaryMode::Reflect,
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            collisions: true,
            use_index: true,
        }
    }
}
