pub mod states;
pub mod params;
pub mod engine;
pub mod rules;
pub mod quadtree;
pub mod forces;
pub mod integrator;
pub mod collisions;
pub mod boundary;
pub mod spawn;
pub mod scenario;
