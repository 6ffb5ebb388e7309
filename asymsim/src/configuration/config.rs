//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integrator, boundary policy, world bounds, toggles
//! - [`ParametersConfig`] – numerical parameters
//! - [`TypesConfig`]      – type count, preset and per-pair rule overrides
//! - [`SpawnRequest`]     – batches of particles placed by a distribution
//! - [`ParticleConfig`]   – individually placed particles
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario matching these types:
//!
//! ```yaml
//! engine:
//!   integrator: "verlet"      # "euler", "verlet" or "rk4"
//!   boundary: "wrap"          # "reflect", "wrap", "absorb", "attract", "infinite"
//!   bounds: [0.0, 0.0, 800.0, 600.0]
//!   collisions: true
//!   use_index: true           # false -> direct n^2 interaction
//!   field: [0.0, 0.0]         # optional uniform acceleration
//!
//! parameters:
//!   dt: 1.0
//!   sub_steps: 2
//!   damping: 0.98
//!   max_velocity: 8.0
//!   elasticity: 0.8
//!   constraint_iterations: 2
//!   capacity: 4000
//!   quadtree_capacity: 8      # optional
//!   quadtree_max_depth: 10    # optional
//!   boundary_stiffness: 0.05  # optional
//!   seed: 7
//!
//! types:
//!   count: 3
//!   preset: "stable_orbits"   # optional
//!   rules:                    # optional overrides, applied after the preset
//!     - source: 0
//!       target: 1
//!       rule:
//!         attraction: 2.0
//!         repulsion: 1.0
//!         min_distance: 8.0
//!         activation_distance: 100.0
//!         falloff: "constant"
//!         asymmetry: 0.0
//!
//! spawn:
//!   - count: 500
//!     distribution: "uniform"
//!     velocity_scale: 1.0
//!
//! particles:
//!   - x: [400.0, 300.0]
//!     v: [0.0, 0.0]
//!     m: 5.0
//!     radius: 6.0
//!     kind: 0
//! ```
//!
//! The engine then maps this configuration into its runtime `Scenario`.

use serde::Deserialize;

use crate::simulation::boundary::BoundaryMode;
use crate::simulation::integrator::IntegrationMethod;
use crate::simulation::rules::InteractionRule;
use crate::simulation::spawn::SpawnRequest;

fn yes() -> bool {
    true
}

/// High-level engine configuration
#[derive(Deserialize, Debug)]
pub struct EngineConfig {
    pub integrator: IntegrationMethod, // time integrator used for advancing the system state
    pub boundary: BoundaryMode, // behaviour at the world edge
    pub bounds: [f64; 4], // x, y, width, height
    #[serde(default = "yes")]
    pub collisions: bool, // resolve overlaps between particles
    #[serde(default = "yes")]
    pub use_index: bool, // `true` - quadtree neighbour search, `false` - direct n^2 summation
    #[serde(default)]
    pub field: Option<[f64; 2]>, // uniform acceleration (gravity, wind)
}

/// Global numerical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub dt: f64, // tick length
    pub sub_steps: usize, // integration sub-steps per tick
    pub damping: f64, // velocity multiplier per sub-step
    pub max_velocity: f64, // speed cap
    pub elasticity: f64, // collision / reflect restitution
    pub constraint_iterations: usize, // collision passes per sub-step
    pub capacity: usize, // particle store capacity
    pub quadtree_capacity: Option<usize>, // entries per node before a split
    pub quadtree_max_depth: Option<usize>, // depth at which nodes stop splitting
    pub boundary_stiffness: Option<f64>, // `attract` boundary strength
    pub seed: u64, // deterministic seed to make runs reproducible
}

/// One explicit rule in the table
#[derive(Deserialize, Debug, Clone)]
pub struct RuleOverride {
    pub source: usize,
    pub target: usize,
    pub rule: InteractionRule,
}

/// Particle types and their interaction rules
#[derive(Deserialize, Debug)]
pub struct TypesConfig {
    pub count: usize, // number of particle types
    #[serde(default)]
    pub preset: Option<String>, // named preset applied to the whole table
    #[serde(default)]
    pub rules: Vec<RuleOverride>, // entries set after the preset
}

/// Configuration for a single particle's initial state
#[derive(Deserialize, Debug)]
pub struct ParticleConfig {
    pub x: [f64; 2], // initial position
    pub v: [f64; 2], // initial velocity
    pub m: f64, // mass
    pub radius: f64, // collision radius, also drawn size
    pub kind: usize, // particle type
    #[serde(default)]
    pub aux: Vec<f64>, // up to 4 auxiliary scalars (charge first)
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug)]
pub struct ScenarioConfig {
    pub engine: EngineConfig, // engine-level configuration
    pub parameters: ParametersConfig, // global numerical parameters
    pub types: TypesConfig, // type count and rules
    #[serde(default)]
    pub spawn: Vec<SpawnRequest>, // distributed batches
    #[serde(default)]
    pub particles: Vec<ParticleConfig>, // individually placed particles
}
