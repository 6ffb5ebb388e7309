pub mod error;
pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use error::SimError;

pub use simulation::states::{ParticleStore, ParticleSpec, AuxSlot, NVec2, AUX_SLOTS};
pub use simulation::rules::{InteractionRule, InteractionRuleTable, ForceFalloff, Preset};
pub use simulation::quadtree::{SpatialIndex, Rect, Circle, QuadPoint};
pub use simulation::forces::{Acceleration, AccelSet, ForceContext, TypedInteraction, TypedInteractionDirect, UniformField};
pub use simulation::integrator::{IntegrationMethod, Integrator};
pub use simulation::boundary::BoundaryMode;
pub use simulation::spawn::{Distribution, SpawnRequest};
pub use simulation::params::Parameters;
pub use simulation::engine::Engine;
pub use simulation::scenario::{Scenario, StepReport, StepTiming, QualityReduction};

pub use configuration::config::{EngineConfig, ParametersConfig, TypesConfig, RuleOverride, ParticleConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_forces, bench_step_curve};
