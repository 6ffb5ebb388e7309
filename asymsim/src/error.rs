//! Recoverable error conditions raised by the simulation core
//!
//! None of these abort a tick: callers either validate up front or check the
//! returned `Result`

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// No free slot left in the particle store
    #[error("particle store is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// Type index outside `[0, type_count)`
    #[error("particle type {kind} is out of range for {type_count} types")]
    InvalidType { kind: usize, type_count: usize },

    /// Mass and radius must be finite and positive
    #[error("invalid particle (mass {mass}, radius {radius})")]
    InvalidParticle { mass: f64, radius: f64 },

    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    /// Two particles closer than the epsilon distance; the pair is skipped
    #[error("coincident particles (distance {distance:e})")]
    DegenerateGeometry { distance: f64 },
}
