use bevy::ecs::entity::Entity;
use thiserror::Error;

/// Top-level error type for the marionette stack.
#[derive(Debug, Error)]
pub enum MarionetteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Binding error: {0}")]
    Binding(#[from] BindError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid max_iterations: 0 (must be > 0)")]
    ZeroIterations,

    #[error("Invalid tolerance: {0} (must be > 0)")]
    InvalidTolerance(f32),
}

/// Chain-registration errors, reported synchronously at bind time.
///
/// Per-pass conditions (missing target, degenerate chain) are not errors:
/// the affected chain is skipped for that pass and nothing propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("Invalid topology: effector joint {effector:?} is not a descendant of solver {solver:?}")]
    InvalidTopology { effector: Entity, solver: Entity },
}
