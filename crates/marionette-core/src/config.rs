use std::path::Path;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_iterations() -> u32 {
    24
}
const fn default_tolerance() -> f32 {
    1.0e-4
}

// ---------------------------------------------------------------------------
// MarionetteConfig
// ---------------------------------------------------------------------------

/// Workspace-level configuration, loadable from TOML.
///
/// Per-solver behavior flags (target-rotation matching, enable) live on the
/// solver component itself; this file only carries the numeric solve
/// parameters shared by all solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct MarionetteConfig {
    #[serde(default)]
    pub solver: SolverSection,
}

/// `[solver]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSection {
    /// Maximum forward/backward iterations per chain per pass (default: 24).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// End-joint distance to the goal considered converged, in scene units
    /// (default: 1e-4).
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for MarionetteConfig {
    fn default() -> Self {
        Self {
            solver: SolverSection::default(),
        }
    }
}

impl MarionetteConfig {
    /// Parse a configuration from a TOML string. Missing fields take
    /// defaults; the result is validated.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if !(self.solver.tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.solver.tolerance));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
