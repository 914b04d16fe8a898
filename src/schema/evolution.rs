//! Evolution configuration types for the steady-state painter.
//!
//! This module provides the run-level settings (population, generation cap,
//! snapshot cadence, initialization retry policy) layered on top of
//! [`ImageConfig`], plus the serializable run statistics.

use serde::{Deserialize, Serialize};

use super::{ConfigError, ImageConfig};

/// Top-level configuration for a painter run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Genome, geometry and rendering parameters.
    #[serde(default)]
    pub image: ImageConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Generations between progress snapshots (0 disables periodic snapshots).
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
    /// How long initialization keeps constructing individuals.
    #[serde(default)]
    pub init_retry: RetryPolicy,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_snapshot_interval() -> u64 {
    100
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            image: ImageConfig::default(),
            population: PopulationConfig::default(),
            snapshot_interval: default_snapshot_interval(),
            init_retry: RetryPolicy::default(),
            random_seed: None,
        }
    }
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals kept alive during evolution.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Generation cap; effectively "run until stopped" by default.
    #[serde(default = "default_max_generations")]
    pub max_generations: u64,
    /// Attempts to draw a second parent distinct from the first.
    #[serde(default = "default_parent_resamples")]
    pub max_parent_resamples: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            max_parent_resamples: default_parent_resamples(),
        }
    }
}

fn default_population_size() -> usize {
    500
}
fn default_max_generations() -> u64 {
    10_000_000
}
fn default_parent_resamples() -> usize {
    100
}

/// Retry policy for building the initial population.
///
/// Individuals scoring zero are discarded and construction is repeated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type")]
pub enum RetryPolicy {
    /// Keep constructing until the population is full or the run is cancelled.
    #[default]
    Unbounded,
    /// Give up after this many constructed individuals.
    MaxAttempts { attempts: u64 },
}

impl RetryPolicy {
    /// How many more constructions are allowed after `attempts` so far.
    pub fn remaining(&self, attempts: u64) -> Option<u64> {
        match self {
            Self::Unbounded => None,
            Self::MaxAttempts { attempts: cap } => Some(cap.saturating_sub(attempts)),
        }
    }

    /// Whether another construction may be attempted.
    pub fn allows(&self, attempts: u64) -> bool {
        self.remaining(attempts).is_none_or(|left| left > 0)
    }
}

/// Current phase of the engine's state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// No population yet.
    #[default]
    Uninitialized,
    /// Constructing and scoring the initial population.
    Initializing,
    /// Steady-state reproduction.
    Evolving,
    /// Best and worst fitness coincide.
    Converged,
    /// Generation cap reached.
    Exhausted,
    /// Stopped through the cancellation handle.
    Cancelled,
}

impl EvolutionPhase {
    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted | Self::Cancelled)
    }
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Population lost all fitness diversity.
    Converged,
    /// Reached maximum generations.
    MaxGenerations,
    /// User cancelled.
    Cancelled,
}

impl From<StopReason> for EvolutionPhase {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Converged => Self::Converged,
            StopReason::MaxGenerations => Self::Exhausted,
            StopReason::Cancelled => Self::Cancelled,
        }
    }
}

/// Statistics from a painter run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Steady-state generations completed.
    pub generations: u64,
    /// Oracle calls made, initialization included.
    pub total_evaluations: u64,
    /// Individuals constructed during initialization.
    pub init_attempts: u64,
    /// Best fitness in the final population.
    pub best_fitness: Option<f64>,
    /// Worst fitness in the final population.
    pub worst_fitness: Option<f64>,
    /// Mean fitness of the final population.
    pub mean_fitness: Option<f64>,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Generation cap must be positive")]
    InvalidGenerationCap,
    #[error("Image config validation failed: {0}")]
    ImageConfigError(#[from] ConfigError),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.image.validate()?;

        if self.population.size == 0 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        if self.population.max_generations == 0 {
            return Err(EvolutionConfigError::InvalidGenerationCap);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population.size, 500);
        assert_eq!(config.population.max_generations, 10_000_000);
        assert_eq!(config.snapshot_interval, 100);
    }

    #[test]
    fn test_default_matches_empty_json() {
        let parsed: EvolutionConfig = serde_json::from_str("{}").unwrap();
        let built = EvolutionConfig::default();
        assert_eq!(parsed.snapshot_interval, built.snapshot_interval);
        assert_eq!(parsed.population.size, built.population.size);
        assert_eq!(parsed.image, built.image);
        assert_eq!(parsed.init_retry, built.init_retry);
    }

    #[test]
    fn test_image_errors_are_wrapped() {
        let mut config = EvolutionConfig::default();
        config.image.max_shape_size = config.image.min_shape_size;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::ImageConfigError(
                ConfigError::InvalidShapeSize { .. }
            ))
        ));
    }

    #[test]
    fn test_rejects_empty_population() {
        let mut config = EvolutionConfig::default();
        config.population.size = 0;
        assert_eq!(
            config.validate(),
            Err(EvolutionConfigError::PopulationTooSmall)
        );
    }

    #[test]
    fn test_retry_policy() {
        assert!(RetryPolicy::Unbounded.allows(u64::MAX));
        let capped = RetryPolicy::MaxAttempts { attempts: 3 };
        assert_eq!(capped.remaining(1), Some(2));
        assert!(capped.allows(2));
        assert!(!capped.allows(3));
    }

    #[test]
    fn test_stop_reason_maps_to_terminal_phase() {
        for reason in [
            StopReason::Converged,
            StopReason::MaxGenerations,
            StopReason::Cancelled,
        ] {
            assert!(EvolutionPhase::from(reason).is_terminal());
        }
        assert!(!EvolutionPhase::Evolving.is_terminal());
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig {
            init_retry: RetryPolicy::MaxAttempts { attempts: 50 },
            random_seed: Some(7),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.init_retry, config.init_retry);
        assert_eq!(parsed.random_seed, Some(7));
        assert_eq!(parsed.image, config.image);
    }
}
