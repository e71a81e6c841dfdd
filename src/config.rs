//! Runtime configuration read from the environment

use crate::dialogue::{TurnPolicy, MAX_TURNS_PER_PHASE, MIN_TURNS_PER_PHASE};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("COUNSEL_MIN_TURNS_PER_PHASE must be at least 1")]
    ZeroMinimum,
    #[error("max turns per phase ({max}) is below the minimum ({min})")]
    MaxBelowMin { max: u32, min: u32 },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// SQLite file holding counseling sessions
    pub db_path: String,
    pub turn_policy: TurnPolicy,
}

impl SimConfig {
    /// Build the configuration from process environment variables
    ///
    /// # Errors
    ///
    /// See [`SimConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Fails when a turn threshold is not a number, the minimum is zero, or
    /// the maximum is below the minimum.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = lookup("COUNSEL_DB_PATH").unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
            format!("{home}/.counsel-sim/counsel.db")
        });

        let max = parse_turns(&lookup, "COUNSEL_MAX_TURNS_PER_PHASE", MAX_TURNS_PER_PHASE)?;
        let min = parse_turns(&lookup, "COUNSEL_MIN_TURNS_PER_PHASE", MIN_TURNS_PER_PHASE)?;

        if min == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if max < min {
            return Err(ConfigError::MaxBelowMin { max, min });
        }

        Ok(Self {
            db_path,
            turn_policy: TurnPolicy {
                min_turns_per_phase: min,
                max_turns_per_phase: max,
            },
        })
    }
}

fn parse_turns(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}
