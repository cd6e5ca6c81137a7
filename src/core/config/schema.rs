//! core::config::schema
//!
//! Configuration schema types.
//!
//! # User Config
//!
//! Located at (in order of precedence):
//! 1. `$CONLAT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/conlat/config.toml`
//! 3. `~/.conlat/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `<project>/conlat.toml` (canonical).
//!
//! # Validation
//!
//! Values are validated after parsing: limits must be positive and print
//! types must name a known partition format.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::partition::PrintType;

/// Resource limits for lattice computations.
///
/// Unset fields fall back to the next scope and finally to the engine
/// defaults.
///
/// # Example
///
/// ```toml
/// [limits]
/// max_universe_size = 64
/// max_table_size = 1048576
/// max_lattice_size = 2000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest universe the engine accepts
    pub max_universe_size: Option<usize>,

    /// Largest single operation table, in entries
    pub max_table_size: Option<usize>,

    /// Largest congruence lattice the builder will materialize
    pub max_lattice_size: Option<usize>,
}

impl LimitsConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("max_universe_size", self.max_universe_size),
            ("max_table_size", self.max_table_size),
            ("max_lattice_size", self.max_lattice_size),
        ];
        for (name, value) in fields {
            if value == Some(0) {
                return Err(ConfigError::InvalidValue(format!(
                    "limits.{} must be positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// User configuration.
///
/// # Example
///
/// ```toml
/// log_progress = true
///
/// [limits]
/// max_lattice_size = 10000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Route build progress to the log by default
    pub log_progress: Option<bool>,

    /// Resource limits
    pub limits: Option<LimitsConfig>,
}

impl UserConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(limits) = &self.limits {
            limits.validate()?;
        }
        Ok(())
    }
}

/// Project configuration.
///
/// # Example
///
/// ```toml
/// print_type = "human"
///
/// [limits]
/// max_universe_size = 32
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Partition print type used in reports
    pub print_type: Option<String>,

    /// Resource limits, overriding the user scope field by field
    pub limits: Option<LimitsConfig>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(print_type) = &self.print_type {
            print_type.parse::<PrintType>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "invalid print_type '{}', must be one of: {}",
                    print_type,
                    PrintType::ALL
                        .iter()
                        .map(PrintType::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
        }
        if let Some(limits) = &self.limits {
            limits.validate()?;
        }
        Ok(())
    }
}
