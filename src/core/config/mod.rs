//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! conlat has two configuration scopes:
//! - **User**: per-user defaults
//! - **Project**: overrides for computations run from a project directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. User config file
//! 3. Project config file
//! 4. Explicit builder arguments (not handled here)
//!
//! # User Config Locations
//!
//! Searched in order:
//! 1. `$CONLAT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/conlat/config.toml`
//! 3. `~/.conlat/config.toml` (canonical write location)
//!
//! # Project Config Locations
//!
//! Searched in order:
//! 1. `conlat.toml` (canonical)
//! 2. `.conlat/config.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use conlat::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let limits = result.config.limits();
//! println!("max lattice size: {}", limits.max_lattice_size);
//! ```

pub mod schema;

pub use schema::{LimitsConfig, ProjectConfig, UserConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::error::ErrorKind;
use super::limits::Limits;
use super::partition::PrintType;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

impl ConfigError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: project over user over defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// User configuration
    pub user: UserConfig,
    /// Project configuration (if a project directory was given)
    pub project: Option<ProjectConfig>,
    user_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads the project config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let user_file = Self::find_user_config();
        Self::load_from(user_file.as_deref(), project_dir)
    }

    /// Load configuration from an explicit user file and project directory.
    pub fn load_from(
        user_file: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (user, user_path) = match user_file {
            Some(path) if path.exists() => (
                Self::read_config::<UserConfig>(path)?,
                Some(path.to_path_buf()),
            ),
            _ => (UserConfig::default(), None),
        };

        let (project, project_path) = match project_dir {
            Some(dir) => Self::load_project(dir, &mut warnings)?,
            None => (None, None),
        };

        user.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        for warning in &warnings {
            tracing::warn!(path = %warning.path.display(), "{}", warning.message);
        }

        Ok(ConfigLoadResult {
            config: Config {
                user,
                project,
                user_path,
                project_path,
            },
            warnings,
        })
    }

    /// Locate the user config file, if any.
    fn find_user_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CONLAT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("conlat/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".conlat/config.toml"))
            .filter(|path| path.exists())
    }

    fn load_project(
        project_dir: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<ProjectConfig>, Option<PathBuf>), ConfigError> {
        let canonical = Self::project_config_path(project_dir);
        if canonical.exists() {
            let config = Self::read_config(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        let compat = project_dir.join(".conlat/config.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = Self::read_config(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for user config.
    ///
    /// Returns `~/.conlat/config.toml`.
    pub fn user_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".conlat/config.toml"))
    }

    /// Get the canonical path for project config.
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join("conlat.toml")
    }

    /// Write project config atomically.
    ///
    /// Writes to a temporary file next to the target, then renames.
    pub fn write_project(
        project_dir: &Path,
        config: &ProjectConfig,
    ) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::project_config_path(project_dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn limit(&self, pick: impl Fn(&LimitsConfig) -> Option<usize>) -> Option<usize> {
        let project = self
            .project
            .as_ref()
            .and_then(|p| p.limits.as_ref())
            .and_then(&pick);
        project.or_else(|| self.user.limits.as_ref().and_then(&pick))
    }

    /// Resource limits, resolved field by field.
    pub fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_universe_size: self
                .limit(|l| l.max_universe_size)
                .unwrap_or(defaults.max_universe_size),
            max_table_size: self
                .limit(|l| l.max_table_size)
                .unwrap_or(defaults.max_table_size),
            max_lattice_size: self
                .limit(|l| l.max_lattice_size)
                .unwrap_or(defaults.max_lattice_size),
        }
    }

    /// Partition print type for reports.
    ///
    /// Defaults to `ewk` if not configured.
    pub fn print_type(&self) -> PrintType {
        self.project
            .as_ref()
            .and_then(|p| p.print_type.as_deref())
            .and_then(|s| s.parse().ok())
            .unwrap_or(PrintType::Ewk)
    }

    /// Whether builds should log progress by default.
    ///
    /// Defaults to `false` if not configured.
    pub fn log_progress(&self) -> bool {
        self.user.log_progress.unwrap_or(false)
    }

    /// Get the path to the loaded user config file.
    pub fn user_config_loaded_from(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(None, Some(temp.path())).unwrap();
        let config = result.config;

        assert_eq!(config.limits(), Limits::default());
        assert_eq!(config.print_type(), PrintType::Ewk);
        assert!(!config.log_progress());
        assert!(config.user_config_loaded_from().is_none());
        assert!(config.project_config_loaded_from().is_none());
    }

    #[test]
    fn load_user_file() {
        let temp = TempDir::new().unwrap();
        let user_path = temp.path().join("config.toml");
        fs::write(
            &user_path,
            r#"
            log_progress = true

            [limits]
            max_universe_size = 10
            "#,
        )
        .unwrap();

        let result = Config::load_from(Some(&user_path), None).unwrap();
        let config = result.config;

        assert!(config.log_progress());
        assert_eq!(config.limits().max_universe_size, 10);
        assert_eq!(
            config.limits().max_lattice_size,
            Limits::default().max_lattice_size
        );
        assert_eq!(config.user_config_loaded_from(), Some(user_path.as_path()));
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("conlat.toml"),
            r#"
            print_type = "human"

            [limits]
            max_lattice_size = 50
            "#,
        )
        .unwrap();

        let result = Config::load_from(None, Some(temp.path())).unwrap();
        assert_eq!(result.config.print_type(), PrintType::Human);
        assert_eq!(result.config.limits().max_lattice_size, 50);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn load_project_compat_warns() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".conlat");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "print_type = \"block\"").unwrap();

        let result = Config::load_from(None, Some(temp.path())).unwrap();

        assert_eq!(result.config.print_type(), PrintType::Block);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("deprecated"));
    }

    #[test]
    fn write_project_config_atomic() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig {
            print_type: Some("sq_brace_block".to_string()),
            ..Default::default()
        };

        let path = Config::write_project(temp.path(), &config).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = Config::load_from(None, Some(temp.path())).unwrap();
        assert_eq!(loaded.config.print_type(), PrintType::SqBraceBlock);
    }

    #[test]
    fn zero_limit_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("conlat.toml"),
            "[limits]\nmax_universe_size = 0\n",
        )
        .unwrap();

        let err = Config::load_from(None, Some(temp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("conlat.toml"), "trunk = \"main\"\n").unwrap();

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn precedence_project_overrides_user() {
        let config = Config {
            user: UserConfig {
                limits: Some(LimitsConfig {
                    max_universe_size: Some(8),
                    max_table_size: Some(100),
                    ..Default::default()
                }),
                ..Default::default()
            },
            project: Some(ProjectConfig {
                limits: Some(LimitsConfig {
                    max_universe_size: Some(4),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            user_path: None,
            project_path: None,
        };

        let limits = config.limits();
        assert_eq!(limits.max_universe_size, 4);
        assert_eq!(limits.max_table_size, 100);
        assert_eq!(limits.max_lattice_size, Limits::default().max_lattice_size);
    }
}
