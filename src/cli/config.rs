//! Ballot configuration file handling
//!
//! Configuration files are TOML and hold deployment settings only: who
//! administers a newly created ballot, where its state lives, and logging.
//! Ballot state itself (voters, proposals, phase) is never stored here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// State file name inside the data directory
const STATE_FILE_NAME: &str = "ballot.cbor";

/// Ballot deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotConfig {
    /// Ballot instance settings
    pub ballot: BallotSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ballot instance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotSection {
    /// Principal recorded as administrator when the ballot is first created.
    ///
    /// Ignored once a state file exists: the stored administrator wins.
    pub administrator: String,

    /// Path to the CBOR state file
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl BallotConfig {
    /// Create a new configuration for the given administrator and state path
    #[allow(dead_code)]
    pub fn new(administrator: impl Into<String>, state_path: PathBuf) -> Self {
        Self {
            ballot: BallotSection {
                administrator: administrator.into(),
                state_path,
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: BallotConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        if config.ballot.administrator.trim().is_empty() {
            return Err(format!(
                "Config file '{}' has an empty ballot.administrator",
                path.display()
            )
            .into());
        }

        Ok(config)
    }

    /// Save configuration to a TOML file
    #[allow(dead_code)]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        write_config(path, contents)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(administrator: &str, state_path: &Path) -> String {
        format!(
            r#"# Ballot Configuration
#
# Deployment settings only. Voters, proposals and the workflow phase are
# kept in the state file and change only through ballot commands.

[ballot]
# Administrator of a newly created ballot. Once the state file exists the
# administrator stored there is authoritative and this value is ignored.
administrator = {administrator}

# Path to the ballot state file (CBOR)
state_path = {state_path}

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG overrides this value when set.
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/ballot/ballot.log"
"#,
            administrator = toml::Value::from(administrator),
            state_path = toml::Value::from(state_path.display().to_string())
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        administrator: &str,
        state_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        write_config(
            config_path,
            Self::generate_default_toml(administrator, state_path),
        )
    }
}

fn write_config(path: &Path, contents: String) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    fs::write(path, contents)
        .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

    Ok(())
}

/// Default data directory: `<data_dir>/ballot`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ballot")
}

/// Default config file path: `<data_dir>/ballot/config.toml`
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Default state file path, stored next to the config
fn default_state_path() -> PathBuf {
    default_data_dir().join(STATE_FILE_NAME)
}

/// State file path adjacent to a given config file
pub fn state_path_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(STATE_FILE_NAME)
}
