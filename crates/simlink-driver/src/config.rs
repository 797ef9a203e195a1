//! Process configuration, read from the environment at launch.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `SVSIM_SIMULATION_LOG` | `simulation-log.txt` | file receiving the simulation's stdout |
//! | `SVSIM_SIMULATION_TRACE` | `trace` | waveform path handed to the engine |
//! | `SVSIM_EXECUTION_SCRIPT` | unset | transcript of the session |
//! | `SVSIM_EXECUTION_SCRIPT_LIMIT` | unset | decimal cap on recorded commands |

use std::path::PathBuf;

pub const LOG_ENV: &str = "SVSIM_SIMULATION_LOG";
pub const TRACE_ENV: &str = "SVSIM_SIMULATION_TRACE";
pub const SCRIPT_ENV: &str = "SVSIM_EXECUTION_SCRIPT";
pub const SCRIPT_LIMIT_ENV: &str = "SVSIM_EXECUTION_SCRIPT_LIMIT";

pub const DEFAULT_LOG_PATH: &str = "simulation-log.txt";
pub const DEFAULT_TRACE_PATH: &str = "trace";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid execution script limit '{0}'.")]
    InvalidScriptLimit(String),
}

/// Where the driver puts its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub log_path: PathBuf,
    pub trace_path: PathBuf,
    pub script_path: Option<PathBuf>,
    /// Raw limit text; only consulted when a script is recorded.
    pub script_limit: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            trace_path: PathBuf::from(DEFAULT_TRACE_PATH),
            script_path: None,
            script_limit: None,
        }
    }
}

impl DriverConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_path: lookup(LOG_ENV).map(PathBuf::from).unwrap_or(defaults.log_path),
            trace_path: lookup(TRACE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.trace_path),
            script_path: lookup(SCRIPT_ENV).map(PathBuf::from),
            script_limit: lookup(SCRIPT_LIMIT_ENV),
        }
    }

    /// The execution script command limit, if one is set.
    pub fn parsed_script_limit(&self) -> Result<Option<u32>, ConfigError> {
        let Some(text) = self.script_limit.as_deref() else {
            return Ok(None);
        };
        text.trim()
            .parse::<u32>()
            .ok()
            .filter(|limit| i32::try_from(*limit).is_ok())
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidScriptLimit(text.to_string()))
    }
}

/// Options a backend passes to [`launch`](crate::launch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Fail at startup unless address-space randomization is off.
    pub require_aslr_disabled: bool,
}
