//! Boot Error Types
//!
//! The typed taxonomy for everything that can abort a boot, split between
//! runtime-level failures and settings-assembly failures.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort the boot sequence.
///
/// Everything here happens before the runtime reaches its ready state; the
/// binary surfaces these as a non-zero exit. Stop-phase problems are not part
/// of this taxonomy: the application already ran, so they are logged and
/// shutdown continues.
#[derive(Debug, Error)]
pub enum BootError {
    // Configuration Errors
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    // Runtime Errors
    #[error("failed to build async runtime: {0}")]
    RuntimeInit(#[source] std::io::Error),

    // Composition Errors
    #[error("failed to wire component `{component}`: {source}")]
    Wiring {
        component: String,
        source: anyhow::Error,
    },

    #[error("failed to start component `{component}`: {source}")]
    ComponentStart {
        component: String,
        source: anyhow::Error,
    },
}

// Result type alias for convenience
pub type BootResult<T> = Result<T, BootError>;

/// Settings-assembly errors that compose into `BootError`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{}`: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file `{}`: {source}", .path.display())]
    InvalidFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("invalid value `{value}` in environment variable {var}")]
    InvalidEnv { var: String, value: String },

    #[error("`{addr}` is not a valid listen address")]
    InvalidListenAddr { addr: String },
}
