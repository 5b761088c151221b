//! Layered Runtime Settings
//!
//! Assembles the typed settings the composition root hands to every
//! component. Four layers, lowest precedence first: built-in defaults, an
//! optional TOML file, `HEXBOOT_*` environment variables, and `--key=value`
//! argument overrides. Later layers win, so `--server.port=9090` beats
//! whatever the file and environment say.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::args::BootArgs;
use crate::error::ConfigError;

/// File probed in the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "hexboot.toml";

/// Reserved argument key naming the settings file (`--config=PATH`).
const CONFIG_KEY: &str = "config";

const ENV_CONFIG: &str = "HEXBOOT_CONFIG";
const ENV_SERVER_HOST: &str = "HEXBOOT_SERVER_HOST";
const ENV_SERVER_PORT: &str = "HEXBOOT_SERVER_PORT";
const ENV_LOG_FILTER: &str = "HEXBOOT_LOG_FILTER";
const ENV_LOG_FORMAT: &str = "HEXBOOT_LOG_FORMAT";
const ENV_SHUTDOWN_GRACE: &str = "HEXBOOT_SHUTDOWN_GRACE_MS";

/// Fully assembled runtime settings.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub shutdown: ShutdownSettings,

    /// `--key=value` overrides that matched no known setting. Retained so the
    /// runtime can warn about them once logging is up; never fatal.
    #[serde(skip)]
    pub ignored_overrides: Vec<String>,

    /// The config file that was actually loaded, if any.
    #[serde(skip)]
    pub config_source: Option<PathBuf>,
}

/// Listener settings (`[server]`, `HEXBOOT_SERVER_*`, `--server.*=`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// IP address the TCP endpoint binds. IPv6 addresses may be given bare
    /// or in brackets.
    pub host: String,
    /// Listen port; 0 asks the OS for an ephemeral one.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Logging settings (`[log]`, `HEXBOOT_LOG_*`, `--log.*=`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` EnvFilter directives; `RUST_LOG` in the environment still
    /// takes precedence over this value.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Shutdown settings (`[shutdown]`, `HEXBOOT_SHUTDOWN_*`, `--shutdown.*=`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShutdownSettings {
    /// Per-component stop deadline in milliseconds. A component that takes
    /// longer is abandoned with a warning so shutdown cannot hang.
    pub grace_ms: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self { grace_ms: 5_000 }
    }
}

impl ShutdownSettings {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// Log output shape; parsed case-insensitively everywhere it can appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl<'de> Deserialize<'de> for LogFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::unknown_variant(&raw, &["text", "json"]))
    }
}

impl Settings {
    /// Assemble settings from the captured arguments and the process
    /// environment.
    pub fn assemble(args: &BootArgs) -> Result<Self, ConfigError> {
        Self::assemble_with_env(args, process_env())
    }

    /// Assemble settings with an explicit environment, so tests never have to
    /// mutate process globals.
    pub fn assemble_with_env<I>(args: &BootArgs, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: BTreeMap<String, String> = env.into_iter().collect();

        let mut settings = Self::load_file(args, &env)?;
        settings.apply_env(&env)?;
        settings.apply_overrides(args)?;

        // Catch a bad listener address now, as a configuration error, instead
        // of later as a bind failure.
        let _ = settings.socket_addr()?;
        Ok(settings)
    }

    /// The address the TCP endpoint should bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = &self.server.host;
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.server.port)
        } else {
            format!("{}:{}", host, self.server.port)
        };
        addr.parse()
            .map_err(|_| ConfigError::InvalidListenAddr { addr })
    }

    fn load_file(args: &BootArgs, env: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let (path, explicit) = match args.override_of(CONFIG_KEY) {
            Some(path) => (PathBuf::from(path), true),
            None => match env.get(ENV_CONFIG) {
                Some(path) => (PathBuf::from(path), true),
                None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            // A missing probe file just means "use the defaults"; a missing
            // explicitly named file is an error.
            Err(source) if !explicit && source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::UnreadableFile { path, source }),
        };

        let mut settings: Settings = toml::from_str(&text)
            .map_err(|source| ConfigError::InvalidFile {
                path: path.clone(),
                source,
            })?;
        settings.config_source = Some(path);
        Ok(settings)
    }

    fn apply_env(&mut self, env: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(host) = env.get(ENV_SERVER_HOST) {
            self.server.host = host.clone();
        }
        if let Some(port) = env.get(ENV_SERVER_PORT) {
            self.server.port = parse_env(ENV_SERVER_PORT, port)?;
        }
        if let Some(filter) = env.get(ENV_LOG_FILTER) {
            self.log.filter = filter.clone();
        }
        if let Some(format) = env.get(ENV_LOG_FORMAT) {
            self.log.format = LogFormat::parse(format).ok_or_else(|| ConfigError::InvalidEnv {
                var: ENV_LOG_FORMAT.to_string(),
                value: format.clone(),
            })?;
        }
        if let Some(grace) = env.get(ENV_SHUTDOWN_GRACE) {
            self.shutdown.grace_ms = parse_env(ENV_SHUTDOWN_GRACE, grace)?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, args: &BootArgs) -> Result<(), ConfigError> {
        for (key, value) in args.overrides() {
            match key.as_str() {
                // Consumed by `load_file`.
                CONFIG_KEY => {}
                "server.host" => self.server.host = value.clone(),
                "server.port" => self.server.port = parse_override(key, value)?,
                "log.filter" => self.log.filter = value.clone(),
                "log.format" => {
                    self.log.format =
                        LogFormat::parse(value).ok_or_else(|| ConfigError::InvalidValue {
                            key: key.clone(),
                            value: value.clone(),
                        })?;
                }
                "shutdown.grace_ms" => self.shutdown.grace_ms = parse_override(key, value)?,
                _ => self.ignored_overrides.push(format!("{key}={value}")),
            }
        }
        Ok(())
    }
}

/// Snapshot of the process environment, keeping only entries that are valid
/// Unicode. A non-Unicode entry can never match a `HEXBOOT_*` variable.
pub(crate) fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn parse_override<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_env<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
