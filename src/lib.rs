//! Explicit bootstrap runtime for long-running services
//!
//! A small composition-root framework: capture the argument vector, layer
//! configuration from defaults, file, environment and arguments, bring up
//! structured logging, construct and start components in registration order,
//! then run until a shutdown signal and stop them in reverse.

// Re-export the main modules
pub mod args;
pub mod component;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod settings;
pub mod shutdown;

// Test modules
#[cfg(test)]
pub mod tests;

// Re-export key types
pub use args::BootArgs;
pub use component::{Component, RuntimeContext};
pub use endpoint::TcpEndpoint;
pub use error::{BootError, BootResult, ConfigError};
pub use runtime::{launch, run, scaffold, Application, ApplicationBuilder, RunningApplication};
pub use settings::{LogFormat, Settings};
pub use shutdown::{ShutdownReason, ShutdownSignal};
