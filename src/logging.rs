//! Boot Logging Module
//!
//! Structured logging for the boot runtime using the tracing crate. Covers
//! subscriber installation (text or JSON) and the lifecycle events emitted
//! while the composition root assembles, starts, and stops the application.

use std::time::Duration;

use tracing::{debug, error, info, warn, Dispatch};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use crate::settings::{LogFormat, LogSettings, Settings};
use crate::shutdown::ShutdownReason;

/// Initialize the tracing subscriber from the assembled log settings.
///
/// Installation is tolerant: if a subscriber is already in place (tests boot
/// more than once per process) the call is a no-op instead of a panic.
pub fn init(settings: &LogSettings) {
    let directives = filter_directives(settings, std::env::var("RUST_LOG").ok().as_deref());
    let dispatch = build_dispatch(settings.format, &directives, std::io::stdout);

    if tracing::dispatcher::set_global_default(dispatch).is_ok() {
        debug!(
            filter = %directives,
            format = %settings.format,
            event = "logging_initialized",
            "Tracing initialized"
        );
    }
}

/// The filter directives `init` will use: `RUST_LOG` when set and non-empty,
/// the configured filter otherwise.
pub fn filter_directives(settings: &LogSettings, rust_log: Option<&str>) -> String {
    match rust_log {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => settings.filter.clone(),
    }
}

/// Build the subscriber without installing it, with the output writer
/// injectable so tests can capture and inspect log lines.
pub(crate) fn build_dispatch<W>(format: LogFormat, directives: &str, make_writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::new(directives);

    match format {
        LogFormat::Json => {
            // JSON format for production/structured logging
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(make_writer);

            Dispatch::new(tracing_subscriber::registry().with(env_filter).with(fmt_layer))
        }
        LogFormat::Text => {
            // Human-readable format for development
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(make_writer);

            Dispatch::new(tracing_subscriber::registry().with(env_filter).with(fmt_layer))
        }
    }
}

/// Boot lifecycle logging
pub fn log_boot_started(name: &str, version: &str) {
    info!(
        name = %name,
        version = %version,
        event = "boot_started",
        "🚀 Booting application"
    );
}

pub fn log_settings_loaded(settings: &Settings) {
    match &settings.config_source {
        Some(path) => info!(
            config = %path.display(),
            event = "settings_loaded",
            "Settings assembled"
        ),
        None => info!(
            event = "settings_loaded",
            "Settings assembled from defaults, environment and arguments"
        ),
    }
}

pub fn log_ignored_override(entry: &str) {
    warn!(
        argument = %entry,
        event = "unknown_override",
        "Ignoring unknown argument override"
    );
}

/// Component lifecycle logging
pub fn log_component_started(component: &str, elapsed: Duration) {
    info!(
        component = %component,
        startup_ms = elapsed.as_millis() as u64,
        event = "component_started",
        "Component started"
    );
}

pub fn log_component_stopped(component: &str, elapsed: Duration) {
    info!(
        component = %component,
        stop_ms = elapsed.as_millis() as u64,
        event = "component_stopped",
        "Component stopped"
    );
}

pub fn log_component_stop_failed(component: &str, error: &anyhow::Error) {
    error!(
        component = %component,
        error = %error,
        event = "component_stop_failed",
        "Component failed to stop cleanly"
    );
}

pub fn log_component_stop_timeout(component: &str, grace: Duration) {
    warn!(
        component = %component,
        grace_ms = grace.as_millis() as u64,
        event = "component_stop_timeout",
        "Component did not stop within the grace period"
    );
}

pub fn log_startup_failed(component: &str, error: &anyhow::Error) {
    error!(
        component = %component,
        error = %error,
        event = "startup_failed",
        "Component failed to start; unwinding"
    );
}

/// Runtime lifecycle logging
pub fn log_runtime_ready(name: &str, components: usize) {
    info!(
        name = %name,
        components = components,
        event = "runtime_ready",
        "Application ready"
    );
}

pub fn log_shutdown_begin(reason: ShutdownReason) {
    info!(
        reason = %reason,
        event = "shutdown_begin",
        "Shutting down"
    );
}

pub fn log_shutdown_complete(name: &str) {
    info!(
        name = %name,
        event = "shutdown_complete",
        "Application stopped"
    );
}
