//! Component Lifecycle Trait
//!
//! The trait every wired component implements. This is the main integration
//! point for applications built on the hexboot runtime: the composition root
//! registers components, and the runtime drives them through start and stop.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::settings::Settings;
use crate::shutdown::ShutdownSignal;

/// Context provided to components when they start.
///
/// Everything a component may need is passed here by reference; there is no
/// global registry and no lookup by type.
#[derive(Clone)]
pub struct RuntimeContext {
    /// The fully assembled settings, shared across all components.
    pub settings: Arc<Settings>,
    /// Shutdown trigger; components may watch it or trigger it themselves.
    pub shutdown: ShutdownSignal,
}

/// A lifecycle-managed part of the application.
#[async_trait]
pub trait Component: Send + Sync {
    /// Bring the component up.
    ///
    /// Must return once the component is ready: resources acquired and any
    /// long-running work moved onto spawned tasks. Components are started in
    /// registration order, so anything an earlier registration provides is
    /// live by the time this runs.
    async fn start(&self, ctx: &RuntimeContext) -> Result<()>;

    /// Take the component down.
    ///
    /// Called in reverse registration order, under the configured grace
    /// deadline. Components are started at most once; there is no restart
    /// after stop.
    async fn stop(&self) -> Result<()>;
}
