//! Application Runtime
//!
//! The explicit composition root and the bootstrap routine built around it.
//! Components are registered at one well-defined point, constructed against
//! the assembled settings, started in registration order, and stopped in
//! reverse. The wiring is a plain dependency graph the compiler can see,
//! with no scanning and no reflection.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::args::BootArgs;
use crate::component::{Component, RuntimeContext};
use crate::endpoint::TcpEndpoint;
use crate::error::{BootError, BootResult};
use crate::logging;
use crate::settings::{self, Settings};
use crate::shutdown::{self, ShutdownReason, ShutdownSignal};

type ComponentCtor = Box<dyn FnOnce(&Settings) -> anyhow::Result<Arc<dyn Component>> + Send>;

/// The composition root: an ordered list of named component registrations.
///
/// Registration order is start order; stop order is its reverse. Constructors
/// run during `assemble`, after settings are loaded and logging is up, so a
/// wiring failure is reported with the component's registered name.
pub struct ApplicationBuilder {
    name: String,
    version: String,
    registrations: Vec<(String, ComponentCtor)>,
}

impl ApplicationBuilder {
    /// Register a component constructed from the assembled settings.
    pub fn component<C, F>(mut self, name: &str, ctor: F) -> Self
    where
        C: Component + 'static,
        F: FnOnce(&Settings) -> anyhow::Result<C> + Send + 'static,
    {
        let ctor: ComponentCtor =
            Box::new(move |settings| Ok(Arc::new(ctor(settings)?) as Arc<dyn Component>));
        self.registrations.push((name.to_string(), ctor));
        self
    }

    /// Register a pre-built component.
    ///
    /// Useful when the caller wants to keep a handle to the component; test
    /// code does this to reach a `TcpEndpoint`'s bound address.
    pub fn mount(mut self, name: &str, component: Arc<dyn Component>) -> Self {
        let ctor: ComponentCtor = Box::new(move |_| Ok(component));
        self.registrations.push((name.to_string(), ctor));
        self
    }

    /// Assemble the application: settings, logging, then every registered
    /// component, in order.
    pub fn assemble(self, args: BootArgs) -> BootResult<Application> {
        self.assemble_with_env(args, settings::process_env())
    }

    /// Assemble with an explicit environment (tests stay hermetic).
    pub fn assemble_with_env<I>(self, args: BootArgs, env: I) -> BootResult<Application>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let settings = Settings::assemble_with_env(&args, env)?;

        logging::init(&settings.log);
        logging::log_boot_started(&self.name, &self.version);
        logging::log_settings_loaded(&settings);
        for entry in &settings.ignored_overrides {
            logging::log_ignored_override(entry);
        }

        let settings = Arc::new(settings);
        let mut components = Vec::with_capacity(self.registrations.len());
        for (name, ctor) in self.registrations {
            let component = ctor(&settings).map_err(|source| BootError::Wiring {
                component: name.clone(),
                source,
            })?;
            components.push((name, component));
        }

        Ok(Application {
            name: self.name,
            settings,
            components,
            shutdown: ShutdownSignal::new(),
            args,
        })
    }
}

/// An assembled application, ready to start.
pub struct Application {
    name: String,
    settings: Arc<Settings>,
    components: Vec<(String, Arc<dyn Component>)>,
    shutdown: ShutdownSignal,
    args: BootArgs,
}

impl Application {
    /// Start a composition root for an application with the given identity.
    pub fn builder(name: &str, version: &str) -> ApplicationBuilder {
        ApplicationBuilder {
            name: name.to_string(),
            version: version.to_string(),
            registrations: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The argument vector this application was assembled from, verbatim.
    pub fn boot_args(&self) -> &[String] {
        self.args.raw()
    }

    /// A trigger that ends the application; valid before and after `start`.
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Start every component in registration order.
    ///
    /// Fails fast: the first start error stops the components already
    /// started, in reverse order, and propagates. A shutdown request
    /// arriving mid-startup skips the remaining components and unwinds the
    /// started ones; that is a clean exit, not a failure.
    pub async fn start(self) -> BootResult<RunningApplication> {
        let ctx = RuntimeContext {
            settings: self.settings.clone(),
            shutdown: self.shutdown.clone(),
        };
        let grace = self.settings.shutdown.grace();
        let mut started: Vec<(String, Arc<dyn Component>)> =
            Vec::with_capacity(self.components.len());

        for (name, component) in self.components {
            if self.shutdown.is_triggered() {
                stop_components(&started, grace).await;
                return Ok(RunningApplication {
                    name: self.name,
                    settings: self.settings,
                    components: Vec::new(),
                    shutdown: self.shutdown,
                    args: self.args,
                });
            }

            let begun = Instant::now();
            match component.start(&ctx).await {
                Ok(()) => {
                    logging::log_component_started(&name, begun.elapsed());
                    started.push((name, component));
                }
                Err(source) => {
                    logging::log_startup_failed(&name, &source);
                    stop_components(&started, grace).await;
                    return Err(BootError::ComponentStart {
                        component: name,
                        source,
                    });
                }
            }
        }

        logging::log_runtime_ready(&self.name, started.len());
        Ok(RunningApplication {
            name: self.name,
            settings: self.settings,
            components: started,
            shutdown: self.shutdown,
            args: self.args,
        })
    }

    /// Run until shutdown: install OS signal hooks, start, park, stop.
    pub async fn run(self) -> BootResult<()> {
        shutdown::install_os_hooks(&self.shutdown);
        self.start().await?.wait().await
    }
}

/// A started application.
pub struct RunningApplication {
    name: String,
    settings: Arc<Settings>,
    components: Vec<(String, Arc<dyn Component>)>,
    shutdown: ShutdownSignal,
    args: BootArgs,
}

impl RunningApplication {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The argument vector this application was booted with, verbatim.
    pub fn boot_args(&self) -> &[String] {
        self.args.raw()
    }

    /// Names of the components currently running, in start order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Park until shutdown is requested, then stop every component in
    /// reverse start order under the configured grace deadline.
    ///
    /// Stop failures and timeouts are logged and the remaining components
    /// still stop; by this point the application has run, so the boot result
    /// stays `Ok`.
    pub async fn wait(self) -> BootResult<()> {
        let reason = self.shutdown.triggered().await;
        logging::log_shutdown_begin(reason);
        stop_components(&self.components, self.settings.shutdown.grace()).await;
        logging::log_shutdown_complete(&self.name);
        Ok(())
    }

    /// Request shutdown and wait for it to finish.
    pub async fn shutdown(self) -> BootResult<()> {
        self.shutdown.trigger(ShutdownReason::Requested);
        self.wait().await
    }
}

async fn stop_components(components: &[(String, Arc<dyn Component>)], grace: Duration) {
    for (name, component) in components.iter().rev() {
        let begun = Instant::now();
        match tokio::time::timeout(grace, component.stop()).await {
            Ok(Ok(())) => logging::log_component_stopped(name, begun.elapsed()),
            Ok(Err(err)) => logging::log_component_stop_failed(name, &err),
            Err(_) => logging::log_component_stop_timeout(name, grace),
        }
    }
}

/// Boot an application from a composition root and an argument vector.
///
/// The async form of the bootstrap routine, for callers that already own a
/// runtime (tests, embedders).
pub async fn run(root: ApplicationBuilder, args: Vec<String>) -> BootResult<()> {
    let app = root.assemble(BootArgs::capture(args))?;
    app.run().await
}

/// The bootstrap routine the binary delegates to.
///
/// Builds the multi-threaded async runtime, then assembles and runs the
/// application until shutdown. Blocks for the life of the process; every
/// thread, driver, and listener lives behind this call.
///
/// ```no_run
/// fn main() -> hexboot::BootResult<()> {
///     let args: Vec<String> = std::env::args().skip(1).collect();
///     hexboot::launch(hexboot::scaffold(), args)
/// }
/// ```
pub fn launch(root: ApplicationBuilder, args: Vec<String>) -> BootResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(BootError::RuntimeInit)?;
    runtime.block_on(run(root, args))
}

/// The default composition root shipped with the `hexboot` binary: the crate
/// identity plus one TCP endpoint wired from settings. Real applications
/// grow here, one explicit registration at a time.
pub fn scaffold() -> ApplicationBuilder {
    Application::builder(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).component(
        "tcp-endpoint",
        |settings| Ok(TcpEndpoint::from_settings(settings)?),
    )
}
