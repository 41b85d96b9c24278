//! Runtime wiring.
//!
//! [`HeraldRuntime`] owns the command registry and ties configuration, the
//! loader and the dispatcher together. The host supplies the collaborators
//! that talk to the outside world and forwards inbound messages.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder()
//!     .config_file("herald.toml")
//!     .transport(Arc::new(MyTransport::new(client)))
//!     .catalog(Arc::new(handlers))
//!     .build()?;
//!
//! runtime.load_commands()?;
//!
//! // For every message the chat client delivers:
//! let outcome = runtime.handle(message).await;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ConfigLoader, HeraldConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use herald_core::{
    Clock, CommandRegistry, InboundMessage, Localization, ModuleResolver, ProfileStore,
    ReloadStatus, Transport,
};
use herald_framework::{
    DispatchOutcome, Dispatcher, FsResolver, HandlerCatalog, LoadReport, Loader, TextCatalog,
};

/// A configured dispatcher plus the registry it serves.
pub struct HeraldRuntime {
    config: HeraldConfig,
    registry: Arc<CommandRegistry>,
    resolver: Arc<dyn ModuleResolver>,
    loader: Loader,
    dispatcher: Dispatcher,
}

impl HeraldRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Returns the configuration the runtime was built with.
    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// Returns the command registry.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the resolver commands are loaded and reloaded through.
    pub fn resolver(&self) -> &Arc<dyn ModuleResolver> {
        &self.resolver
    }

    /// Loads the configured command tree into the registry.
    pub fn load_commands(&self) -> RuntimeResult<LoadReport> {
        self.load_commands_from(&self.config.commands.root)
    }

    /// Loads a command tree rooted at `root` into the registry.
    pub fn load_commands_from(&self, root: impl AsRef<Path>) -> RuntimeResult<LoadReport> {
        let report = self.loader.load(root, &self.registry)?;
        for failure in &report.failures {
            warn!(source = %failure.location, error = %failure.error, "Command not loaded");
        }
        Ok(report)
    }

    /// Dispatches one inbound message.
    pub async fn handle(&self, message: impl Into<Arc<InboundMessage>>) -> DispatchOutcome {
        self.dispatcher.handle(message.into()).await
    }

    /// Re-reads a command from its source.
    pub fn reload(&self, query: &str) -> ReloadStatus {
        self.registry.reload(query, self.resolver.as_ref())
    }

    /// Re-reads every command that has a source, in registration order.
    pub fn reload_all(&self) -> Vec<(String, ReloadStatus)> {
        self.registry
            .names()
            .into_iter()
            .filter(|name| {
                self.registry
                    .peek(name)
                    .is_some_and(|d| d.source().is_some())
            })
            .map(|name| {
                let status = self.reload(&name);
                (name, status)
            })
            .collect()
    }
}

impl std::fmt::Debug for HeraldRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeraldRuntime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`HeraldRuntime`].
///
/// Only the transport is mandatory. Without a resolver, commands are read
/// from TOML manifests through an [`FsResolver`] bound to the handler
/// catalogue; without a localization service, a [`TextCatalog`] with the
/// English system texts is used.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<HeraldConfig>,
    transport: Option<Arc<dyn Transport>>,
    localization: Option<Arc<dyn Localization>>,
    profiles: Option<Arc<dyn ProfileStore>>,
    clock: Option<Arc<dyn Clock>>,
    resolver: Option<Arc<dyn ModuleResolver>>,
    catalog: Option<Arc<HandlerCatalog>>,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            config: None,
            transport: None,
            localization: None,
            profiles: None,
            clock: None,
            resolver: None,
            catalog: None,
            init_logging: true,
        }
    }

    /// Sets the configuration file path.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables environment variable loading.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Uses `config` as is instead of loading one.
    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the chat transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the localization service.
    pub fn localization(mut self, localization: Arc<dyn Localization>) -> Self {
        self.localization = Some(localization);
        self
    }

    /// Sets the profile store.
    pub fn profiles(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Sets the cooldown clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the module resolver.
    pub fn resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the handler catalogue used by the default filesystem resolver.
    pub fn catalog(mut self, catalog: Arc<HandlerCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Whether to install the global tracing subscriber (default: true).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> RuntimeResult<HeraldRuntime> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.config_loader.load()?,
        };

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let transport = self
            .transport
            .ok_or(RuntimeError::MissingComponent("transport"))?;
        let localization = self.localization.unwrap_or_else(|| {
            Arc::new(TextCatalog::with_system_defaults(
                config.dispatch.default_language.clone(),
            ))
        });
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(FsResolver::new(self.catalog.unwrap_or_default())),
        };

        let registry = Arc::new(CommandRegistry::new());
        let mut dispatcher = Dispatcher::new(Arc::clone(&registry), transport, localization)
            .with_config(config.dispatch.to_dispatcher_config());
        if let Some(profiles) = self.profiles {
            dispatcher = dispatcher.with_profiles(profiles);
        }
        if let Some(clock) = self.clock {
            dispatcher = dispatcher.with_clock(clock);
        }

        let loader = Loader::new(Arc::clone(&resolver))
            .exclusion_marker(config.commands.exclusion_marker.clone())
            .policy(config.commands.load_policy);

        info!(
            fixed_prefix = %config.dispatch.fixed_prefix,
            global_prefix = ?config.dispatch.global_prefix,
            commands_root = %config.commands.root.display(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(HeraldRuntime {
            config,
            registry,
            resolver,
            loader,
            dispatcher,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herald_core::{
        CommandDefinition, ManualClock, ReloadError, TransportResult, handler_fn,
    };
    use herald_framework::{MemoryResolver, RejectReason};
    use std::fs;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<String>>);

    #[async_trait]
    impl Transport for Outbox {
        async fn can_send(&self, _message: &InboundMessage) -> bool {
            true
        }

        async fn send(&self, _message: &InboundMessage, content: &str) -> TransportResult<()> {
            self.0.lock().unwrap().push(content.to_owned());
            Ok(())
        }
    }

    fn config(root: &str) -> HeraldConfig {
        let mut config = HeraldConfig::default();
        config.commands.root = root.into();
        config
    }

    fn ping(tx: mpsc::UnboundedSender<String>, cooldown_ms: u64) -> CommandDefinition {
        CommandDefinition::new(
            "ping",
            "utility",
            handler_fn(move |_, _, _| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send("pong".into());
                    Ok(())
                }
            }),
        )
        .cooldown_ms(cooldown_ms)
    }

    #[test]
    fn test_build_requires_transport() {
        let result = HeraldRuntime::builder()
            .config(HeraldConfig::default())
            .init_logging(false)
            .build();
        assert!(matches!(
            result,
            Err(RuntimeError::MissingComponent("transport"))
        ));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = HeraldConfig::default();
        config.commands.exclusion_marker.clear();
        let result = HeraldRuntime::builder()
            .config(config)
            .transport(Arc::new(Outbox::default()))
            .init_logging(false)
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_dispatch_and_reload() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let resolver = Arc::new(MemoryResolver::new());
        let source = {
            let tx = tx.clone();
            move || ping(tx.clone(), 60_000)
        };
        resolver.insert("cmds/utility/ping", source);

        let clock = Arc::new(ManualClock::new(0));
        let outbox = Arc::new(Outbox::default());
        let runtime = HeraldRuntime::builder()
            .config(config("cmds"))
            .transport(outbox.clone())
            .resolver(resolver.clone())
            .clock(clock.clone())
            .init_logging(false)
            .build()
            .unwrap();

        let report = runtime.load_commands().unwrap();
        assert_eq!(report.loaded, vec!["ping"]);

        let user = || InboundMessage::new(herald_core::Author::new("u1"), "mai ping");
        assert!(runtime.handle(user()).await.executed());
        assert_eq!(rx.recv().await.as_deref(), Some("pong"));

        clock.set(1_000);
        assert_eq!(
            runtime.handle(user()).await.reason(),
            Some(RejectReason::Cooldown)
        );

        // The edited source drops the cooldown; the running window is gone with it.
        resolver.insert("cmds/utility/ping", move || ping(tx.clone(), 0).alias("p"));
        assert!(runtime.reload("ping").is_ok());
        assert!(runtime.handle(user()).await.executed());
        assert_eq!(rx.recv().await.as_deref(), Some("pong"));
        assert!(runtime.registry().peek("p").is_some());
        assert_eq!(outbox.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_unknown_command() {
        let runtime = HeraldRuntime::builder()
            .config(config("cmds"))
            .transport(Arc::new(Outbox::default()))
            .resolver(Arc::new(MemoryResolver::new()))
            .init_logging(false)
            .build()
            .unwrap();

        match runtime.reload("ping") {
            ReloadStatus::Failed { error } => assert!(matches!(error, ReloadError::NotFound(_))),
            ReloadStatus::Ok { .. } => panic!("reload of an unknown command succeeded"),
        }
        assert_eq!(runtime.registry().size(), 0);
    }

    #[tokio::test]
    async fn test_default_filesystem_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("commands");
        fs::create_dir_all(root.join("utility")).unwrap();
        fs::write(root.join("utility/ping.toml"), "name = \"ping\"").unwrap();
        fs::write(root.join("utility/_wip.toml"), "name = \"wip\"").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let catalog = HandlerCatalog::new().with(
            "ping",
            handler_fn(move |_, _, args| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(args.join(" "));
                    Ok(())
                }
            }),
        );

        let runtime = HeraldRuntime::builder()
            .config(config(&root.to_string_lossy()))
            .transport(Arc::new(Outbox::default()))
            .catalog(Arc::new(catalog))
            .init_logging(false)
            .build()
            .unwrap();

        runtime.load_commands().unwrap();
        assert_eq!(runtime.registry().names(), vec!["ping"]);

        let message = InboundMessage::new(herald_core::Author::new("u1"), "!ping a b");
        assert!(runtime.handle(message).await.executed());
        assert_eq!(rx.recv().await.as_deref(), Some("a b"));

        let statuses = runtime.reload_all();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].1.is_ok());
    }
}
