//! # Herald
//!
//! A message-driven command dispatcher for chat clients.
//!
//! ## Overview
//!
//! Herald receives text messages from a chat client, decides whether a message
//! addresses the bot, resolves the command it names and runs it once the
//! caller has passed the permission and cooldown gates.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────────────────────┐     ┌──────────┐
//! │ Chat client │────▶│ Dispatcher                                   │────▶│ Handler  │
//! │ (Transport) │     │ send ▶ prefix ▶ lookup ▶ permission ▶ cooldown│     │ (spawned)│
//! └─────────────┘     └──────────────────────────────────────────────┘     └──────────┘
//!                                        │ get
//!                                 ┌──────▼──────┐      ┌────────┐
//!                                 │  Registry   │◀─────│ Loader │◀── commands/<group>/<name>.toml
//!                                 └─────────────┘      └────────┘
//! ```
//!
//! - **Registry**: name and alias lookup, group queries, hot reload
//! - **Loader**: fills the registry from a two-level command tree
//! - **Dispatcher**: the gate pipeline, returning a `DispatchOutcome`
//! - **Runtime**: configuration, logging and wiring
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! let handlers = HandlerCatalog::new().with(
//!     "ping",
//!     handler_fn(|message, _service, _args| async move {
//!         tracing::info!(author = %message.author, "pong");
//!         Ok(())
//!     }),
//! );
//!
//! let runtime = HeraldRuntime::builder()
//!     .transport(Arc::new(MyTransport::new(client)))
//!     .catalog(Arc::new(handlers))
//!     .build()?;
//! runtime.load_commands()?;
//!
//! while let Some(message) = client.next_message().await {
//!     runtime.handle(message).await;
//! }
//! ```
//!
//! ## Features
//!
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, LoggingBuilder};

    // Commands
    pub use herald_core::{
        Author, CommandDefinition, CommandDescriptor, CommandHandler, CommandRegistry,
        CommandService, InboundMessage, PermissionRequirement, ReloadStatus, handler_fn,
    };

    // Collaborators
    pub use herald_core::{Localization, ModuleResolver, ProfileStore, TextRequest, Transport};

    // Dispatch and loading
    pub use herald_framework::{
        DispatchOutcome, Dispatcher, FsResolver, HandlerCatalog, LoadPolicy, Loader,
        MemoryResolver, RejectReason, TextCatalog,
    };

    pub use std::sync::Arc;
}
