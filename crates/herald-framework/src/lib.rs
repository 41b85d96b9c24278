//! # Herald Framework
//!
//! Turns chat messages into command invocations.
//!
//! - [`Dispatcher`]: the ordered gate pipeline (transport, prefix, lookup,
//!   permission, cooldown) ending in a spawned handler
//! - [`Loader`]: populates a [`CommandRegistry`](herald_core::CommandRegistry)
//!   from a two-level command tree
//! - [`FsResolver`] and [`MemoryResolver`]: command sources backed by TOML
//!   manifests or in-process closures
//! - [`TextCatalog`]: a small in-memory localization service
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_framework::prelude::*;
//!
//! let registry = Arc::new(CommandRegistry::new());
//! Loader::new(resolver).load("commands", &registry)?;
//!
//! let dispatcher = Dispatcher::new(registry, transport, Arc::new(TextCatalog::with_system_defaults("en-us")));
//! match dispatcher.handle(Arc::new(message)).await {
//!     DispatchOutcome::Executed => {}
//!     DispatchOutcome::Rejected(reason) => tracing::debug!(%reason, "ignored"),
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod humanize;
pub mod loader;
pub mod localization;
pub mod memory;
pub mod resolver;
pub mod split;

pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig, RejectReason};
pub use error::{EntryError, LoadError, LoadResult};
pub use humanize::format_remaining;
pub use loader::{EntryFailure, LoadPolicy, LoadReport, Loader};
pub use localization::{CommandTexts, TextCatalog};
pub use memory::MemoryResolver;
pub use resolver::{CommandManifest, FsResolver, HandlerCatalog, PermissionManifest};
pub use split::{Invocation, Prefixes, split_invocation};

/// Prelude for common imports.
pub mod prelude {
    pub use super::dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig, RejectReason};
    pub use super::loader::{LoadPolicy, Loader};
    pub use super::localization::TextCatalog;
    pub use super::memory::MemoryResolver;
    pub use super::resolver::{FsResolver, HandlerCatalog};
    pub use herald_core::prelude::*;
    pub use std::sync::Arc;
}
