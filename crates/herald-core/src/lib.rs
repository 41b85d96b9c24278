//! # Herald Core
//!
//! The data model of the Herald command dispatcher.
//!
//! This crate provides:
//! - **Descriptors**: command metadata plus runtime counters ([`CommandDescriptor`])
//! - **Registry**: name and alias lookup, group queries, hot reload ([`CommandRegistry`])
//! - **Permissions**: built-in and custom permission checks ([`PermissionRequirement`])
//! - **Collaborators**: transport, profile store, localization and module
//!   resolver contracts ([`Transport`], [`ProfileStore`], [`Localization`],
//!   [`ModuleResolver`])
//!
//! The dispatch pipeline and the loader live in `herald-framework`.

pub mod clock;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod message;
pub mod permission;
pub mod registry;
pub mod resolver;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use descriptor::{
    CommandDefinition, CommandDescriptor, Cooldown, CooldownActive, CooldownPolicy, SourceLocation,
};
pub use error::{
    BoxError, HandlerError, HandlerResult, RegistryError, RegistryResult, ReloadError,
    ReloadResult, ResolveError, ResolveResult, TransportError, TransportResult,
};
pub use handler::{BoxedCommandHandler, CommandHandler, HandlerFn, handler_fn};
pub use message::{Author, InboundMessage};
pub use permission::{
    Denial, PermissionCheck, PermissionContext, PermissionRequirement, PermissionVerdict,
};
pub use registry::{CommandRegistry, Registration, ReloadStatus};
pub use resolver::ModuleResolver;
pub use service::{CommandService, Localization, NoProfiles, ProfileStore, TextRequest, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use super::descriptor::{CommandDefinition, CommandDescriptor};
    pub use super::handler::{CommandHandler, handler_fn};
    pub use super::message::{Author, InboundMessage};
    pub use super::permission::PermissionRequirement;
    pub use super::registry::{CommandRegistry, ReloadStatus};
}
