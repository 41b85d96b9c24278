//! Herald Runtime - configuration, logging and wiring for the Herald
//! command dispatcher.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `HeraldConfig`)
//! - Logging setup on top of `tracing-subscriber` (`LoggingBuilder`)
//! - The `HeraldRuntime`, which owns the command registry and connects the
//!   loader and the dispatcher to the host's collaborators
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder()
//!     .transport(transport)
//!     .catalog(handlers)
//!     .build()?;
//! runtime.load_commands()?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HeraldRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
