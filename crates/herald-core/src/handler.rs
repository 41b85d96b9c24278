//! Command handler trait.
//!
//! A handler is the implementation behind a command. It receives the message
//! that triggered it, the localized [`CommandService`] for the caller's
//! language and the argument tokens. Closures can be used directly through
//! [`handler_fn`]:
//!
//! ```rust,ignore
//! use herald_core::handler::handler_fn;
//!
//! let ping = handler_fn(|message, _service, _args| async move {
//!     tracing::info!(author = %message.author, "pong");
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerResult;
use crate::message::InboundMessage;
use crate::service::CommandService;

/// The implementation of a command.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Runs the command.
    async fn run(
        &self,
        message: Arc<InboundMessage>,
        service: CommandService,
        args: Vec<String>,
    ) -> HandlerResult;
}

/// A shared, type-erased handler.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// Adapter turning an async closure into a [`CommandHandler`].
pub struct HandlerFn<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for HandlerFn<F>
where
    F: Fn(Arc<InboundMessage>, CommandService, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn run(
        &self,
        message: Arc<InboundMessage>,
        service: CommandService,
        args: Vec<String>,
    ) -> HandlerResult {
        (self.0)(message, service, args).await
    }
}

/// Boxes an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> BoxedCommandHandler
where
    F: Fn(Arc<InboundMessage>, CommandService, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(HandlerFn(f))
}
