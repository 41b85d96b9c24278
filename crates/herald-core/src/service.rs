//! Collaborator contracts consumed by the dispatcher.
//!
//! The dispatcher never talks to the chat platform, the profile database or
//! the text catalogue directly. Hosts plug those in through the traits below.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::message::InboundMessage;

// ─── Transport ───────────────────────────────────────────────────────────────

/// Outbound side of the chat client.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Returns whether the bot may post in the message's channel.
    async fn can_send(&self, message: &InboundMessage) -> bool;

    /// Posts `content` in reply to `message`.
    async fn send(&self, message: &InboundMessage, content: &str) -> TransportResult<()>;
}

// ─── Profile store ───────────────────────────────────────────────────────────

/// Read-only view of persisted guild and user preferences.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Prefix configured for a guild, if any.
    async fn guild_prefix(&self, guild_id: &str) -> Option<String>;

    /// Preferred language of a user, if any.
    async fn user_language(&self, user_id: &str) -> Option<String>;
}

/// Profile store that knows nothing about anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfiles;

#[async_trait]
impl ProfileStore for NoProfiles {
    async fn guild_prefix(&self, _guild_id: &str) -> Option<String> {
        None
    }

    async fn user_language(&self, _user_id: &str) -> Option<String> {
        None
    }
}

// ─── Localization ────────────────────────────────────────────────────────────

/// A lookup into the localization service.
///
/// `path` addresses a text (e.g. `["system", "cooldown"]`); `parameters` maps
/// placeholders such as `%AUTHOR%` to their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    /// Segments of the text path.
    pub path: Vec<String>,
    /// Target language tag.
    pub language: String,
    /// Placeholder substitutions.
    pub parameters: BTreeMap<String, String>,
}

impl TextRequest {
    /// Creates a request without parameters.
    pub fn new<I, S>(path: I, language: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            language: language.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Adds a placeholder substitution.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the path joined with dots.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Opaque per-command service handed to a handler.
///
/// The localization service decides what lives inside; handlers that know
/// the concrete type can downcast it.
#[derive(Clone)]
pub struct CommandService(Arc<dyn Any + Send + Sync>);

impl CommandService {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// A service carrying nothing.
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Borrows the inner value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for CommandService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandService").finish_non_exhaustive()
    }
}

/// Source of user-facing strings.
#[async_trait]
pub trait Localization: Send + Sync + 'static {
    /// Renders the text addressed by `request`.
    async fn get(&self, request: &TextRequest) -> String;

    /// Returns the localized service object for one command.
    async fn command(&self, name: &str, language: &str) -> CommandService;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_builder() {
        let request = TextRequest::new(["system", "cooldown"], "en-us")
            .param("%AUTHOR%", "mai#0001")
            .param("%TIME%", "5 second(s)");
        assert_eq!(request.dotted_path(), "system.cooldown");
        assert_eq!(request.parameters.len(), 2);
    }

    #[test]
    fn test_command_service_downcast() {
        let service = CommandService::new(String::from("texts"));
        assert_eq!(service.downcast_ref::<String>().map(String::as_str), Some("texts"));
        assert!(service.downcast_ref::<u32>().is_none());
        assert!(CommandService::empty().downcast_ref::<()>().is_some());
    }

    #[tokio::test]
    async fn test_no_profiles() {
        assert!(NoProfiles.guild_prefix("g").await.is_none());
        assert!(NoProfiles.user_language("u").await.is_none());
    }
}
