//! Inbound chat messages as seen by the dispatcher.

use std::fmt;

/// The user who sent a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Platform user id.
    pub id: String,
    /// Display tag used in user-facing texts (e.g. `name#0001`).
    pub tag: String,
}

impl Author {
    /// Creates an author whose tag defaults to the id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            tag: id.clone(),
            id,
        }
    }

    /// Sets the display tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

/// A text message delivered by the transport.
///
/// `guild_id` is `Some` for messages posted in a group context. The
/// `author_permissions` list carries the platform permissions the author
/// holds in the channel; the dispatcher treats the names as opaque strings.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Raw message text.
    pub content: String,
    /// Sender.
    pub author: Author,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild the channel belongs to, if any.
    pub guild_id: Option<String>,
    /// Permissions the author holds in the channel.
    pub author_permissions: Vec<String>,
}

impl InboundMessage {
    /// Creates a direct message from `author` with the given content.
    pub fn new(author: Author, content: impl Into<String>) -> Self {
        let channel_id = format!("dm:{}", author.id);
        Self {
            content: content.into(),
            author,
            channel_id,
            guild_id: None,
            author_permissions: Vec::new(),
        }
    }

    /// Places the message in a guild channel.
    pub fn in_guild(mut self, guild_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self.channel_id = channel_id.into();
        self
    }

    /// Sets the author's channel permissions.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.author_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if the message was posted in a guild.
    pub fn is_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Returns `true` if the author holds `permission`.
    pub fn author_has(&self, permission: &str) -> bool {
        self.author_permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_message_defaults() {
        let msg = InboundMessage::new(Author::new("42"), "!ping");
        assert!(!msg.is_guild());
        assert_eq!(msg.channel_id, "dm:42");
        assert_eq!(msg.author.tag, "42");
    }

    #[test]
    fn test_guild_message_permissions() {
        let msg = InboundMessage::new(Author::new("42").with_tag("mai#0001"), "!ban")
            .in_guild("g1", "c1")
            .with_permissions(["BAN_MEMBERS"]);
        assert!(msg.is_guild());
        assert!(msg.author_has("BAN_MEMBERS"));
        assert!(!msg.author_has("MANAGE_GUILD"));
        assert_eq!(msg.author.to_string(), "mai#0001");
    }
}
