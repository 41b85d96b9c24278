//! Permission requirements attached to commands.
//!
//! A [`PermissionRequirement`] combines the built-in checks every command can
//! opt into (guild only, owner only, required platform permissions) with an
//! optional custom [`PermissionCheck`]. Checks run in that order and the first
//! denial wins.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::message::InboundMessage;

/// Everything a permission check may look at.
#[derive(Debug, Clone, Copy)]
pub struct PermissionContext<'a> {
    /// The invoking message.
    pub message: &'a InboundMessage,
    /// User ids with owner rights over the bot.
    pub owners: &'a [String],
}

impl PermissionContext<'_> {
    /// Returns `true` if the author is a bot owner.
    pub fn is_owner(&self) -> bool {
        self.owners.iter().any(|o| *o == self.message.author.id)
    }
}

/// Why a permission check refused the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// The command only works inside guilds.
    GuildOnly,
    /// The command is reserved for bot owners.
    OwnerOnly,
    /// The author lacks these platform permissions.
    MissingPermissions(Vec<String>),
    /// A custom check refused, optionally with its own text.
    Custom(Option<String>),
}

impl Denial {
    /// Localization key under `system.permission`, or `None` for custom denials.
    pub fn text_key(&self) -> Option<&'static str> {
        match self {
            Self::GuildOnly => Some("guild_only"),
            Self::OwnerOnly => Some("owner_only"),
            Self::MissingPermissions(_) => Some("missing"),
            Self::Custom(_) => None,
        }
    }
}

/// Outcome of evaluating a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionVerdict {
    /// The invocation may proceed.
    Granted,
    /// The invocation is refused.
    Denied(Denial),
}

impl PermissionVerdict {
    /// Returns `true` for [`PermissionVerdict::Granted`].
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// A host-defined permission predicate.
#[async_trait]
pub trait PermissionCheck: Send + Sync + 'static {
    /// Evaluates the predicate.
    async fn check(&self, ctx: &PermissionContext<'_>) -> PermissionVerdict;
}

/// The permission requirement of one command.
#[derive(Clone, Default)]
pub struct PermissionRequirement {
    /// Reject invocations outside guilds.
    pub guild_only: bool,
    /// Reject invocations by non-owners.
    pub owner_only: bool,
    /// Platform permissions the author must hold.
    pub user_permissions: Vec<String>,
    /// Extra predicate evaluated after the built-in checks.
    pub custom: Option<Arc<dyn PermissionCheck>>,
}

impl PermissionRequirement {
    /// A requirement that accepts everyone.
    pub fn none() -> Self {
        Self::default()
    }

    /// Restricts the command to guilds.
    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    /// Restricts the command to bot owners.
    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    /// Requires a platform permission.
    pub fn require(mut self, permission: impl Into<String>) -> Self {
        self.user_permissions.push(permission.into());
        self
    }

    /// Attaches a custom predicate.
    pub fn with_check(mut self, check: impl PermissionCheck) -> Self {
        self.custom = Some(Arc::new(check));
        self
    }

    /// Evaluates the requirement against an invocation.
    pub async fn evaluate(&self, ctx: &PermissionContext<'_>) -> PermissionVerdict {
        if self.guild_only && !ctx.message.is_guild() {
            return PermissionVerdict::Denied(Denial::GuildOnly);
        }

        if self.owner_only && !ctx.is_owner() {
            return PermissionVerdict::Denied(Denial::OwnerOnly);
        }

        let missing: Vec<String> = self
            .user_permissions
            .iter()
            .filter(|p| !ctx.message.author_has(p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return PermissionVerdict::Denied(Denial::MissingPermissions(missing));
        }

        match &self.custom {
            Some(check) => check.check(ctx).await,
            None => PermissionVerdict::Granted,
        }
    }
}

impl fmt::Debug for PermissionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionRequirement")
            .field("guild_only", &self.guild_only)
            .field("owner_only", &self.owner_only)
            .field("user_permissions", &self.user_permissions)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Author;

    struct DenyAll;

    #[async_trait]
    impl PermissionCheck for DenyAll {
        async fn check(&self, _ctx: &PermissionContext<'_>) -> PermissionVerdict {
            PermissionVerdict::Denied(Denial::Custom(Some("nope".into())))
        }
    }

    fn ctx<'a>(message: &'a InboundMessage, owners: &'a [String]) -> PermissionContext<'a> {
        PermissionContext { message, owners }
    }

    #[tokio::test]
    async fn test_open_requirement_grants() {
        let msg = InboundMessage::new(Author::new("1"), "!ping");
        let verdict = PermissionRequirement::none().evaluate(&ctx(&msg, &[])).await;
        assert!(verdict.is_granted());
    }

    #[tokio::test]
    async fn test_guild_only_denies_direct_messages() {
        let msg = InboundMessage::new(Author::new("1"), "!ping");
        let verdict = PermissionRequirement::none()
            .guild_only()
            .evaluate(&ctx(&msg, &[]))
            .await;
        assert_eq!(verdict, PermissionVerdict::Denied(Denial::GuildOnly));
    }

    #[tokio::test]
    async fn test_owner_only() {
        let owners = vec!["7".to_string()];
        let requirement = PermissionRequirement::none().owner_only();

        let stranger = InboundMessage::new(Author::new("1"), "!eval");
        assert_eq!(
            requirement.evaluate(&ctx(&stranger, &owners)).await,
            PermissionVerdict::Denied(Denial::OwnerOnly)
        );

        let owner = InboundMessage::new(Author::new("7"), "!eval");
        assert!(requirement.evaluate(&ctx(&owner, &owners)).await.is_granted());
    }

    #[tokio::test]
    async fn test_missing_permissions_are_listed() {
        let msg = InboundMessage::new(Author::new("1"), "!ban")
            .in_guild("g", "c")
            .with_permissions(["KICK_MEMBERS"]);
        let verdict = PermissionRequirement::none()
            .require("KICK_MEMBERS")
            .require("BAN_MEMBERS")
            .evaluate(&ctx(&msg, &[]))
            .await;
        assert_eq!(
            verdict,
            PermissionVerdict::Denied(Denial::MissingPermissions(vec!["BAN_MEMBERS".into()]))
        );
    }

    #[tokio::test]
    async fn test_custom_check_runs_last() {
        let msg = InboundMessage::new(Author::new("1"), "!ping");
        let requirement = PermissionRequirement::none().guild_only().with_check(DenyAll);
        assert_eq!(
            requirement.evaluate(&ctx(&msg, &[])).await,
            PermissionVerdict::Denied(Denial::GuildOnly)
        );

        let requirement = PermissionRequirement::none().with_check(DenyAll);
        assert_eq!(
            requirement.evaluate(&ctx(&msg, &[])).await,
            PermissionVerdict::Denied(Denial::Custom(Some("nope".into())))
        );
    }
}
