//! Message dispatch pipeline.
//!
//! The [`Dispatcher`] turns one inbound message into at most one command
//! invocation. Every message walks the same ordered gates and leaves at the
//! first one that rejects it:
//!
//! ```text
//! START ─▶ transport ─▶ prefix ─▶ split ─▶ lookup ─▶ permission ─▶ cooldown ─▶ invoke ─▶ EXECUTED
//!             │           │         │        │           │            │
//!             ▼           ▼         ▼        ▼           ▼            ▼
//!      PERMISSION_SEND  PREFIX  NOT_FOUND NOT_FOUND   NOT_FOUND    COOLDOWN
//! ```
//!
//! 1. Guild messages are dropped if the bot may not post in the channel.
//! 2. The prefix is resolved: fixed literal, then global default, then the
//!    guild's configured prefix, which applies even when the text does not
//!    start with it.
//! 3. The prefix's length is cut from the text and the rest is split on
//!    whitespace into name and args.
//! 4. The name is looked up in the [`CommandRegistry`].
//! 5. The command's permission requirement is evaluated. A denial sends its
//!    text and is reported as `NOT_FOUND`, so restricted commands look absent.
//! 6. The cooldown window is checked and, when open, the current time is
//!    committed under the same lock before the handler starts.
//! 7. The handler is spawned with the localized command service; the
//!    dispatch reports `EXECUTED` without waiting for it. Outside a tokio
//!    runtime the handler is awaited in place instead.
//!
//! Rejections are values, not errors. Texts sent on the way out (denials,
//! cooldown notices) are best effort: send failures are logged and dropped.

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, Level, debug, error, span, trace, warn};

use crate::humanize::format_remaining;
use crate::split::{Prefixes, split_invocation};
use herald_core::{
    Clock, CommandRegistry, Denial, InboundMessage, Localization, NoProfiles, PermissionContext,
    PermissionVerdict, ProfileStore, SystemClock, TextRequest, Transport,
};

// =============================================================================
// Outcome
// =============================================================================

/// Why a dispatch stopped before invoking anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The bot may not post in the channel.
    PermissionSend,
    /// The message is not addressed to the bot.
    Prefix,
    /// No such command, or the caller may not see it.
    NotFound,
    /// The caller is still cooling down.
    Cooldown,
}

impl RejectReason {
    /// Stable upper-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionSend => "PERMISSION_SEND",
            Self::Prefix => "PREFIX",
            Self::NotFound => "NOT_FOUND",
            Self::Cooldown => "COOLDOWN",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`Dispatcher::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler was started.
    Executed,
    /// A gate rejected the message.
    Rejected(RejectReason),
}

impl DispatchOutcome {
    /// Returns `true` if a handler was started.
    pub fn executed(&self) -> bool {
        matches!(self, Self::Executed)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Executed => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

// =============================================================================
// DispatcherConfig
// =============================================================================

/// Static dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Literal prefix that always addresses the bot.
    pub fixed_prefix: String,
    /// The client's default prefix.
    pub global_prefix: Option<String>,
    /// Language used when a user has no preference.
    pub default_language: String,
    /// Users with owner rights.
    pub owners: Vec<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            fixed_prefix: "mai".into(),
            global_prefix: Some("!".into()),
            default_language: "en-us".into(),
            owners: Vec::new(),
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Runs the gate pipeline for inbound messages.
///
/// `Dispatcher` is `Send + Sync`; share it behind an `Arc` and call
/// [`handle`](Self::handle) concurrently for as many messages as arrive.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    transport: Arc<dyn Transport>,
    localization: Arc<dyn Localization>,
    profiles: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with default settings, no profiles and the
    /// system clock.
    pub fn new(
        registry: Arc<CommandRegistry>,
        transport: Arc<dyn Transport>,
        localization: Arc<dyn Localization>,
    ) -> Self {
        Self {
            registry,
            transport,
            localization,
            profiles: Arc::new(NoProfiles),
            clock: Arc::new(SystemClock),
            config: DispatcherConfig::default(),
        }
    }

    /// Uses `profiles` for guild prefixes and user languages.
    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Uses `clock` for cooldown timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the settings.
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the registry this dispatcher reads.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Returns the settings.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatches one message.
    ///
    /// Inside a tokio runtime the handler is spawned and this returns without
    /// waiting for it. Polled on any other executor, the handler runs inline
    /// before [`DispatchOutcome::Executed`] is returned.
    pub async fn handle(&self, message: Arc<InboundMessage>) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            author = %message.author.id,
            channel = %message.channel_id
        );

        let outcome = self.run(message).instrument(span.clone()).await;
        if let DispatchOutcome::Rejected(reason) = outcome {
            span.in_scope(|| debug!(reason = %reason, "Message rejected"));
        }
        outcome
    }

    async fn run(&self, message: Arc<InboundMessage>) -> DispatchOutcome {
        // 1. Transport gate.
        if message.is_guild() && !self.transport.can_send(&message).await {
            return DispatchOutcome::Rejected(RejectReason::PermissionSend);
        }

        // 2. Prefix.
        let guild_prefix = match &message.guild_id {
            Some(guild) => self.profiles.guild_prefix(guild).await,
            None => None,
        };
        let prefixes = Prefixes {
            fixed: &self.config.fixed_prefix,
            global: self.config.global_prefix.as_deref(),
            guild: guild_prefix.as_deref(),
        };
        let Some(prefix) = prefixes.resolve(&message.content) else {
            return DispatchOutcome::Rejected(RejectReason::Prefix);
        };

        // 3. Split.
        let Some(invocation) = split_invocation(&message.content, prefix) else {
            return DispatchOutcome::Rejected(RejectReason::NotFound);
        };
        trace!(prefix = %prefix, name = %invocation.name, args = ?invocation.args, "Invocation parsed");

        // 4. Lookup.
        let Some(command) = self.registry.get(invocation.name) else {
            return DispatchOutcome::Rejected(RejectReason::NotFound);
        };
        let args = invocation.owned_args();

        let language = self
            .profiles
            .user_language(&message.author.id)
            .await
            .unwrap_or_else(|| self.config.default_language.clone());

        // 5. Permission gate.
        let ctx = PermissionContext {
            message: &message,
            owners: &self.config.owners,
        };
        if let PermissionVerdict::Denied(denial) = command.permission().evaluate(&ctx).await {
            debug!(command = %command.name(), denial = ?denial, "Permission denied");
            if let Some(text) = self.denial_text(&denial, &language).await {
                self.send_best_effort(&message, &text).await;
            }
            return DispatchOutcome::Rejected(RejectReason::NotFound);
        }

        // 6 + 7. Cooldown gate and commit.
        if let Some(cooldown) = command.cooldown() {
            let now = self.clock.now_millis();
            if let Err(active) = cooldown.try_acquire(&message.author.id, now) {
                let request = TextRequest::new(["system", "cooldown"], language.as_str())
                    .param("%AUTHOR%", message.author.tag.as_str())
                    .param("%TIME%", format_remaining(active.remaining_ms));
                let text = self.localization.get(&request).await;
                self.send_best_effort(&message, &text).await;
                return DispatchOutcome::Rejected(RejectReason::Cooldown);
            }
        }

        // 8. Invoke.
        let service = self.localization.command(command.name(), &language).await;
        let handler = command.handler();
        let name = command.name().to_owned();
        debug!(command = %name, args = args.len(), "Invoking command");
        let task = async move {
            if let Err(e) = handler.run(message, service, args).await {
                error!(command = %name, error = %e, "Command handler failed");
            }
        }
        .in_current_span();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(task);
            }
            Err(_) => task.await,
        }

        DispatchOutcome::Executed
    }

    async fn denial_text(&self, denial: &Denial, language: &str) -> Option<String> {
        if let Denial::Custom(text) = denial {
            return text.clone();
        }
        let key = denial.text_key()?;
        let mut request = TextRequest::new(["system", "permission", key], language);
        if let Denial::MissingPermissions(missing) = denial {
            request = request.param("%PERMISSIONS%", missing.join(", "));
        }
        Some(self.localization.get(&request).await)
    }

    async fn send_best_effort(&self, message: &InboundMessage, text: &str) {
        if let Err(e) = self.transport.send(message, text).await {
            warn!(channel = %message.channel_id, error = %e, "Failed to send notice");
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.registry.size())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
