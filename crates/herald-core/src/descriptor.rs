//! Command definitions and descriptors.
//!
//! A [`CommandDefinition`] is what a command source declares: name, aliases,
//! group, cooldown policy, permission requirement and handler. Registering it
//! produces a [`CommandDescriptor`], the registry's record for the command,
//! which adds the runtime counters (invocation count and per-user cooldown
//! timestamps) and the source location used for reloads.
//!
//! Descriptors are shared as `Arc<CommandDescriptor>`. Their metadata never
//! changes after construction; a reload swaps in a whole new descriptor.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::handler::BoxedCommandHandler;
use crate::permission::PermissionRequirement;

// ─── Cooldown ────────────────────────────────────────────────────────────────

/// How long a user must wait between two invocations of a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    /// Window length in milliseconds. Zero disables the cooldown.
    pub duration_ms: u64,
}

impl CooldownPolicy {
    /// Creates a policy from milliseconds.
    pub fn from_millis(duration_ms: u64) -> Self {
        Self { duration_ms }
    }

    /// Returns the window as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Returns `true` if the policy actually restricts anything.
    pub fn is_active(&self) -> bool {
        self.duration_ms > 0
    }
}

/// Returned by [`Cooldown::try_acquire`] while a user is still cooling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownActive {
    /// When the user last passed the gate.
    pub last_used: u64,
    /// Milliseconds until the gate opens again.
    pub remaining_ms: u64,
}

/// Tracked users before the first sweep of expired timestamps.
const SWEEP_THRESHOLD: usize = 64;

#[derive(Debug)]
struct CooldownState {
    last_used: HashMap<String, u64>,
    sweep_at: usize,
}

/// Cooldown policy plus the per-user timestamps it guards.
///
/// Timestamps whose window has closed are swept once the map doubles in
/// size since the last sweep, so memory follows the number of users
/// currently cooling down.
#[derive(Debug)]
pub struct Cooldown {
    policy: CooldownPolicy,
    state: Mutex<CooldownState>,
}

impl Cooldown {
    fn new(policy: CooldownPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(CooldownState {
                last_used: HashMap::new(),
                sweep_at: SWEEP_THRESHOLD,
            }),
        }
    }

    /// Returns the policy.
    pub fn policy(&self) -> CooldownPolicy {
        self.policy
    }

    /// Checks the window for `user` and, if it is open, records `now`.
    ///
    /// The check and the commit happen under one lock, so of two concurrent
    /// calls for the same user inside a window at most one succeeds. A
    /// rejected call leaves the state untouched.
    pub fn try_acquire(&self, user: &str, now: u64) -> Result<(), CooldownActive> {
        let duration = self.policy.duration_ms;
        let mut state = self.state.lock();
        if let Some(&last) = state.last_used.get(user) {
            let ready_at = last.saturating_add(duration);
            if ready_at > now {
                return Err(CooldownActive {
                    last_used: last,
                    remaining_ms: ready_at - now,
                });
            }
        }
        state.last_used.insert(user.to_owned(), now);

        if state.last_used.len() >= state.sweep_at {
            state
                .last_used
                .retain(|_, last| last.saturating_add(duration) > now);
            state.sweep_at = (state.last_used.len() * 2).max(SWEEP_THRESHOLD);
        }
        Ok(())
    }

    /// Last recorded invocation of `user`.
    pub fn last_used(&self, user: &str) -> Option<u64> {
        self.state.lock().last_used.get(user).copied()
    }

    /// Number of users with a recorded invocation.
    pub fn tracked_users(&self) -> usize {
        self.state.lock().last_used.len()
    }

    /// Copies entries from `previous` that are newer than ours.
    fn inherit(&self, previous: &Cooldown) {
        let snapshot = previous.state.lock().last_used.clone();
        let mut state = self.state.lock();
        let mine = &mut state.last_used;
        for (user, at) in snapshot {
            let slot = mine.entry(user).or_insert(at);
            *slot = (*slot).max(at);
        }
    }
}

// ─── Source location ─────────────────────────────────────────────────────────

/// Where a command definition was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation(PathBuf);

impl SourceLocation {
    /// Wraps a path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for SourceLocation {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for SourceLocation {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

// ─── CommandDefinition ───────────────────────────────────────────────────────

/// A command as declared by its source.
#[derive(Clone)]
pub struct CommandDefinition {
    /// Primary name.
    pub name: String,
    /// Alternative names.
    pub aliases: Vec<String>,
    /// Category tag.
    pub group: String,
    /// One-line description for help listings.
    pub description: Option<String>,
    /// Usage string for help listings.
    pub usage: Option<String>,
    /// Cooldown policy, if any.
    pub cooldown: Option<CooldownPolicy>,
    /// Who may run the command.
    pub permission: PermissionRequirement,
    /// The implementation.
    pub handler: BoxedCommandHandler,
}

impl CommandDefinition {
    /// Creates a definition with no aliases, cooldown or restrictions.
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        handler: BoxedCommandHandler,
    ) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            group: group.into(),
            description: None,
            usage: None,
            cooldown: None,
            permission: PermissionRequirement::none(),
            handler,
        }
    }

    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the cooldown window in milliseconds.
    pub fn cooldown_ms(mut self, duration_ms: u64) -> Self {
        self.cooldown = Some(CooldownPolicy::from_millis(duration_ms));
        self
    }

    /// Sets the permission requirement.
    pub fn permission(mut self, permission: PermissionRequirement) -> Self {
        self.permission = permission;
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the usage string.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Checks the constructor contract.
    pub fn validate(&self) -> RegistryResult<()> {
        validate_key(&self.name, &self.name, "name")?;
        for alias in &self.aliases {
            validate_key(&self.name, alias, "alias")?;
            if *alias == self.name {
                return Err(RegistryError::invalid(
                    &self.name,
                    "alias repeats the command name",
                ));
            }
        }
        for (i, alias) in self.aliases.iter().enumerate() {
            if self.aliases[..i].contains(alias) {
                return Err(RegistryError::invalid(
                    &self.name,
                    format!("alias '{alias}' is listed twice"),
                ));
            }
        }
        if self.group.trim().is_empty() {
            return Err(RegistryError::invalid(&self.name, "group is empty"));
        }
        Ok(())
    }
}

fn validate_key(name: &str, key: &str, what: &str) -> RegistryResult<()> {
    if key.is_empty() {
        return Err(RegistryError::invalid(name, format!("{what} is empty")));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(RegistryError::invalid(
            name,
            format!("{what} '{key}' contains whitespace"),
        ));
    }
    Ok(())
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("group", &self.group)
            .field("cooldown", &self.cooldown)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

// ─── CommandDescriptor ───────────────────────────────────────────────────────

/// The registry's record for one command.
pub struct CommandDescriptor {
    name: String,
    aliases: Vec<String>,
    group: String,
    description: Option<String>,
    usage: Option<String>,
    cooldown: Option<Cooldown>,
    permission: PermissionRequirement,
    handler: BoxedCommandHandler,
    invocations: AtomicU64,
    source: Option<SourceLocation>,
}

impl CommandDescriptor {
    /// Validates `definition` and builds a descriptor from it.
    ///
    /// Cooldown state is created here whenever the policy has a nonzero
    /// duration, so a registered descriptor never lacks it.
    pub fn build(
        definition: CommandDefinition,
        source: Option<SourceLocation>,
    ) -> RegistryResult<Self> {
        definition.validate()?;

        let CommandDefinition {
            name,
            aliases,
            group,
            description,
            usage,
            cooldown,
            permission,
            handler,
        } = definition;

        Ok(Self {
            name,
            aliases,
            group,
            description,
            usage,
            cooldown: cooldown.filter(CooldownPolicy::is_active).map(Cooldown::new),
            permission,
            handler,
            invocations: AtomicU64::new(0),
            source,
        })
    }

    /// Primary name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Category tag.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Help description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Help usage string.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// Cooldown state, present only for an active policy.
    pub fn cooldown(&self) -> Option<&Cooldown> {
        self.cooldown.as_ref()
    }

    /// Permission requirement.
    pub fn permission(&self) -> &PermissionRequirement {
        &self.permission
    }

    /// A shared handle to the handler.
    pub fn handler(&self) -> BoxedCommandHandler {
        BoxedCommandHandler::clone(&self.handler)
    }

    /// Where the definition came from.
    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    /// How many times the command has been looked up.
    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Returns `true` if `query` is the name or one of the aliases.
    pub fn answers_to(&self, query: &str) -> bool {
        self.name == query || self.aliases.iter().any(|a| a == query)
    }

    pub(crate) fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Carries running cooldowns over from the descriptor being replaced.
    pub(crate) fn inherit_cooldowns(&self, previous: &CommandDescriptor) {
        if let (Some(mine), Some(theirs)) = (&self.cooldown, &previous.cooldown) {
            mine.inherit(theirs);
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("group", &self.group)
            .field("cooldown", &self.cooldown.as_ref().map(Cooldown::policy))
            .field("invocations", &self.invocation_count())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    fn noop() -> BoxedCommandHandler {
        handler_fn(|_, _, _| async { Ok(()) })
    }

    #[test]
    fn test_cooldown_state_created_for_nonzero_policy() {
        let d = CommandDescriptor::build(
            CommandDefinition::new("ping", "utility", noop()).cooldown_ms(60_000),
            None,
        )
        .unwrap();
        let cooldown = d.cooldown().expect("cooldown state");
        assert_eq!(cooldown.policy().duration(), Duration::from_secs(60));
        assert_eq!(cooldown.tracked_users(), 0);
    }

    #[test]
    fn test_zero_cooldown_has_no_state() {
        let d = CommandDescriptor::build(
            CommandDefinition::new("ping", "utility", noop()).cooldown_ms(0),
            None,
        )
        .unwrap();
        assert!(d.cooldown().is_none());
    }

    #[test]
    fn test_cooldown_window() {
        let cooldown = Cooldown::new(CooldownPolicy::from_millis(60_000));

        assert!(cooldown.try_acquire("u", 0).is_ok());
        assert_eq!(cooldown.last_used("u"), Some(0));

        let active = cooldown.try_acquire("u", 30_000).unwrap_err();
        assert_eq!(active.remaining_ms, 30_000);
        assert_eq!(cooldown.last_used("u"), Some(0));

        assert!(cooldown.try_acquire("u", 60_001).is_ok());
        assert_eq!(cooldown.last_used("u"), Some(60_001));

        // Other users are independent.
        assert!(cooldown.try_acquire("v", 60_002).is_ok());
    }

    #[test]
    fn test_cooldown_concurrent_acquire() {
        let cooldown = Cooldown::new(CooldownPolicy::from_millis(10_000));
        let passed = AtomicU64::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    if cooldown.try_acquire("u", 5).is_ok() {
                        passed.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_timestamps_are_swept() {
        let cooldown = Cooldown::new(CooldownPolicy::from_millis(1_000));

        for i in 0..SWEEP_THRESHOLD {
            cooldown.try_acquire(&format!("early{i}"), 0).unwrap();
        }
        // Nothing had expired at the first sweep.
        assert_eq!(cooldown.tracked_users(), SWEEP_THRESHOLD);

        for i in 0..SWEEP_THRESHOLD {
            cooldown.try_acquire(&format!("late{i}"), 5_000).unwrap();
        }
        assert_eq!(cooldown.tracked_users(), SWEEP_THRESHOLD);
        assert_eq!(cooldown.last_used("early0"), None);
        assert_eq!(cooldown.last_used("late0"), Some(5_000));

        // Running windows survive a sweep.
        let active = cooldown.try_acquire("late0", 5_500).unwrap_err();
        assert_eq!(active.remaining_ms, 500);
    }

    #[test]
    fn test_inherit_keeps_latest_timestamp() {
        let old = Cooldown::new(CooldownPolicy::from_millis(1_000));
        let new = Cooldown::new(CooldownPolicy::from_millis(1_000));
        old.try_acquire("a", 500).unwrap();
        old.try_acquire("b", 100).unwrap();
        new.try_acquire("b", 300).unwrap();

        new.inherit(&old);
        assert_eq!(new.last_used("a"), Some(500));
        assert_eq!(new.last_used("b"), Some(300));
    }

    #[test]
    fn test_validation() {
        let ok = CommandDefinition::new("ping", "utility", noop()).alias("p");
        assert!(ok.validate().is_ok());

        let empty = CommandDefinition::new("", "utility", noop());
        assert!(matches!(
            empty.validate(),
            Err(RegistryError::InvalidDefinition { .. })
        ));

        let spaced = CommandDefinition::new("ping", "utility", noop()).alias("p p");
        assert!(spaced.validate().is_err());

        let self_alias = CommandDefinition::new("ping", "utility", noop()).alias("ping");
        assert!(self_alias.validate().is_err());

        let twice = CommandDefinition::new("ping", "utility", noop())
            .alias("p")
            .alias("p");
        assert!(twice.validate().is_err());

        let no_group = CommandDefinition::new("ping", " ", noop());
        assert!(no_group.validate().is_err());
    }

    #[test]
    fn test_answers_to() {
        let d = CommandDescriptor::build(
            CommandDefinition::new("help", "core", noop()).alias("h"),
            Some(SourceLocation::new("commands/core/help.toml")),
        )
        .unwrap();
        assert!(d.answers_to("help"));
        assert!(d.answers_to("h"));
        assert!(!d.answers_to("he"));
        assert_eq!(d.source().unwrap().to_string(), "commands/core/help.toml");
    }
}
