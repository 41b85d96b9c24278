//! Command registry.
//!
//! [`CommandRegistry`] owns every live [`CommandDescriptor`], keyed by name in
//! registration order, with a secondary alias index. It is the single source
//! of truth the dispatcher reads on every message.
//!
//! # Locking
//!
//! All state sits behind one reader-writer lock. Lookups take the read lock
//! only long enough to clone an `Arc`; the invocation counter is atomic.
//! [`add`](CommandRegistry::add), [`remove`](CommandRegistry::remove) and the
//! swap performed by [`reload`](CommandRegistry::reload) take the write lock.
//! A reload builds the replacement descriptor before locking, so dispatches
//! already holding the old `Arc` finish against it undisturbed.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = CommandRegistry::new();
//! registry
//!     .add(CommandDefinition::new("ping", "utility", ping).alias("p"))?
//!     .add(CommandDefinition::new("help", "core", help))?;
//!
//! let ping = registry.get("p").expect("alias resolves");
//! assert_eq!(ping.name(), "ping");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::descriptor::{CommandDefinition, CommandDescriptor, SourceLocation};
use crate::error::{RegistryError, RegistryResult, ReloadError, ReloadResult};
use crate::resolver::ModuleResolver;

// =============================================================================
// Registration
// =============================================================================

/// Anything [`CommandRegistry::add`] accepts.
pub enum Registration {
    /// An already built descriptor.
    Descriptor(Arc<CommandDescriptor>),
    /// A definition to wrap, with its source location if it has one.
    Definition {
        /// The definition.
        definition: CommandDefinition,
        /// Where it was loaded from.
        source: Option<SourceLocation>,
    },
}

impl Registration {
    fn into_descriptor(self) -> RegistryResult<Arc<CommandDescriptor>> {
        match self {
            Self::Descriptor(descriptor) => Ok(descriptor),
            Self::Definition { definition, source } => {
                CommandDescriptor::build(definition, source).map(Arc::new)
            }
        }
    }
}

impl From<CommandDescriptor> for Registration {
    fn from(descriptor: CommandDescriptor) -> Self {
        Self::Descriptor(Arc::new(descriptor))
    }
}

impl From<Arc<CommandDescriptor>> for Registration {
    fn from(descriptor: Arc<CommandDescriptor>) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl From<CommandDefinition> for Registration {
    fn from(definition: CommandDefinition) -> Self {
        Self::Definition {
            definition,
            source: None,
        }
    }
}

impl From<(CommandDefinition, SourceLocation)> for Registration {
    fn from((definition, source): (CommandDefinition, SourceLocation)) -> Self {
        Self::Definition {
            definition,
            source: Some(source),
        }
    }
}

// =============================================================================
// ReloadStatus
// =============================================================================

/// Result of [`CommandRegistry::reload`].
#[derive(Debug)]
pub enum ReloadStatus {
    /// The fresh descriptor is live.
    Ok {
        /// The descriptor now registered under the command's name.
        descriptor: Arc<CommandDescriptor>,
    },
    /// Nothing changed.
    Failed {
        /// Why.
        error: ReloadError,
    },
}

impl ReloadStatus {
    /// Returns `true` for [`ReloadStatus::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Converts into a plain `Result`.
    pub fn into_result(self) -> ReloadResult<Arc<CommandDescriptor>> {
        match self {
            Self::Ok { descriptor } => Ok(descriptor),
            Self::Failed { error } => Err(error),
        }
    }
}

// =============================================================================
// RegistryInner (internal)
// =============================================================================

#[derive(Default)]
struct RegistryInner {
    commands: IndexMap<String, Arc<CommandDescriptor>>,
    /// alias → owning command name.
    aliases: HashMap<String, String>,
}

impl RegistryInner {
    fn lookup(&self, query: &str) -> Option<&Arc<CommandDescriptor>> {
        self.commands.get(query).or_else(|| {
            self.aliases
                .get(query)
                .and_then(|name| self.commands.get(name))
        })
    }

    /// Verifies that the descriptor's keys are free, ignoring keys owned by
    /// `replacing`.
    fn check_keys(&self, d: &CommandDescriptor, replacing: Option<&str>) -> RegistryResult<()> {
        let foreign = |owner: &str| replacing != Some(owner);

        if let Some(owner) = self.aliases.get(d.name())
            && foreign(owner.as_str())
        {
            return Err(RegistryError::AliasCollision {
                key: d.name().to_owned(),
                owner: owner.clone(),
            });
        }

        for alias in d.aliases() {
            if self.commands.contains_key(alias) && foreign(alias.as_str()) {
                return Err(RegistryError::AliasCollision {
                    key: alias.clone(),
                    owner: alias.clone(),
                });
            }
            if let Some(owner) = self.aliases.get(alias)
                && foreign(owner.as_str())
            {
                return Err(RegistryError::AliasCollision {
                    key: alias.clone(),
                    owner: owner.clone(),
                });
            }
        }

        Ok(())
    }

    fn index_aliases(&mut self, d: &CommandDescriptor) {
        for alias in d.aliases() {
            self.aliases.insert(alias.clone(), d.name().to_owned());
        }
    }

    fn unindex_aliases(&mut self, d: &CommandDescriptor) {
        for alias in d.aliases() {
            self.aliases.remove(alias);
        }
    }
}

// =============================================================================
// CommandRegistry
// =============================================================================

/// The set of registered commands.
#[derive(Default)]
pub struct CommandRegistry {
    inner: RwLock<RegistryInner>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command.
    ///
    /// Definitions are validated and wrapped into descriptors. A name that is
    /// already registered, or any name or alias already claimed by another
    /// command, is rejected and leaves the registry unchanged. Use
    /// [`reload`](Self::reload) to replace a live command.
    pub fn add(&self, command: impl Into<Registration>) -> RegistryResult<&Self> {
        let descriptor = command.into().into_descriptor()?;

        let mut inner = self.inner.write();
        if inner.commands.contains_key(descriptor.name()) {
            return Err(RegistryError::DuplicateName(descriptor.name().to_owned()));
        }
        inner.check_keys(&descriptor, None)?;
        inner.index_aliases(&descriptor);

        debug!(
            command = %descriptor.name(),
            group = %descriptor.group(),
            aliases = ?descriptor.aliases(),
            "Command registered"
        );
        inner
            .commands
            .insert(descriptor.name().to_owned(), descriptor);
        Ok(self)
    }

    /// Looks a command up by name, then by alias.
    ///
    /// Every hit counts as an invocation for telemetry, whether or not the
    /// dispatch that asked goes on to run the command.
    pub fn get(&self, query: &str) -> Option<Arc<CommandDescriptor>> {
        let descriptor = self.peek(query)?;
        descriptor.record_invocation();
        Some(descriptor)
    }

    /// Looks a command up without touching its invocation count.
    pub fn peek(&self, query: &str) -> Option<Arc<CommandDescriptor>> {
        self.inner.read().lookup(query).cloned()
    }

    /// Returns the commands whose group is in `groups`, in registration order.
    ///
    /// An empty slice selects every known group.
    pub fn get_commands_by_group(&self, groups: &[&str]) -> Vec<Arc<CommandDescriptor>> {
        let inner = self.inner.read();
        inner
            .commands
            .values()
            .filter(|d| groups.is_empty() || groups.iter().any(|g| *g == d.group()))
            .cloned()
            .collect()
    }

    /// Re-reads a command from its source and swaps it in.
    ///
    /// The resolver's cached copy is evicted first so the source is read
    /// fresh. Running cooldowns carry over to the new descriptor; the
    /// invocation count starts again from zero. Never panics and never changes
    /// [`size`](Self::size) on failure.
    pub fn reload(&self, query: &str, resolver: &dyn ModuleResolver) -> ReloadStatus {
        match self.try_reload(query, resolver) {
            Ok(descriptor) => {
                info!(command = %descriptor.name(), "Command reloaded");
                ReloadStatus::Ok { descriptor }
            }
            Err(error) => {
                warn!(query = %query, error = %error, "Command reload failed");
                ReloadStatus::Failed { error }
            }
        }
    }

    fn try_reload(
        &self,
        query: &str,
        resolver: &dyn ModuleResolver,
    ) -> ReloadResult<Arc<CommandDescriptor>> {
        let current = self
            .peek(query)
            .ok_or_else(|| ReloadError::NotFound(query.to_owned()))?;
        let source = current
            .source()
            .cloned()
            .ok_or_else(|| ReloadError::NoSource(current.name().to_owned()))?;

        resolver.invalidate(source.as_path());
        let definition = resolver.resolve(source.as_path())?;
        if definition.name != current.name() {
            return Err(ReloadError::Renamed {
                from: current.name().to_owned(),
                to: definition.name,
            });
        }

        let fresh = Arc::new(CommandDescriptor::build(definition, Some(source))?);
        self.replace(Arc::clone(&fresh))?;
        Ok(fresh)
    }

    /// Atomically swaps the descriptor registered under `descriptor.name()`.
    fn replace(&self, descriptor: Arc<CommandDescriptor>) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        let previous = inner
            .commands
            .get(descriptor.name())
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(descriptor.name().to_owned()))?;
        inner.check_keys(&descriptor, Some(descriptor.name()))?;

        descriptor.inherit_cooldowns(&previous);
        inner.unindex_aliases(&previous);
        inner.index_aliases(&descriptor);
        inner
            .commands
            .insert(descriptor.name().to_owned(), descriptor);
        Ok(())
    }

    /// Unregisters a command by name or alias.
    pub fn remove(&self, query: &str) -> Option<Arc<CommandDescriptor>> {
        let mut inner = self.inner.write();
        let name = inner.lookup(query)?.name().to_owned();
        let removed = inner.commands.shift_remove(&name)?;
        inner.unindex_aliases(&removed);
        info!(command = %name, "Command removed");
        Some(removed)
    }

    /// Distinct groups, in order of first registration.
    pub fn groups(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut groups: Vec<String> = Vec::new();
        for d in inner.commands.values() {
            if !groups.iter().any(|g| g == d.group()) {
                groups.push(d.group().to_owned());
            }
        }
        groups
    }

    /// Registered command names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().commands.keys().cloned().collect()
    }

    /// Number of registered commands.
    pub fn size(&self) -> usize {
        self.inner.read().commands.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResolveError, ResolveResult};
    use crate::handler::{BoxedCommandHandler, handler_fn};
    use std::path::{Path, PathBuf};

    fn noop() -> BoxedCommandHandler {
        handler_fn(|_, _, _| async { Ok(()) })
    }

    fn def(name: &str, group: &str) -> CommandDefinition {
        CommandDefinition::new(name, group, noop())
    }

    /// Resolver serving definitions from a map, with a cache that mimics a
    /// module cache: `resolve` returns the cached copy until invalidated.
    #[derive(Default)]
    struct MapResolver {
        sources: RwLock<HashMap<PathBuf, CommandDefinition>>,
        cache: RwLock<HashMap<PathBuf, CommandDefinition>>,
    }

    impl MapResolver {
        fn put(&self, path: &str, definition: CommandDefinition) {
            self.sources.write().insert(PathBuf::from(path), definition);
        }
    }

    impl ModuleResolver for MapResolver {
        fn list_entries(&self, _path: &Path) -> ResolveResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn resolve(&self, path: &Path) -> ResolveResult<CommandDefinition> {
            if let Some(cached) = self.cache.read().get(path) {
                return Ok(cached.clone());
            }
            let definition = self
                .sources
                .read()
                .get(path)
                .cloned()
                .ok_or_else(|| ResolveError::NotFound(path.to_path_buf()))?;
            self.cache
                .write()
                .insert(path.to_path_buf(), definition.clone());
            Ok(definition)
        }

        fn invalidate(&self, path: &Path) {
            self.cache.write().remove(path);
        }
    }

    #[test]
    fn test_get_by_name_and_alias_is_same_instance() {
        let registry = CommandRegistry::new();
        registry
            .add(def("ping", "utility").alias("p").alias("pong"))
            .unwrap();

        let by_name = registry.get("ping").unwrap();
        assert_eq!(by_name.invocation_count(), 1);
        let by_alias = registry.get("p").unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_alias));
        assert_eq!(by_name.invocation_count(), 2);
        registry.get("pong").unwrap();
        assert_eq!(by_name.invocation_count(), 3);

        assert!(registry.get("missing").is_none());
        assert!(registry.peek("ping").is_some());
        assert_eq!(by_name.invocation_count(), 3);
    }

    #[test]
    fn test_name_beats_alias() {
        let registry = CommandRegistry::new();
        registry.add(def("help", "core")).unwrap();
        // "help" cannot become an alias of another command.
        let err = registry
            .add(def("manual", "core").alias("help"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            RegistryError::AliasCollision {
                key: "help".into(),
                owner: "help".into()
            }
        );
        assert_eq!(registry.get("help").unwrap().name(), "help");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = CommandRegistry::new();
        registry.add(def("ping", "utility")).unwrap();
        let err = registry.add(def("ping", "other")).err().unwrap();
        assert_eq!(err, RegistryError::DuplicateName("ping".into()));
        assert_eq!(registry.peek("ping").unwrap().group(), "utility");
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_alias_collisions_rejected() {
        let registry = CommandRegistry::new();
        registry.add(def("ping", "utility").alias("p")).unwrap();

        let err = registry.add(def("play", "music").alias("p")).err().unwrap();
        assert_eq!(
            err,
            RegistryError::AliasCollision {
                key: "p".into(),
                owner: "ping".into()
            }
        );

        // A new name may not shadow an existing alias either.
        assert!(registry.add(def("p", "misc")).is_err());
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_add_accepts_descriptors_and_chains() {
        let registry = CommandRegistry::new();
        let built = CommandDescriptor::build(def("stats", "info"), None).unwrap();
        registry
            .add(built)
            .unwrap()
            .add((
                def("help", "core"),
                SourceLocation::new("commands/core/help.toml"),
            ))
            .unwrap();
        assert_eq!(registry.size(), 2);
        assert!(registry.peek("help").unwrap().source().is_some());
        assert!(registry.peek("stats").unwrap().source().is_none());
    }

    #[test]
    fn test_added_cooldown_is_initialised() {
        let registry = CommandRegistry::new();
        registry
            .add(def("daily", "economy").cooldown_ms(86_400_000))
            .unwrap();
        assert!(registry.get("daily").unwrap().cooldown().is_some());
    }

    #[test]
    fn test_groups_and_group_query() {
        let registry = CommandRegistry::new();
        registry
            .add(def("ping", "utility"))
            .unwrap()
            .add(def("help", "core"))
            .unwrap()
            .add(def("avatar", "utility"))
            .unwrap()
            .add(def("ban", "moderation"))
            .unwrap();

        assert_eq!(registry.groups(), vec!["utility", "core", "moderation"]);

        let all = registry.get_commands_by_group(&[]);
        let names: Vec<&str> = all.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["ping", "help", "avatar", "ban"]);

        let utility = registry.get_commands_by_group(&["utility", "moderation"]);
        let names: Vec<&str> = utility.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["ping", "avatar", "ban"]);

        assert!(registry.get_commands_by_group(&["nope"]).is_empty());
    }

    #[test]
    fn test_reload_unknown_command() {
        let registry = CommandRegistry::new();
        registry.add(def("help", "core")).unwrap();
        let resolver = MapResolver::default();

        let status = registry.reload("ping", &resolver);
        match status {
            ReloadStatus::Failed { error } => assert!(error.is_not_found()),
            ReloadStatus::Ok { .. } => panic!("reload of unknown command succeeded"),
        }
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_reload_without_source() {
        let registry = CommandRegistry::new();
        registry.add(def("help", "core")).unwrap();
        let status = registry.reload("help", &MapResolver::default());
        assert!(matches!(
            status,
            ReloadStatus::Failed {
                error: ReloadError::NoSource(_)
            }
        ));
    }

    #[test]
    fn test_reload_swaps_descriptor() {
        let resolver = MapResolver::default();
        let path = "commands/utility/ping.toml";
        resolver.put(path, def("ping", "utility").alias("p").cooldown_ms(10_000));

        let registry = CommandRegistry::new();
        let first = resolver.resolve(Path::new(path)).unwrap();
        registry.add((first, SourceLocation::new(path))).unwrap();

        let old = registry.get("p").unwrap();
        old.cooldown().unwrap().try_acquire("u", 1_000).unwrap();

        // Edit the source: new alias, same cooldown.
        resolver.put(path, def("ping", "utility").alias("pong").cooldown_ms(10_000));

        let fresh = registry.reload("p", &resolver).into_result().unwrap();
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert_eq!(fresh.aliases(), ["pong".to_string()]);
        assert_eq!(fresh.invocation_count(), 0);
        assert_eq!(fresh.cooldown().unwrap().last_used("u"), Some(1_000));

        assert!(registry.peek("p").is_none());
        assert!(Arc::ptr_eq(&registry.peek("pong").unwrap(), &fresh));
        assert_eq!(registry.size(), 1);

        // The old instance is still usable by whoever held it.
        assert_eq!(old.name(), "ping");
    }

    #[test]
    fn test_reload_resolution_failure_keeps_old() {
        let resolver = MapResolver::default();
        let registry = CommandRegistry::new();
        registry
            .add((def("ping", "utility"), SourceLocation::new("gone.toml")))
            .unwrap();

        let status = registry.reload("ping", &resolver);
        assert!(matches!(
            status,
            ReloadStatus::Failed {
                error: ReloadError::Resolution(ResolveError::NotFound(_))
            }
        ));
        assert!(registry.peek("ping").is_some());
    }

    #[test]
    fn test_reload_rejects_rename_and_collision() {
        let resolver = MapResolver::default();
        resolver.put("ping.toml", def("ping", "utility"));
        let registry = CommandRegistry::new();
        registry
            .add((def("ping", "utility"), SourceLocation::new("ping.toml")))
            .unwrap()
            .add(def("help", "core").alias("h"))
            .unwrap();

        resolver.put("ping.toml", def("pong", "utility"));
        assert!(matches!(
            registry.reload("ping", &resolver),
            ReloadStatus::Failed {
                error: ReloadError::Renamed { .. }
            }
        ));

        resolver.put("ping.toml", def("ping", "utility").alias("h"));
        assert!(matches!(
            registry.reload("ping", &resolver),
            ReloadStatus::Failed {
                error: ReloadError::Registry(RegistryError::AliasCollision { .. })
            }
        ));
        assert_eq!(registry.get("h").unwrap().name(), "help");
    }

    #[test]
    fn test_remove() {
        let registry = CommandRegistry::new();
        registry.add(def("ping", "utility").alias("p")).unwrap();
        let removed = registry.remove("p").unwrap();
        assert_eq!(removed.name(), "ping");
        assert!(registry.is_empty());
        assert!(registry.peek("p").is_none());
        registry.add(def("p", "utility")).unwrap();
    }
}
