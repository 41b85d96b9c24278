//! Filesystem command sources.
//!
//! [`FsResolver`] reads commands from a two-level directory tree of TOML
//! manifests:
//!
//! ```text
//! commands/
//! ├── utility/
//! │   ├── ping.toml
//! │   └── _draft.toml      (skipped by the loader)
//! └── moderation/
//!     └── ban.toml
//! ```
//!
//! A manifest declares the command's metadata and names the handler it binds
//! to. Handlers are ordinary Rust values registered up front in a
//! [`HandlerCatalog`]:
//!
//! ```toml
//! name = "ban"
//! aliases = ["b"]
//! handler = "moderation.ban"   # defaults to `name`
//! description = "Bans a member"
//!
//! [cooldown]
//! duration_ms = 5000
//!
//! [permissions]
//! guild_only = true
//! user = ["BAN_MEMBERS"]
//! ```
//!
//! Parsed manifests are cached per path. [`ModuleResolver::invalidate`]
//! evicts an entry so the next resolve reads the file again, which is how
//! [`CommandRegistry::reload`](herald_core::CommandRegistry::reload) picks up
//! edits.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::Figment;
use figment::providers::{Format, Toml};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use herald_core::{
    BoxedCommandHandler, CommandDefinition, CooldownPolicy, ModuleResolver, PermissionRequirement,
    ResolveError, ResolveResult,
};

// =============================================================================
// HandlerCatalog
// =============================================================================

/// Handlers available to manifests, keyed by name.
#[derive(Default)]
pub struct HandlerCatalog {
    handlers: RwLock<HashMap<String, BoxedCommandHandler>>,
}

impl HandlerCatalog {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one under `key`.
    pub fn register(&self, key: impl Into<String>, handler: BoxedCommandHandler) -> &Self {
        self.handlers.write().insert(key.into(), handler);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(self, key: impl Into<String>, handler: BoxedCommandHandler) -> Self {
        self.register(key, handler);
        self
    }

    /// Returns the handler registered under `key`.
    pub fn get(&self, key: &str) -> Option<BoxedCommandHandler> {
        self.handlers.read().get(key).cloned()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.handlers.read().keys().cloned().collect();
        keys.sort();
        f.debug_struct("HandlerCatalog").field("keys", &keys).finish()
    }
}

// =============================================================================
// CommandManifest
// =============================================================================

/// The `[permissions]` table of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionManifest {
    /// Reject invocations outside guilds.
    pub guild_only: bool,
    /// Reject invocations by non-owners.
    pub owner_only: bool,
    /// Platform permissions the author must hold.
    pub user: Vec<String>,
}

impl PermissionManifest {
    fn to_requirement(&self) -> PermissionRequirement {
        PermissionRequirement {
            guild_only: self.guild_only,
            owner_only: self.owner_only,
            user_permissions: self.user.clone(),
            custom: None,
        }
    }
}

/// A command manifest as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandManifest {
    /// Primary name.
    pub name: String,
    /// Alternative names.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Category tag; defaults to the parent directory's name.
    #[serde(default)]
    pub group: Option<String>,
    /// Handler key in the catalogue; defaults to `name`.
    #[serde(default)]
    pub handler: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Usage string.
    #[serde(default)]
    pub usage: Option<String>,
    /// Cooldown policy.
    #[serde(default)]
    pub cooldown: Option<CooldownPolicy>,
    /// Permission requirement.
    #[serde(default)]
    pub permissions: PermissionManifest,
}

impl CommandManifest {
    /// Parses the manifest at `path`.
    pub fn from_file(path: &Path) -> ResolveResult<Self> {
        if !path.is_file() {
            return Err(ResolveError::NotFound(path.to_path_buf()));
        }
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            return Err(ResolveError::UnsupportedFormat(path.to_path_buf()));
        }

        Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| ResolveError::manifest(path, e.to_string()))
    }

    /// Binds the manifest to a handler from `catalog`.
    pub fn into_definition(
        self,
        path: &Path,
        catalog: &HandlerCatalog,
    ) -> ResolveResult<CommandDefinition> {
        let key = self.handler.as_deref().unwrap_or(&self.name);
        let handler = catalog.get(key).ok_or_else(|| ResolveError::UnknownHandler {
            path: path.to_path_buf(),
            handler: key.to_owned(),
        })?;

        let group = match self.group {
            Some(group) => group,
            None => parent_name(path)
                .ok_or_else(|| ResolveError::manifest(path, "cannot infer group from path"))?,
        };

        Ok(CommandDefinition {
            permission: self.permissions.to_requirement(),
            name: self.name,
            aliases: self.aliases,
            group,
            description: self.description,
            usage: self.usage,
            cooldown: self.cooldown,
            handler,
        })
    }
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()?
        .to_str()
        .map(str::to_owned)
}

// =============================================================================
// FsResolver
// =============================================================================

/// Resolves command manifests from the filesystem.
pub struct FsResolver {
    catalog: Arc<HandlerCatalog>,
    cache: RwLock<HashMap<PathBuf, Arc<CommandManifest>>>,
}

impl FsResolver {
    /// Creates a resolver binding manifests against `catalog`.
    pub fn new(catalog: Arc<HandlerCatalog>) -> Self {
        Self {
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The handler catalogue.
    pub fn catalog(&self) -> &Arc<HandlerCatalog> {
        &self.catalog
    }

    /// Returns `true` if a parsed manifest is cached for `path`.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.read().contains_key(path)
    }

    fn manifest(&self, path: &Path) -> ResolveResult<Arc<CommandManifest>> {
        if let Some(cached) = self.cache.read().get(path) {
            return Ok(Arc::clone(cached));
        }

        let manifest = Arc::new(CommandManifest::from_file(path)?);
        trace!(path = %path.display(), command = %manifest.name, "Manifest parsed");
        self.cache
            .write()
            .insert(path.to_path_buf(), Arc::clone(&manifest));
        Ok(manifest)
    }
}

impl ModuleResolver for FsResolver {
    fn list_entries(&self, path: &Path) -> ResolveResult<Vec<String>> {
        let io_err = |source: io::Error| match source.kind() {
            io::ErrorKind::NotFound => ResolveError::NotFound(path.to_path_buf()),
            _ => ResolveError::Io {
                path: path.to_path_buf(),
                source,
            },
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn resolve(&self, path: &Path) -> ResolveResult<CommandDefinition> {
        let manifest = self.manifest(path)?;
        CommandManifest::clone(&manifest).into_definition(path, &self.catalog)
    }

    fn invalidate(&self, path: &Path) {
        self.cache.write().remove(path);
    }
}

impl std::fmt::Debug for FsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsResolver")
            .field("catalog", &self.catalog)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}
