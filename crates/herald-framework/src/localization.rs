//! In-memory text catalogue.
//!
//! [`TextCatalog`] is a small [`Localization`] implementation backed by
//! per-language maps of dotted paths to templates. Placeholders such as
//! `%AUTHOR%` are substituted verbatim. Lookups fall back to the default
//! language and finally to the dotted path itself, so a missing text never
//! breaks a dispatch.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use herald_core::{CommandService, Localization, TextRequest};

/// Texts of one command in one language, handed to its handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTexts {
    /// Command name.
    pub command: String,
    /// Language the texts were resolved for.
    pub language: String,
    /// Keys below `commands.<name>.`, mapped to templates.
    pub texts: BTreeMap<String, String>,
}

impl CommandTexts {
    /// Returns the template stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }
}

/// Language → dotted path → template.
#[derive(Debug, Clone)]
pub struct TextCatalog {
    default_language: String,
    texts: HashMap<String, HashMap<String, String>>,
}

impl TextCatalog {
    /// Creates an empty catalogue.
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
            texts: HashMap::new(),
        }
    }

    /// Creates a catalogue preloaded with English system texts.
    pub fn with_system_defaults(default_language: impl Into<String>) -> Self {
        Self::new(default_language)
            .with_text(
                "en-us",
                "system.cooldown",
                "%AUTHOR%, please wait %TIME% before using this command again.",
            )
            .with_text(
                "en-us",
                "system.permission.guild_only",
                "This command can only be used in a server.",
            )
            .with_text(
                "en-us",
                "system.permission.owner_only",
                "This command is reserved for the bot owners.",
            )
            .with_text(
                "en-us",
                "system.permission.missing",
                "You need the following permissions: %PERMISSIONS%",
            )
    }

    /// Adds or replaces a template.
    pub fn with_text(
        mut self,
        language: impl Into<String>,
        path: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.insert(language, path, template);
        self
    }

    /// Adds or replaces a template in place.
    pub fn insert(
        &mut self,
        language: impl Into<String>,
        path: impl Into<String>,
        template: impl Into<String>,
    ) {
        self.texts
            .entry(language.into())
            .or_default()
            .insert(path.into(), template.into());
    }

    fn lookup(&self, language: &str, path: &str) -> Option<&str> {
        self.texts
            .get(language)
            .and_then(|t| t.get(path))
            .or_else(|| {
                self.texts
                    .get(&self.default_language)
                    .and_then(|t| t.get(path))
            })
            .map(String::as_str)
    }

    /// Renders a request synchronously.
    pub fn render(&self, request: &TextRequest) -> String {
        let path = request.dotted_path();
        let Some(template) = self.lookup(&request.language, &path) else {
            return path;
        };
        request
            .parameters
            .iter()
            .fold(template.to_owned(), |text, (key, value)| {
                text.replace(key.as_str(), value)
            })
    }

    /// Collects the texts of one command, default language first.
    pub fn command_texts(&self, name: &str, language: &str) -> CommandTexts {
        let prefix = format!("commands.{name}.");
        let mut texts = BTreeMap::new();
        for lang in [self.default_language.as_str(), language] {
            if let Some(table) = self.texts.get(lang) {
                for (path, template) in table {
                    if let Some(key) = path.strip_prefix(&prefix) {
                        texts.insert(key.to_owned(), template.clone());
                    }
                }
            }
        }
        CommandTexts {
            command: name.to_owned(),
            language: language.to_owned(),
            texts,
        }
    }
}

#[async_trait]
impl Localization for TextCatalog {
    async fn get(&self, request: &TextRequest) -> String {
        self.render(request)
    }

    async fn command(&self, name: &str, language: &str) -> CommandService {
        CommandService::new(self.command_texts(name, language))
    }
}
