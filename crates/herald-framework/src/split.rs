//! Prefix resolution and invocation splitting.

/// The prefixes a message may start with, in precedence order.
#[derive(Debug, Clone, Copy)]
pub struct Prefixes<'a> {
    /// Literal prefix that always wins when present.
    pub fixed: &'a str,
    /// The client's global default prefix.
    pub global: Option<&'a str>,
    /// The guild's configured prefix.
    pub guild: Option<&'a str>,
}

impl<'a> Prefixes<'a> {
    /// Picks the prefix `content` is addressed with.
    ///
    /// The fixed prefix wins if `content` starts with it, then the global
    /// one. Otherwise a configured guild prefix applies whether or not the
    /// text starts with it. Empty prefixes count as unconfigured.
    pub fn resolve(&self, content: &str) -> Option<&'a str> {
        [Some(self.fixed), self.global]
            .into_iter()
            .flatten()
            .find(|p| !p.is_empty() && content.starts_with(*p))
            .or(self.guild.filter(|p| !p.is_empty()))
    }
}

/// A message split into command name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// The prefix that was stripped.
    pub prefix: &'a str,
    /// Candidate command name.
    pub name: &'a str,
    /// Remaining tokens.
    pub args: Vec<&'a str>,
}

impl Invocation<'_> {
    /// Owned copies of the arguments.
    pub fn owned_args(&self) -> Vec<String> {
        self.args.iter().map(|a| (*a).to_owned()).collect()
    }
}

/// Drops the first `prefix.len()` bytes and splits the rest on runs of
/// whitespace.
///
/// The text is not required to start with `prefix`. Returns `None` if the
/// cut falls inside a character or nothing but whitespace follows it.
pub fn split_invocation<'a>(content: &'a str, prefix: &'a str) -> Option<Invocation<'a>> {
    let mut tokens = content.get(prefix.len()..)?.split_whitespace();
    let name = tokens.next()?;
    Some(Invocation {
        prefix,
        name,
        args: tokens.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: Prefixes<'static> = Prefixes {
        fixed: "mai",
        global: Some("!"),
        guild: None,
    };

    #[test]
    fn test_fixed_prefix_wins() {
        assert_eq!(DEFAULTS.resolve("mai ping"), Some("mai"));
        let with_guild = Prefixes {
            guild: Some("mai"),
            global: Some("m"),
            ..DEFAULTS
        };
        assert_eq!(with_guild.resolve("maiping"), Some("mai"));
    }

    #[test]
    fn test_global_then_guild() {
        let prefixes = Prefixes {
            guild: Some("?"),
            ..DEFAULTS
        };
        assert_eq!(prefixes.resolve("!ping"), Some("!"));
        assert_eq!(prefixes.resolve("?ping"), Some("?"));
        // A configured guild prefix is the fallback for any other text.
        assert_eq!(prefixes.resolve("ping"), Some("?"));
        assert_eq!(DEFAULTS.resolve("ping"), None);
    }

    #[test]
    fn test_no_prefix_configured() {
        assert_eq!(DEFAULTS.resolve("hello there"), None);
        let empty = Prefixes {
            fixed: "",
            global: Some(""),
            guild: Some(""),
        };
        assert_eq!(empty.resolve("anything"), None);
    }

    #[test]
    fn test_split_fixed_prefix() {
        let inv = split_invocation("mai ping", "mai").unwrap();
        assert_eq!(inv.prefix, "mai");
        assert_eq!(inv.name, "ping");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn test_split_arguments() {
        let inv = split_invocation("!help me please", "!").unwrap();
        assert_eq!(inv.name, "help");
        assert_eq!(inv.args, vec!["me", "please"]);
        assert_eq!(inv.owned_args(), vec!["me".to_string(), "please".to_string()]);
    }

    #[test]
    fn test_split_collapses_whitespace() {
        let inv = split_invocation("!  ban \t user   reason ", "!").unwrap();
        assert_eq!(inv.name, "ban");
        assert_eq!(inv.args, vec!["user", "reason"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_invocation("!", "!").is_none());
        assert!(split_invocation("!   ", "!").is_none());
    }

    #[test]
    fn test_split_cuts_prefix_length() {
        let inv = split_invocation("xping now", "?").unwrap();
        assert_eq!(inv.name, "ping");
        assert_eq!(inv.args, vec!["now"]);

        // A cut inside a multi-byte character yields nothing.
        assert!(split_invocation("éping", "?").is_none());
    }
}
