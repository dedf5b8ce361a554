use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::convert::Args;
use super::pattern::{Pattern, PatternError};

pub type HandlerResult = Result<String, String>;

/// The uniform shape every bound command handler satisfies: typed arguments
/// in placeholder order against a mutable world, `Ok` payload or `Err`
/// message back.
pub type Handler<W> = Box<dyn Fn(&mut W, &Args) -> HandlerResult + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("pattern `{pattern}` collides with an already registered command")]
    DuplicatePattern { pattern: String },
}

/// One registered command: compiled pattern, bound handler, description.
pub struct CommandEntry<W> {
    pattern: Pattern,
    handler: Handler<W>,
    description: String,
}

impl<W> CommandEntry<W> {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn invoke(&self, world: &mut W, args: &Args) -> HandlerResult {
        (self.handler)(world, args)
    }
}

/// A help listing row, served over `vget /commands` and the HTTP bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelpEntry {
    pub pattern: String,
    pub description: String,
}

/// Registered commands grouped by literal prefix. Built once at startup,
/// read-only afterwards.
pub struct CommandTable<W> {
    sets: HashMap<String, Vec<CommandEntry<W>>>,
}

impl<W> Default for CommandTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> CommandTable<W> {
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    pub fn register<F>(
        &mut self,
        pattern: &str,
        handler: F,
        description: &str,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&mut W, &Args) -> HandlerResult + Send + Sync + 'static,
    {
        let compiled = Pattern::parse(pattern)?;
        let set = self.sets.entry(compiled.prefix_key()).or_default();
        if set.iter().any(|entry| entry.pattern.collides_with(&compiled)) {
            return Err(RegistryError::DuplicatePattern {
                pattern: compiled.source().to_string(),
            });
        }
        set.push(CommandEntry {
            pattern: compiled,
            handler: Box::new(handler),
            description: description.to_string(),
        });
        Ok(())
    }

    /// Finds the overload set under the longest literal prefix of `tokens`.
    pub fn lookup(&self, tokens: &[&str]) -> Option<&[CommandEntry<W>]> {
        for len in (1..=tokens.len()).rev() {
            let key = tokens[..len].join(" ");
            if let Some(set) = self.sets.get(&key) {
                return Some(set);
            }
        }
        None
    }

    /// Best-effort diagnostic for unknown commands: the registered pattern
    /// whose prefix shares the most leading tokens with the line.
    pub fn closest_pattern(&self, tokens: &[&str]) -> Option<&str> {
        let mut best: Option<(usize, &str)> = None;
        for (key, set) in &self.sets {
            let shared = key
                .split(' ')
                .zip(tokens.iter())
                .take_while(|(a, b)| a == *b)
                .count();
            let Some(entry) = set.first() else { continue };
            let source = entry.pattern.source();
            let candidate = (shared, source);
            best = match best {
                // Ties resolve to the lexicographically first pattern so the
                // diagnostic is stable across runs.
                Some(current) if current.0 > shared => Some(current),
                Some(current) if current.0 == shared && current.1 <= source => Some(current),
                _ => Some(candidate),
            };
        }
        best.filter(|(shared, _)| *shared > 0).map(|(_, source)| source)
    }

    pub fn help(&self) -> Vec<HelpEntry> {
        let mut entries: Vec<HelpEntry> = self
            .sets
            .values()
            .flatten()
            .map(|entry| HelpEntry {
                pattern: entry.pattern.source().to_string(),
                description: entry.description.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.pattern.cmp(&b.pattern));
        entries
    }

    pub fn command_count(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }
}
