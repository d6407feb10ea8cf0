use crate::cli::core::{CommandResult, ShellContext};

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// How a command treats the cached ledger snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotUse {
    /// Re-reads the store before running.
    Fresh,
    /// Works on the snapshot a pending delete index was taken from.
    Held,
}

pub struct CommandEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub snapshot: SnapshotUse,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            description,
            usage,
            snapshot: SnapshotUse::Fresh,
            handler,
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn holding_snapshot(mut self) -> Self {
        self.snapshot = SnapshotUse::Held;
        self
    }

    fn answers_to(&self, word: &str) -> bool {
        self.name == word || self.aliases.iter().any(|alias| *alias == word)
    }
}

/// Shell commands in registration order, which is also the `help` order.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing an earlier one with the same name.
    pub fn register(&mut self, entry: CommandEntry) {
        match self.entries.iter_mut().find(|known| known.name == entry.name) {
            Some(known) => *known = entry,
            None => self.entries.push(entry),
        }
    }

    /// Looks a word up by name, then by alias.
    pub fn resolve(&self, word: &str) -> Option<&CommandEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name == word)
            .or_else(|| self.entries.iter().find(|entry| entry.answers_to(word)))
    }

    pub fn list(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }
}
