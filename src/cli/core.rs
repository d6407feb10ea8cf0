use std::io;

use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::cli::registry::{CommandRegistry, SnapshotUse};
use crate::cli::shell::parse_command_line;
use crate::cli::{commands, output};
use crate::config::{Config, ConfigManager};
use crate::core::{Clock, LedgerReader, RetryPolicy, Session, SystemClock};
use crate::core::services::LedgerService;
use crate::errors::{ConfigError, LedgerError};
use crate::storage::{JsonTableStore, RemoteTableStore};
use crate::utils::app_data_dir;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Failures raised by individual shell commands. Reported, never fatal.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// Failures that stop the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// State shared by every command for the lifetime of one shell.
pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) running: bool,
    pub(crate) config: Config,
    pub(crate) service: LedgerService,
    pub(crate) session: Session,
    pub(crate) registry: CommandRegistry,
    pub(crate) theme: ColorfulTheme,
}

impl ShellContext {
    /// Loads configuration from the data directory and opens the JSON store.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = app_data_dir();
        let manager = ConfigManager::with_base_dir(&base)?;
        let config = manager.load()?;
        let store = JsonTableStore::new(config.resolve_store_path(&base));
        tracing::info!(
            config = %manager.path().display(),
            store = %store.path().display(),
            "shell starting"
        );
        Ok(Self::with_parts(
            mode,
            config,
            Box::new(store),
            Box::new(SystemClock),
        ))
    }

    pub fn with_parts(
        mode: CliMode,
        config: Config,
        store: Box<dyn RemoteTableStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let reader = LedgerReader::new(RetryPolicy::from_config(&config));
        let today = clock.today();
        let service =
            LedgerService::new(store, reader, clock).with_stage_tracking(config.track_stages);
        let session = Session::new(today, config.labor_default_amount);
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        Self {
            mode,
            running: true,
            config,
            service,
            session,
            registry,
            theme: ColorfulTheme::default(),
        }
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        if let Some(index) = self.session.delete_flow.pending() {
            format!("ledger (delete row {index}? y/n)> ")
        } else {
            "ledger> ".to_string()
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs one input line. Every command except those that resolve a pending
    /// delete starts from a fresh read of the store.
    pub(crate) fn execute_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.message))?;
        let Some((word, rest)) = tokens.split_first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        let name = self.resolve_word(word);
        let Some(entry) = self.registry.resolve(&name) else {
            self.suggest_command(word);
            return Ok(LoopControl::Continue);
        };
        let (handler, snapshot) = (entry.handler, entry.snapshot);
        tracing::debug!(command = entry.name, args = args.len(), "dispatching");

        if snapshot == SnapshotUse::Fresh {
            self.service.invalidate();
        }
        match handler(self, &args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            Err(err) => Err(err),
        }
    }

    /// While a delete is pending a bare yes/no answers it.
    fn resolve_word(&self, word: &str) -> String {
        let word = word.to_lowercase();
        if self.session.delete_flow.is_pending() {
            match word.as_str() {
                "y" | "yes" => return "confirm".to_string(),
                "n" | "no" => return "cancel".to_string(),
                _ => {}
            }
        }
        word
    }

    /// Drops a delete still waiting for an answer when input ends.
    pub(crate) fn abandon_pending(&mut self) {
        if let Some(index) = self.session.delete_flow.cancel() {
            output::info(format!("Pending delete of row {index} dropped."));
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = closest(input, self.registry.names()) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        crate::cli::io::confirm_action(&self.theme, "Exit shell?", true)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help` for usage details.");
            }
            other => output::error(other),
        }
    }
}

/// Closest candidate within edit distance 3, if any.
pub(crate) fn closest<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let needle = input.to_ascii_lowercase();
    candidates
        .into_iter()
        .map(|candidate| (levenshtein(&needle, &candidate.to_ascii_lowercase()), candidate))
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= 3)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_suggests_near_misses_only() {
        let names = ["summary", "delete", "confirm"];
        assert_eq!(closest("sumary", names), Some("summary"));
        assert_eq!(closest("CONFIMR", names), Some("confirm"));
        assert_eq!(closest("xyzzyplugh", names), None);
    }
}
