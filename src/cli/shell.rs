use std::{
    fmt,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::core::{CliError, CliMode, ShellContext};
use crate::cli::output;

/// Set to any value to read commands from stdin without prompts or colors.
pub const SCRIPT_ENV: &str = "SITE_LEDGER_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        output::set_color_enabled(false);
    }

    let mut context = ShellContext::new(mode)?;
    let result = match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    };
    context.abandon_pending();
    result
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandCompleter, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandCompleter::new(context.command_names())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output::info("Type `help` to list commands.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                run_line(context, line);
            }
            // Ctrl-C answers a pending delete with "no" before it offers to quit.
            Err(ReadlineError::Interrupted) if context.session().delete_flow.is_pending() => {
                run_line(context, "cancel");
            }
            Err(ReadlineError::Interrupted) => match context.confirm_exit() {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => context.report_error(err),
            },
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// One command per line; blank lines and `#` comments are skipped.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        run_line(context, line);
        if !context.running {
            break;
        }
    }
    Ok(())
}

fn run_line(context: &mut ShellContext, line: &str) {
    if let Err(err) = context.execute_line(line) {
        context.report_error(err);
    }
}

/// Completes the command word only; arguments are free text.
struct CommandCompleter {
    commands: Vec<String>,
}

impl CommandCompleter {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names.into_iter().map(str::to_ascii_lowercase).collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }

    fn matching(&self, prefix: &str) -> Vec<Pair> {
        self.commands
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect()
    }
}

impl Helper for CommandCompleter {}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let head = &line[..pos];
        let start = head.len() - head.trim_start().len();
        let word = &head[start..];
        if word.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        Ok((start, self.matching(&word.to_ascii_lowercase())))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    pub(crate) message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"add "Bolsas de cemento" materials 1,250"#).unwrap();
        assert_eq!(tokens, ["add", "Bolsas de cemento", "materials", "1,250"]);
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line(r#"add "Bolsas materials"#).is_err());
    }

    #[test]
    fn only_the_command_word_completes() {
        let completer = CommandCompleter::new(vec!["summary", "delete", "SELECT"]);
        let names: Vec<String> = completer
            .matching("s")
            .into_iter()
            .map(|pair| pair.replacement)
            .collect();
        assert_eq!(names, ["select", "summary"]);
    }
}
