use colored::Colorize;
use std::fmt;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

/// Turns ANSI styling on or off for everything printed afterwards.
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info => "[i]",
        MessageKind::Success => "[ok]",
        MessageKind::Warning => "[!]",
        MessageKind::Error => "[x]",
        MessageKind::Section => "",
    }
}

pub(crate) fn format_message(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
        MessageKind::Info => format!("{} {text}", label(kind)).cyan().to_string(),
        MessageKind::Success => format!("{} {text}", label(kind)).green().to_string(),
        MessageKind::Warning => format!("{} {text}", label(kind)).yellow().to_string(),
        MessageKind::Error => format!("{} {text}", label(kind)).red().bold().to_string(),
    }
}

fn emit(kind: MessageKind, message: impl fmt::Display) {
    let line = format_message(kind, message);
    if matches!(kind, MessageKind::Error) {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn info(message: impl fmt::Display) {
    emit(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    emit(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    emit(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    emit(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    emit(MessageKind::Section, title);
}

/// Prints pre-rendered lines verbatim.
pub fn lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
