use std::fmt;

use colored::Colorize;

use crate::validation::ValidationResult;
use crate::wizard::{Notice, NoticeLevel, NoticeSink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn label(kind: MessageKind) -> (&'static str, &'static str) {
    match kind {
        MessageKind::Info => ("INFO", "[i]"),
        MessageKind::Success => ("SUCCESS", "[+]"),
        MessageKind::Warning => ("WARNING", "[!]"),
        MessageKind::Error => ("ERROR", "[x]"),
        MessageKind::Section => ("", ""),
    }
}

/// Text for one message, without colour.
pub fn format_plain(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => {
            let (label, icon) = label(kind);
            format!("{label}: {icon} {text}")
        }
    }
}

fn styled(kind: MessageKind, message: impl fmt::Display) -> String {
    let plain = format_plain(kind, message);
    match kind {
        MessageKind::Success => plain.bright_green().to_string(),
        MessageKind::Warning => plain.bright_yellow().to_string(),
        MessageKind::Error => plain.bright_red().to_string(),
        MessageKind::Section => plain.bold().to_string(),
        MessageKind::Info => plain,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = styled(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        MessageKind::Error => eprintln!("{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display, description: &str) {
    print(MessageKind::Section, title);
    if !description.is_empty() {
        println!("{}", description.dimmed());
    }
}

/// One-line rendering of a validator result.
pub fn describe_validation(result: &ValidationResult) -> String {
    if result.is_valid {
        "valid".to_string()
    } else {
        format!("invalid: {}", result.message)
    }
}

/// Shows wizard notices on the terminal.
pub struct TerminalNotices;

impl NoticeSink for TerminalNotices {
    fn show(&self, notice: Notice) {
        let kind = match notice.level {
            NoticeLevel::Info => MessageKind::Info,
            NoticeLevel::Success => MessageKind::Success,
            NoticeLevel::Warning => MessageKind::Warning,
            NoticeLevel::Error => MessageKind::Error,
        };
        print(kind, &notice.message);
    }
}
