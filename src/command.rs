//! Text commands (`!play never gonna`, `!stop`, ...) parsed into a tagged
//! [`Command`]. The chat transport only has to hand over the raw text.

use crate::media::mime::MediaKind;
use crate::session::message::ControlCommand;

pub const PREFIX: char = '!';

/// Argument that selects a random entry instead of resolving a query.
pub const RANDOM_TARGET: &str = "$random";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Query(String),
    Random,
}

impl Target {
    fn parse(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case(RANDOM_TARGET) {
            Target::Random
        } else {
            Target::Query(arg.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play {
        kind: MediaKind,
        target: Target,
        looped: bool,
    },
    Search {
        kind: MediaKind,
        query: String,
    },
    Control(ControlCommand),
    Status,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("not a command")]
    NotACommand,
    #[error("command not found: {0}")]
    Unknown(String),
    #[error("missing argument, usage: `{usage}`")]
    MissingArgument { usage: &'static str },
}

type Builder = fn(&str) -> Result<Command, CommandError>;

struct CommandDef {
    name: &'static str,
    usage: &'static str,
    build: Builder,
}

const COMMANDS: &[CommandDef] = &[
    CommandDef { name: "play", usage: "!play <name>", build: |arg| Ok(play(MediaKind::Audio, arg, false)) },
    CommandDef { name: "loop", usage: "!loop <name>", build: |arg| Ok(play(MediaKind::Audio, arg, true)) },
    CommandDef { name: "vplay", usage: "!vplay <name>", build: |arg| Ok(play(MediaKind::Video, arg, false)) },
    CommandDef { name: "search", usage: "!search <query>", build: |arg| Ok(search(MediaKind::Audio, arg)) },
    CommandDef { name: "vsearch", usage: "!vsearch <query>", build: |arg| Ok(search(MediaKind::Video, arg)) },
    CommandDef { name: "pause", usage: "!pause", build: |_| Ok(Command::Control(ControlCommand::Pause)) },
    CommandDef { name: "stop", usage: "!stop", build: |_| Ok(Command::Control(ControlCommand::Stop)) },
    CommandDef { name: "status", usage: "!status", build: |_| Ok(Command::Status) },
    CommandDef { name: "reload", usage: "!reload", build: |_| Ok(Command::Reload) },
];

/// Commands that refuse an empty argument.
const NEEDS_ARGUMENT: &[&str] = &["play", "loop", "vplay", "search", "vsearch"];

fn play(kind: MediaKind, arg: &str, looped: bool) -> Command {
    Command::Play {
        kind,
        target: Target::parse(arg),
        looped,
    }
}

fn search(kind: MediaKind, arg: &str) -> Command {
    Command::Search {
        kind,
        query: arg.to_string(),
    }
}

/// Parse one line of chat text. Text without the `!` prefix is
/// [`CommandError::NotACommand`] so callers can ignore ordinary messages.
pub fn parse(text: &str) -> Result<Command, CommandError> {
    let text = text.trim();
    let Some(body) = text.strip_prefix(PREFIX) else {
        return Err(CommandError::NotACommand);
    };
    let (name, arg) = match body.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (body, ""),
    };
    let name = name.to_ascii_lowercase();

    let def = COMMANDS
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| CommandError::Unknown(name.clone()))?;
    if arg.is_empty() && NEEDS_ARGUMENT.contains(&def.name) {
        return Err(CommandError::MissingArgument { usage: def.usage });
    }
    (def.build)(arg)
}

/// Usage lines for every known command.
pub fn usage() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|def| def.usage)
}
