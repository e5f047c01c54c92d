use crate::history::{HistoryStore, StoreError};

/// Words that toggle the history store instead of being sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedCommand {
    /// `stoptmp` / `rmtmp`: delete the store
    DisableHistory,
    /// `usetmp` / `tmp`: create the store
    EnableHistory,
    /// `cleantmp`: recreate the store empty
    ResetHistory,
}

impl ReservedCommand {
    /// Recognise a reserved word (surrounding whitespace and case are ignored)
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "stoptmp" | "rmtmp" => Some(ReservedCommand::DisableHistory),
            "usetmp" | "tmp" => Some(ReservedCommand::EnableHistory),
            "cleantmp" => Some(ReservedCommand::ResetHistory),
            _ => None,
        }
    }

    /// Apply the command to `store` and describe what happened
    pub fn apply(self, store: &HistoryStore) -> Result<String, StoreError> {
        let path = store.path().display();
        match self {
            ReservedCommand::DisableHistory => {
                if store.disable()? {
                    Ok(format!("History '{}' deleted", path))
                } else {
                    Ok(format!("History '{}' was not enabled", path))
                }
            }
            ReservedCommand::EnableHistory => {
                store.enable()?;
                Ok(format!("History '{}' created", path))
            }
            ReservedCommand::ResetHistory => {
                store.reset()?;
                Ok(format!("History '{}' cleared and recreated", path))
            }
        }
    }
}

/// Interactive `!` commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BangCommand {
    Help,
    Quit,
    Reset,
    Save(Option<String>),
    File(String),
    Add(String),
    Last,
    Model(Option<String>),
    Clear,
    /// A known command used without its required argument; carries the usage line
    MissingArgument(&'static str),
    Unknown(String),
}

impl BangCommand {
    /// Parse a line starting with `!`; other lines are not commands.
    ///
    /// Command names are case-insensitive, arguments are kept as typed.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix('!')?;

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        let command = match name.to_lowercase().as_str() {
            "help" | "h" => BangCommand::Help,
            "q" | "quit" | "exit" => BangCommand::Quit,
            "r" | "reset" => BangCommand::Reset,
            "save" => BangCommand::Save(arg),
            "file" | "f" => match arg {
                Some(path) => BangCommand::File(path),
                None => BangCommand::MissingArgument("!file <path>"),
            },
            "add" => match arg {
                Some(path) => BangCommand::Add(path),
                None => BangCommand::MissingArgument("!add <path>"),
            },
            "last" => BangCommand::Last,
            "model" | "m" => BangCommand::Model(arg),
            "clear" => BangCommand::Clear,
            _ => BangCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Lines printed by `!help`
pub const HELP_ENTRIES: &[(&str, &str)] = &[
    ("!help", "Show this help"),
    ("!q, !quit, !exit", "Leave interactive mode"),
    ("!r, !reset", "Reset the conversation to background and history"),
    ("!save [path]", "Save this session's conversation to a file"),
    ("!file <path>", "Send a file and ask for an answer"),
    ("!add <path>", "Add a file to the conversation without asking"),
    ("!last", "Show the previous answer"),
    ("!model [n]", "List models, or switch to model n"),
    ("!clear", "Clear the screen"),
];

/// Lines describing the reserved history words
pub const RESERVED_ENTRIES: &[(&str, &str)] = &[
    ("stoptmp, rmtmp", "Delete the history file (stop recording)"),
    ("usetmp, tmp", "Create the history file (start recording)"),
    ("cleantmp", "Empty the history file"),
];
