//! Command parsing
//!
//! Parses a line typed at the shell prompt into a structured Command.
//! Commands accept an optional `/` or `:` prefix (e.g., `/tables`, `:quit`).

use crate::db::SortDirection;
use crate::db::query::split_quoted;
use crate::error::{CommandError, CommandResult};
use crate::export::OutputFormat;

/// Commands the interactive shell understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to a URL or saved profile
    Connect(String),

    /// Close the current connection
    Disconnect,

    /// List tables
    Tables,

    /// Select a table and show its first page
    Use(String),

    /// Show data of the current table, optionally at an offset
    Data(Option<u64>),

    /// Show columns of the current table
    Structure,

    /// Count rows of the current table
    Count,

    /// Order the current table by a column
    Sort(String, SortDirection),

    /// Drop the ordering
    Unsort,

    /// Next page
    Next,

    /// Previous page
    Prev,

    /// Switch output format
    Format(OutputFormat),

    /// Show help
    Help,

    /// Quit the shell
    Quit,
}

/// Parse a command string into a Command enum
///
/// Everything after the command name is its argument, so table names may
/// contain spaces.
pub fn parse_command(input: &str) -> CommandResult<Command> {
    let input = input.trim();
    let input = input
        .strip_prefix('/')
        .or_else(|| input.strip_prefix(':'))
        .unwrap_or(input);
    let (name, args) = match input.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (input, ""),
    };
    let required = |command: &'static str| {
        if args.is_empty() {
            Err(CommandError::MissingArgument(command))
        } else {
            Ok(args.to_string())
        }
    };

    match name {
        "" => Err(CommandError::Unknown(String::new())),
        "connect" | "c" => Ok(Command::Connect(required("connect")?)),
        "disconnect" | "close" => Ok(Command::Disconnect),
        "tables" | "ls" => Ok(Command::Tables),
        "use" | "u" => Ok(Command::Use(required("use")?)),
        "data" | "d" if args.is_empty() => Ok(Command::Data(None)),
        "data" | "d" => args
            .parse::<u64>()
            .map(|offset| Command::Data(Some(offset)))
            .map_err(|_| CommandError::InvalidArgument(format!("invalid offset: {}", args))),
        "structure" | "s" => Ok(Command::Structure),
        "count" => Ok(Command::Count),
        "sort" => parse_sort(args),
        "unsort" => Ok(Command::Unsort),
        "next" | "n" => Ok(Command::Next),
        "prev" | "p" => Ok(Command::Prev),
        "format" | "f" => Ok(Command::Format(required("format")?.parse()?)),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        unknown => Err(CommandError::Unknown(unknown.to_string())),
    }
}

/// `<column> [asc|desc]`, where a column with spaces is written
/// `"first name"` or followed by an explicit direction
fn parse_sort(args: &str) -> CommandResult<Command> {
    let (column, direction) = if args.starts_with('"') {
        let (column, rest) = split_quoted(args)
            .ok_or_else(|| CommandError::InvalidArgument(format!("unterminated quote: {}", args)))?;
        (column, rest.trim())
    } else {
        match args.rsplit_once(char::is_whitespace) {
            Some((column, direction)) => (column.trim_end().to_string(), direction),
            None => (args.to_string(), ""),
        }
    };
    if column.is_empty() {
        return Err(CommandError::MissingArgument("sort"));
    }

    let direction = if direction.is_empty() {
        SortDirection::Asc
    } else {
        direction
            .parse::<SortDirection>()
            .map_err(|e| CommandError::InvalidArgument(e.to_string()))?
    };
    Ok(Command::Sort(column, direction))
}
