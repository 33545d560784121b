//! Interactive shell state and loop
//!
//! Central state machine: a line comes in, it is parsed into a command,
//! state updates, an action goes out.

use crate::commands::parse_command;
use crate::db::{Database, PostgresProvider, Sort};
use crate::error::{CommandError, Result};
use crate::export::{self, Grid, OutputFormat};
use crate::service::BrowserService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const HELP_TEXT: &str = "\
Commands (prefix with / or : optional):
  connect <url|profile>     connect to a database
  disconnect                close the connection
  tables                    list tables
  use <table>               select a table and show its first page
  data [offset]             show the current page (or jump to an offset)
  structure                 show columns of the current table
  count                     count rows of the current table
  sort <column> [asc|desc]  order the current table
  unsort                    drop the ordering
  next / prev               page forward / back
  format <table|json|csv>   switch output format
  help                      show this help
  quit                      leave

Names containing dots or spaces may be double-quoted: use \"sales.2024\"";

/// What the loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print text to the user
    Print(String),
    /// Leave the shell
    Quit,
}

/// Shell state
pub struct App<D: Database = PostgresProvider> {
    pub service: BrowserService<D>,

    /// Table picked with `use`
    pub current_table: Option<String>,

    pub sort: Option<Sort>,

    /// Offset of the page on screen
    pub offset: u64,

    pub format: OutputFormat,

    /// Whether the shell is running
    pub running: bool,
}

impl<D: Database> App<D> {
    pub fn new(service: BrowserService<D>) -> Self {
        let format = service.settings().default_format;
        Self {
            service,
            current_table: None,
            sort: None,
            offset: 0,
            format,
            running: true,
        }
    }

    pub fn prompt(&self) -> String {
        match (&self.current_table, self.service.is_connected()) {
            (_, false) => "sherlock (disconnected)> ".to_string(),
            (Some(table), true) => format!("sherlock:{}> ", table),
            (None, true) => "sherlock> ".to_string(),
        }
    }

    pub(crate) fn require_table(&self) -> Result<String> {
        self.current_table
            .clone()
            .ok_or_else(|| CommandError::NoTableSelected.into())
    }

    pub(crate) fn render(&self, grid: &Grid) -> String {
        export::render(grid, self.format, self.service.settings().max_cell_width)
    }

    /// Parse and execute one line; errors become printable text
    pub async fn handle_line(&mut self, line: &str) -> Action {
        let result = match parse_command(line) {
            Ok(command) => self.execute_command(command).await,
            Err(e) => Err(e.into()),
        };
        result.unwrap_or_else(|e| Action::Print(format!("Error: {}", e)))
    }

    /// Read commands from stdin until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        stdout
            .write_all(b"sherlock - type /help for commands\n")
            .await?;

        while self.running {
            stdout.write_all(self.prompt().as_bytes()).await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_line(&line).await {
                Action::Print(text) => {
                    stdout.write_all(text.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                }
                Action::Quit => self.running = false,
            }
        }

        self.service.close();
        Ok(())
    }
}
