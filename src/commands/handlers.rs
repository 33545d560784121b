//! Command execution handlers
//!
//! Executes parsed commands and returns appropriate actions.

use crate::app::{Action, App, HELP_TEXT};
use crate::commands::Command;
use crate::db::{DataRequest, Database, Sort};
use crate::error::Result;
use crate::export::{Grid, OutputFormat};

impl<D: Database> App<D> {
    /// Execute a command and return the resulting action
    ///
    /// State (table, sort, offset) only changes once the page it implies
    /// has loaded.
    pub async fn execute_command(&mut self, command: Command) -> Result<Action> {
        match command {
            Command::Connect(address) => {
                self.current_table = None;
                self.sort = None;
                self.offset = 0;
                self.service.connect(&address).await?;
                Ok(Action::Print("Connected.".to_string()))
            }

            Command::Disconnect => {
                self.service.close();
                self.current_table = None;
                self.sort = None;
                self.offset = 0;
                Ok(Action::Print("Disconnected.".to_string()))
            }

            Command::Tables => {
                let tables = self.service.list_table().await?;
                Ok(Action::Print(self.render(&Grid::single_column("table", &tables))))
            }

            Command::Use(table) => self.show_page(table, None, 0).await,

            Command::Data(offset) => {
                let table = self.require_table()?;
                let offset = offset.unwrap_or(self.offset);
                self.show_page(table, self.sort.clone(), offset).await
            }

            Command::Structure => {
                let table = self.require_table()?;
                let columns = self.service.describe(&table).await?;
                Ok(Action::Print(self.render(&Grid::from_structure(&columns))))
            }

            Command::Count => {
                let table = self.require_table()?;
                let count = self.service.list_count(&table).await?;
                Ok(Action::Print(format!("{}: {} rows", table, count)))
            }

            Command::Sort(column, direction) => {
                let table = self.require_table()?;
                self.show_page(table, Some(Sort { column, direction }), 0)
                    .await
            }

            Command::Unsort => {
                let table = self.require_table()?;
                self.show_page(table, None, 0).await
            }

            Command::Next => {
                let table = self.require_table()?;
                let page_size = u64::from(self.service.settings().page_size);
                let request = self.request(&table, self.sort.clone(), self.offset + page_size);
                let page = self.service.fetch_page(&request).await?;
                if page.is_empty() {
                    return Ok(Action::Print("No more rows.".to_string()));
                }
                self.offset = request.offset;
                Ok(Action::Print(self.render_page(&table, &Grid::from(&page))))
            }

            Command::Prev => {
                let table = self.require_table()?;
                let page_size = u64::from(self.service.settings().page_size);
                let offset = self.offset.saturating_sub(page_size);
                self.show_page(table, self.sort.clone(), offset).await
            }

            Command::Format(format) => {
                self.format = format;
                Ok(Action::Print(format!("Output format: {}", format.as_str())))
            }

            Command::Help => Ok(Action::Print(HELP_TEXT.to_string())),

            Command::Quit => Ok(Action::Quit),
        }
    }

    fn request(&self, table: &str, sort: Option<Sort>, offset: u64) -> DataRequest {
        DataRequest {
            table: table.to_string(),
            sort,
            offset,
            limit: self.service.settings().page_size,
        }
    }

    /// Load a page and, if it loads, make it the current view
    async fn show_page(&mut self, table: String, sort: Option<Sort>, offset: u64) -> Result<Action> {
        let request = self.request(&table, sort, offset);
        let page = self.service.fetch_page(&request).await?;

        self.current_table = Some(table.clone());
        self.sort = request.sort;
        self.offset = request.offset;
        Ok(Action::Print(self.render_page(&table, &Grid::from(&page))))
    }

    /// Table output gets a context line; JSON/CSV stay machine-readable
    fn render_page(&self, table: &str, grid: &Grid) -> String {
        let body = self.render(grid);
        if self.format != OutputFormat::Table {
            return body;
        }
        let order = match &self.sort {
            Some(sort) => format!(", ordered by {} {}", sort.column, sort.direction),
            None => String::new(),
        };
        format!("{} (offset {}{})\n{}", table, self.offset, order, body)
    }
}
