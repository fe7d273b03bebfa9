pub mod edit;
pub mod init;
pub mod load;
pub mod log;
pub mod show;
pub mod status;
pub mod toggle;

use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;

use crate::db::{get_connection, init_db, load_notebook};
use crate::error::{NoterError, Result};
use crate::notebook::Notebook;
use crate::settings::Settings;

/// Open the working store for a command. The database must exist already.
pub(crate) fn open_store(settings: &Settings) -> Result<(Connection, Notebook)> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(NoterError::Settings(format!(
            "No database found at {}\nRun `noter init` to set up.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    let notebook = load_notebook(&conn)?;
    Ok((conn, notebook))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

#[derive(Parser)]
#[command(name = "noter", about = "Review, edit and reconcile financial note schedules.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for noter data (default: ~/Documents/noter)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Fiscal year label shown in headers, e.g. 2025
        #[arg(long = "fiscal-year")]
        fiscal_year: Option<String>,
    },
    /// Load a parsed note export (JSON line items).
    Load {
        /// Path to the JSON export
        file: String,
        /// Balance-sheet CSV: account_id,current,previous
        #[arg(long)]
        balance: Option<String>,
    },
    /// Show the numbered note list, or one block's visible rows.
    Show {
        /// Block code, e.g. machinery
        block: Option<String>,
        /// Include the account details behind each row
        #[arg(long)]
        details: bool,
    },
    /// Show the data directory and a summary of the loaded notes.
    Status,
    /// Reveal or hide zero rows flagged as toggleable.
    Toggle { block: String, switch: Switch },
    /// Turn a note's "show this note" switch on or off.
    Visibility { block: String, switch: Switch },
    /// Number the note even when it has no visible rows.
    #[command(name = "always-show")]
    AlwaysShow { block: String, switch: Switch },
    /// Start editing a block.
    Edit { block: String },
    /// Enter a value for a flow row of a block being edited.
    Set {
        block: String,
        /// Variable name, e.g. mach_purchase
        variable: String,
        /// Amount; separators and currency marks are ignored
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Write the previous-year column instead of the current one
        #[arg(long)]
        previous: bool,
    },
    /// Reconcile against the book value and commit the edits.
    Approve { block: String },
    /// Leave edit mode and drop uncommitted edits.
    Cancel { block: String },
    /// Drop edits and committed values, back to the loaded figures.
    Undo { block: String },
    /// Show the event log, newest first.
    Log {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}
