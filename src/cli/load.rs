use std::path::PathBuf;

use colored::Colorize;

use crate::cli::open_store;
use crate::error::Result;
use crate::importer::load_file;
use crate::settings::{load_settings, shellexpand_path};

pub fn run(file: &str, balance: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let (conn, _) = open_store(&settings)?;

    let notes_path = PathBuf::from(shellexpand_path(file));
    let balance_path = balance.map(|b| PathBuf::from(shellexpand_path(b)));
    let result = load_file(&conn, &notes_path, balance_path.as_deref())?;

    println!(
        "Loaded {} rows in {} blocks from {}",
        result.rows,
        result.blocks,
        notes_path.display()
    );
    if balance_path.is_some() {
        println!("Balance sheet: {} accounts", result.accounts);
    }
    if result.unchanged_file {
        println!("{}", "File unchanged since last load; edits kept.".dimmed());
    } else if !result.reset_blocks.is_empty() {
        println!("Reset: {}", result.reset_blocks.join(", "));
    }
    Ok(())
}
