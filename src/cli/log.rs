use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::db::list_events;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(limit: usize) -> Result<()> {
    let settings = load_settings();
    let (conn, _) = open_store(&settings)?;
    let events = list_events(&conn, limit)?;

    if events.is_empty() {
        println!("No events yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "When", "Block", "Event", "Payload"]);
    for event in events {
        let kind = match event.kind.as_str() {
            "committed" => event.kind.green().to_string(),
            "mismatch" => event.kind.red().to_string(),
            _ => event.kind.yellow().to_string(),
        };
        table.add_row(vec![
            Cell::new(event.id),
            Cell::new(event.created_at),
            Cell::new(event.block),
            Cell::new(kind),
            Cell::new(event.payload),
        ]);
    }
    println!("Events\n{table}");
    Ok(())
}
