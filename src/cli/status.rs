use crate::db::{get_connection, get_metadata, load_notebook};
use crate::error::Result;
use crate::numbering::NoteLabel;
use crate::session::SessionState;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:    {}", settings.data_dir);
    println!("Database:    {}", db_path.display());
    println!(
        "Fiscal year: {}",
        if settings.fiscal_year.is_empty() { "(not set)" } else { settings.fiscal_year.as_str() }
    );

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `noter init` to set up.");
        return Ok(());
    }

    let conn = get_connection(&db_path)?;
    let notebook = load_notebook(&conn)?;
    let source = get_metadata(&conn, "source_file");
    println!("Source:      {}", source.as_deref().unwrap_or("(nothing loaded)"));

    let numbering = notebook.numbering();
    let numbered = numbering
        .iter()
        .filter(|(_, label)| matches!(label, NoteLabel::Numbered(_)))
        .count();
    let editing: Vec<&str> = notebook
        .sessions
        .iter()
        .filter(|(_, s)| s.state == SessionState::Editing)
        .map(|(code, _)| code.as_str())
        .collect();
    let rows: usize = notebook.blocks.iter().map(|b| b.items.len()).sum();
    let events: i64 = conn.query_row("SELECT count(*) FROM events", [], |r| r.get(0))?;

    println!();
    println!("Blocks:        {}", notebook.blocks.len());
    println!("Line items:    {rows}");
    println!("Numbered:      {numbered}");
    if notebook.balance_sheet.is_empty() {
        println!("Accounts:      none (load with --balance)");
    } else {
        println!("Accounts:      {}", notebook.balance_sheet.len());
    }
    println!("Events:        {events}");
    if editing.is_empty() {
        println!("Editing:       none");
    } else {
        println!("Editing:       {}", editing.join(", "));
    }
    Ok(())
}
