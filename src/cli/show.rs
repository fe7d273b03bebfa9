use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_store;
use crate::error::Result;
use crate::fmt::{amount, amount_or_blank};
use crate::notebook::{Notebook, RenderedRow};
use crate::numbering::NoteLabel;
use crate::session::SessionState;
use crate::settings::{load_settings, Settings};

pub(crate) fn label_text(label: NoteLabel) -> String {
    match label {
        NoteLabel::Numbered(n) => n.to_string(),
        NoteLabel::Greyed => "(off)".to_string(),
        NoteLabel::Omitted => "-".to_string(),
    }
}

pub(crate) fn state_text(state: SessionState) -> String {
    match state {
        SessionState::Viewing => "viewing".to_string(),
        SessionState::Editing => "editing".yellow().bold().to_string(),
    }
}

/// Column headers: the fiscal year and the one before it when the
/// configured label is a year, otherwise plain period names.
fn period_headers(settings: &Settings) -> (String, String) {
    match settings.fiscal_year.trim().parse::<i32>() {
        Ok(year) => (year.to_string(), (year - 1).to_string()),
        Err(_) => ("Current".to_string(), "Previous".to_string()),
    }
}

pub fn run(block: Option<&str>, details: bool) -> Result<()> {
    let settings = load_settings();
    let (_, notebook) = open_store(&settings)?;

    match block {
        Some(code) => show_block(&notebook, &settings, code, details)?,
        None => list_notes(&notebook),
    }

    for notice in notebook.active_notices(Utc::now(), settings.notice_ttl()) {
        println!("{}", notice.message().yellow());
    }
    Ok(())
}

fn list_notes(notebook: &Notebook) {
    if notebook.blocks.is_empty() {
        println!("No notes loaded. Run `noter load <file>` first.");
        return;
    }

    let numbering = notebook.numbering();
    let mut table = Table::new();
    table.set_header(vec!["Note", "Block", "Title", "State", "Visible rows"]);
    for (block, (_, label)) in notebook.blocks.iter().zip(numbering) {
        let Ok(rendered) = notebook.render_block(&block.code) else {
            continue;
        };
        let title = match label {
            NoteLabel::Numbered(_) => Cell::new(&rendered.title),
            _ => Cell::new(rendered.title.dimmed()),
        };
        table.add_row(vec![
            Cell::new(label_text(label)).set_alignment(CellAlignment::Right),
            Cell::new(&block.code),
            title,
            Cell::new(state_text(rendered.state)),
            Cell::new(rendered.rows.len()).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Notes\n{table}");
}

fn row_title(row: &RenderedRow) -> String {
    let indent = if row.style.tabbed { "    " } else { "" };
    let title = format!("{indent}{}", row.title);
    if row.style.is_heading() || row.style.is_subtotal() {
        title.bold().to_string()
    } else {
        title
    }
}

fn row_amount(row: &RenderedRow, value: i64) -> String {
    let text = if row.style.is_heading() {
        amount_or_blank(value)
    } else {
        amount(value)
    };
    if row.edited {
        text.yellow().to_string()
    } else if row.style.is_subtotal() {
        text.bold().to_string()
    } else {
        text
    }
}

fn show_block(notebook: &Notebook, settings: &Settings, code: &str, details: bool) -> Result<()> {
    let rendered = notebook.render_block(code)?;
    let (current_header, previous_header) = period_headers(settings);

    let heading = match rendered.label.number() {
        Some(n) => format!("Note {n}: {}", rendered.title),
        None => rendered.title.clone(),
    };
    println!("{} ({})", heading.bold(), rendered.code);
    println!(
        "State: {}   Show all rows: {}",
        state_text(rendered.state),
        if rendered.toggle_on { "on" } else { "off" }
    );
    if rendered.has_drafts {
        println!("{}", "Unapproved edits: run `noter approve` to commit them.".yellow());
    }

    if rendered.rows.is_empty() {
        println!("{}", "No visible rows.".dimmed());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Row", "Title", "Variable", current_header.as_str(), previous_header.as_str()]);
    for row in &rendered.rows {
        let variable = match &row.variable {
            Some(v) if row.editable => format!("{v} *"),
            Some(v) => v.clone(),
            None => String::new(),
        };
        table.add_row(vec![
            Cell::new(row.row_id),
            Cell::new(row_title(row)),
            Cell::new(variable),
            Cell::new(row_amount(row, row.current)).set_alignment(CellAlignment::Right),
            Cell::new(row_amount(row, row.previous)).set_alignment(CellAlignment::Right),
        ]);
        if details {
            for detail in &row.details {
                table.add_row(vec![
                    Cell::new(""),
                    Cell::new(format!("  {} {}", detail.account_id, detail.text).dimmed()),
                    Cell::new(""),
                    Cell::new(amount(crate::models::round_amount(detail.balance)).dimmed())
                        .set_alignment(CellAlignment::Right),
                    Cell::new(""),
                ]);
            }
        }
    }
    println!("{table}");
    if rendered.rows.iter().any(|r| r.editable) {
        println!("{}", "* editable while the block is in edit mode".dimmed());
    }
    Ok(())
}
