use chrono::Utc;
use colored::Colorize;
use rusqlite::Connection;

use crate::bookvalue::book_value;
use crate::cli::open_store;
use crate::db::{record_event, save_notebook};
use crate::error::Result;
use crate::fmt::amount;
use crate::models::Period;
use crate::notebook::Notebook;
use crate::session::NoteEvent;
use crate::settings::load_settings;

fn with_store<T>(f: impl FnOnce(&Connection, &mut Notebook) -> Result<T>) -> Result<T> {
    let settings = load_settings();
    let (conn, mut notebook) = open_store(&settings)?;
    let out = f(&conn, &mut notebook)?;
    notebook.prune_notices(Utc::now(), settings.notice_ttl());
    save_notebook(&conn, &notebook)?;
    Ok(out)
}

pub fn start(block: &str) -> Result<()> {
    with_store(|_, notebook| notebook.start_edit(block))?;
    println!("Editing {block}. All rows shown; use `noter set` then `noter approve {block}`.");
    Ok(())
}

pub fn set(block: &str, variable: &str, value: &str, previous: bool) -> Result<()> {
    let period = if previous { Period::Previous } else { Period::Current };
    let (notice, resolved) = with_store(|conn, notebook| {
        let notice = notebook.commit_draft(block, variable, period, value)?;
        if let Some(notice) = &notice {
            record_event(conn, &NoteEvent::SignAdjusted(notice.clone()))?;
        }
        let nb_block = notebook.block(block)?;
        let resolved = notebook
            .session(block)
            .map(|s| s.resolver(nb_block).resolve(variable, period))
            .unwrap_or_default();
        Ok((notice, resolved))
    })?;

    println!("{block}.{variable} ({period}) = {}", amount(resolved));
    if let Some(notice) = notice {
        println!("{}", notice.message().yellow());
    }
    Ok(())
}

pub fn approve(block: &str) -> Result<()> {
    let (event, book) = with_store(|conn, notebook| {
        let event = notebook.approve(block)?;
        record_event(conn, &event)?;
        let book = book_value(notebook.block(block)?, &notebook.balance_sheet);
        Ok((event, book))
    })?;

    match event {
        NoteEvent::Mismatch {
            periods,
            delta_current,
            delta_previous,
            ..
        } => {
            println!("{} {block} does not reconcile with its book value", "MISMATCH".red().bold());
            for period in periods {
                let delta = match period {
                    Period::Current => delta_current,
                    Period::Previous => delta_previous,
                };
                let book = book.map(|b| b.get(period));
                println!(
                    "  {period:<9} book value {}  difference {}",
                    book.map(amount).unwrap_or_default(),
                    amount(delta).red()
                );
            }
            println!("Still editing. Adjust with `noter set`, or `noter cancel {block}`.");
        }
        NoteEvent::Committed { .. } => {
            println!("{} {block}", "Approved".green().bold());
        }
        NoteEvent::SignAdjusted(_) => {}
    }
    Ok(())
}

pub fn cancel(block: &str) -> Result<()> {
    with_store(|_, notebook| notebook.cancel(block))?;
    println!("Cancelled edits to {block}");
    Ok(())
}

pub fn undo(block: &str) -> Result<()> {
    with_store(|_, notebook| notebook.undo(block))?;
    println!("Reverted {block} to the loaded figures");
    Ok(())
}
