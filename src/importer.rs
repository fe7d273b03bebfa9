use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::bookvalue::BalanceSheet;
use crate::db::{get_metadata, load_notebook, save_notebook, set_metadata};
use crate::error::{NoterError, Result};
use crate::models::{BalanceFigures, NoteLineItem};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a balance-sheet figure: thousands separators, spaces and currency
/// marks are dropped; `(123)` is negative.
pub fn parse_figure(raw: &str) -> f64 {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | ' ' | '\u{a0}'))
        .collect();
    let s = s.trim().trim_end_matches("kr").trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Line items as exported by the parser: a JSON array of rows.
pub fn read_items(file_path: &Path) -> Result<Vec<NoteLineItem>> {
    let content = std::fs::read_to_string(file_path)?;
    let items: Vec<NoteLineItem> = serde_json::from_str(&content)?;
    if items.is_empty() {
        return Err(NoterError::Other(format!(
            "{} contains no line items",
            file_path.display()
        )));
    }
    Ok(items)
}

/// Balance-sheet CSV: `account_id,current,previous`, header optional.
pub fn read_balance_sheet(file_path: &Path) -> Result<BalanceSheet> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut sheet = BalanceSheet::default();

    for result in rdr.records() {
        let record = result?;
        let account_id = record.get(0).map(str::trim).unwrap_or_default();
        if account_id.is_empty() || account_id.starts_with('#') || account_id == "account_id" {
            continue;
        }
        let current = record.get(1).map(parse_figure).unwrap_or(0.0);
        let previous = record.get(2).map(parse_figure).unwrap_or(0.0);
        sheet.insert(account_id, BalanceFigures { current, previous });
    }
    Ok(sheet)
}

// ---------------------------------------------------------------------------
// load_file
// ---------------------------------------------------------------------------

pub struct LoadResult {
    pub blocks: usize,
    pub rows: usize,
    pub accounts: usize,
    /// Blocks that got a fresh baseline (new or changed rows).
    pub reset_blocks: Vec<String>,
    pub unchanged_file: bool,
}

pub fn load_file(conn: &Connection, notes_path: &Path, balance_path: Option<&Path>) -> Result<LoadResult> {
    let checksum = compute_checksum(notes_path)?;
    let unchanged_file = get_metadata(conn, "source_checksum").as_deref() == Some(checksum.as_str());

    let items = read_items(notes_path)?;
    let rows = items.len();

    let mut notebook = load_notebook(conn)?;
    let before: Vec<(String, Option<String>)> = notebook
        .sessions
        .iter()
        .map(|(code, s)| (code.clone(), s.fingerprint.clone()))
        .collect();
    notebook.load(items);
    let reset_blocks: Vec<String> = notebook
        .sessions
        .iter()
        .filter(|(code, session)| {
            !before
                .iter()
                .any(|(c, fp)| c == *code && *fp == session.fingerprint)
        })
        .map(|(code, _)| code.clone())
        .collect();

    if let Some(path) = balance_path {
        notebook.balance_sheet = read_balance_sheet(path)?;
    }

    save_notebook(conn, &notebook)?;
    set_metadata(conn, "source_file", &notes_path.display().to_string())?;
    set_metadata(conn, "source_checksum", &checksum)?;

    info!(
        file = %notes_path.display(),
        blocks = notebook.blocks.len(),
        rows,
        reset = reset_blocks.len(),
        "loaded note set"
    );

    Ok(LoadResult {
        blocks: notebook.blocks.len(),
        rows,
        accounts: notebook.balance_sheet.len(),
        reset_blocks,
        unchanged_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::Period;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    const NOTES: &str = r#"[
        {"row_id": 1, "title": "Accounting principles", "block": "accounting_principles", "style": "H0", "always_show": true},
        {"row_id": 10, "title": "Opening cost", "variable_name": "mach_acq_ib", "block": "machinery", "current_amount": 1000, "previous_amount": 800},
        {"row_id": 20, "title": "Purchases", "variable_name": "mach_purchase", "block": "machinery", "toggle_show": true, "current_amount": 0, "previous_amount": 200},
        {"row_id": 30, "title": "Closing cost", "variable_name": "mach_acq_ub", "block": "machinery", "style": "S2"},
        {"row_id": 40, "title": "Book value", "variable_name": "mach_book_value", "block": "machinery", "style": "S1", "current_amount": 1000, "previous_amount": 1000}
    ]"#;

    #[test]
    fn test_parse_figure() {
        assert_eq!(parse_figure("1,234.50"), 1234.5);
        assert_eq!(parse_figure("(500)"), -500.0);
        assert_eq!(parse_figure("\"$42\""), 42.0);
        assert_eq!(parse_figure("12 000 kr"), 12000.0);
        assert_eq!(parse_figure("n/a"), 0.0);
    }

    #[test]
    fn test_read_balance_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balance.csv");
        std::fs::write(
            &path,
            "account_id,current,previous\nmachinery,\"1,000\",950\n# comment\nbuildings,(20),\n",
        )
        .unwrap();
        let sheet = read_balance_sheet(&path).unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.get("machinery", Period::Current), Some(1000));
        assert_eq!(sheet.get("machinery", Period::Previous), Some(950));
        assert_eq!(sheet.get("buildings", Period::Current), Some(-20));
        assert_eq!(sheet.get("buildings", Period::Previous), Some(0));
    }

    #[test]
    fn test_read_items_rejects_empty_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(read_items(&path).is_err());
    }

    #[test]
    fn test_load_file_and_reload() {
        let (dir, conn) = test_db();
        let notes = dir.path().join("notes.json");
        std::fs::write(&notes, NOTES).unwrap();

        let first = load_file(&conn, &notes, None).unwrap();
        assert_eq!(first.blocks, 2);
        assert_eq!(first.rows, 5);
        assert!(!first.unchanged_file);
        assert_eq!(first.reset_blocks.len(), 2);

        let second = load_file(&conn, &notes, None).unwrap();
        assert!(second.unchanged_file);
        assert!(second.reset_blocks.is_empty());

        let notebook = load_notebook(&conn).unwrap();
        assert_eq!(notebook.blocks[0].code, "accounting_principles");
        assert_eq!(notebook.blocks[1].items.len(), 4);
    }

    #[test]
    fn test_load_file_with_balance_sheet() {
        let (dir, conn) = test_db();
        let notes = dir.path().join("notes.json");
        let balance = dir.path().join("balance.csv");
        std::fs::write(&notes, NOTES).unwrap();
        std::fs::write(&balance, "machinery,1000,1000\n").unwrap();

        let result = load_file(&conn, &notes, Some(&balance)).unwrap();
        assert_eq!(result.accounts, 1);
        let notebook = load_notebook(&conn).unwrap();
        assert_eq!(notebook.balance_sheet.get("machinery", Period::Previous), Some(1000));
    }
}
