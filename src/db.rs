use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::bookvalue::BalanceSheet;
use crate::error::Result;
use crate::models::{BalanceFigures, NoteLineItem, Period};
use crate::notebook::Notebook;
use crate::resolver::PeriodValues;
use crate::session::{BlockToggles, EditSession, NoteEvent, SessionState};
use crate::signs::SignNotice;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS line_items (
    id INTEGER PRIMARY KEY,
    position INTEGER NOT NULL,
    block TEXT NOT NULL,
    row_id INTEGER NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS balance_accounts (
    account_id TEXT PRIMARY KEY,
    current REAL NOT NULL DEFAULT 0,
    previous REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS block_state (
    block TEXT PRIMARY KEY,
    state TEXT NOT NULL DEFAULT 'viewing',
    toggle_on INTEGER NOT NULL DEFAULT 0,
    visibility_toggle INTEGER,
    always_show_note INTEGER NOT NULL DEFAULT 0,
    fingerprint TEXT
);

CREATE TABLE IF NOT EXISTS block_values (
    block TEXT NOT NULL,
    layer TEXT NOT NULL CHECK (layer IN ('edited', 'committed', 'baseline')),
    period TEXT NOT NULL CHECK (period IN ('current', 'previous')),
    variable TEXT NOT NULL,
    amount INTEGER NOT NULL,
    PRIMARY KEY (block, layer, period, variable)
);

CREATE TABLE IF NOT EXISTS notices (
    id INTEGER PRIMARY KEY,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY,
    block TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .ok()
        .flatten()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

const LAYERS: [&str; 3] = ["edited", "committed", "baseline"];

fn layer<'a>(session: &'a EditSession, name: &str) -> &'a PeriodValues {
    match name {
        "edited" => &session.edited,
        "committed" => &session.committed,
        _ => &session.baseline,
    }
}

fn layer_mut<'a>(session: &'a mut EditSession, name: &str) -> &'a mut PeriodValues {
    match name {
        "edited" => &mut session.edited,
        "committed" => &mut session.committed,
        _ => &mut session.baseline,
    }
}

fn state_str(state: SessionState) -> &'static str {
    match state {
        SessionState::Viewing => "viewing",
        SessionState::Editing => "editing",
    }
}

/// Replace the stored working state with `notebook`. All-or-nothing.
pub fn save_notebook(conn: &Connection, notebook: &Notebook) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM line_items; DELETE FROM balance_accounts; DELETE FROM block_state; \
         DELETE FROM block_values; DELETE FROM notices;",
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO line_items (position, block, row_id, payload) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let items = notebook.blocks.iter().flat_map(|b| b.items.iter());
        for (position, item) in items.enumerate() {
            stmt.execute(rusqlite::params![
                position as i64,
                item.block,
                item.row_id,
                serde_json::to_string(item)?,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO balance_accounts (account_id, current, previous) VALUES (?1, ?2, ?3)",
        )?;
        for (account_id, figures) in &notebook.balance_sheet.accounts {
            stmt.execute(rusqlite::params![account_id, figures.current, figures.previous])?;
        }

        let mut state_stmt = tx.prepare(
            "INSERT INTO block_state (block, state, toggle_on, visibility_toggle, always_show_note, fingerprint) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut value_stmt = tx.prepare(
            "INSERT INTO block_values (block, layer, period, variable, amount) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for block in &notebook.blocks {
            let toggles = notebook.block_toggles(&block.code);
            let default_session = EditSession::default();
            let session = notebook.session(&block.code).unwrap_or(&default_session);
            state_stmt.execute(rusqlite::params![
                block.code,
                state_str(session.state),
                toggles.toggle_on,
                toggles.visibility_toggle,
                toggles.always_show_note,
                session.fingerprint,
            ])?;
            for name in LAYERS {
                for period in Period::ALL {
                    for (variable, amount) in layer(session, name).for_period(period) {
                        value_stmt.execute(rusqlite::params![
                            block.code,
                            name,
                            period.as_str(),
                            variable,
                            amount,
                        ])?;
                    }
                }
            }
        }

        let mut stmt = tx.prepare("INSERT INTO notices (payload) VALUES (?1)")?;
        for notice in &notebook.notices {
            stmt.execute([serde_json::to_string(notice)?])?;
        }
    }

    tx.commit()?;
    Ok(())
}

pub fn load_notebook(conn: &Connection) -> Result<Notebook> {
    let mut stmt = conn.prepare("SELECT payload FROM line_items ORDER BY position")?;
    let payloads: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let items = payloads
        .iter()
        .map(|p| serde_json::from_str::<NoteLineItem>(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut sessions: BTreeMap<String, EditSession> = BTreeMap::new();
    let mut toggles: BTreeMap<String, BlockToggles> = BTreeMap::new();
    let mut stmt = conn.prepare(
        "SELECT block, state, toggle_on, visibility_toggle, always_show_note, fingerprint FROM block_state",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<bool>>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (block, state, toggle_on, visibility_toggle, always_show_note, fingerprint) in rows {
        let state = if state == "editing" {
            SessionState::Editing
        } else {
            SessionState::Viewing
        };
        sessions.insert(
            block.clone(),
            EditSession {
                state,
                fingerprint,
                ..EditSession::default()
            },
        );
        toggles.insert(
            block,
            BlockToggles {
                toggle_on,
                visibility_toggle,
                always_show_note,
            },
        );
    }

    let mut stmt = conn.prepare("SELECT block, layer, period, variable, amount FROM block_values")?;
    let values = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (block, layer_name, period, variable, amount) in values {
        let period: Period = period.parse()?;
        let session = sessions.entry(block).or_default();
        layer_mut(session, &layer_name).set(period, &variable, amount);
    }

    let mut notebook = Notebook {
        sessions,
        toggles,
        ..Notebook::default()
    };
    // Fingerprints match what was saved, so sessions survive the reload.
    notebook.load(items);

    let mut stmt = conn.prepare("SELECT account_id, current, previous FROM balance_accounts")?;
    let accounts = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                BalanceFigures {
                    current: row.get(1)?,
                    previous: row.get(2)?,
                },
            ))
        })?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    notebook.balance_sheet = BalanceSheet { accounts };

    let mut stmt = conn.prepare("SELECT payload FROM notices ORDER BY id")?;
    let notices: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    notebook.notices = notices
        .iter()
        .map(|p| serde_json::from_str::<SignNotice>(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(notebook)
}

pub fn record_event(conn: &Connection, event: &NoteEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO events (block, kind, payload) VALUES (?1, ?2, ?3)",
        rusqlite::params![event.block(), event.kind(), serde_json::to_string(event)?],
    )?;
    Ok(())
}

pub struct EventRecord {
    pub id: i64,
    pub block: String,
    pub kind: String,
    pub payload: String,
    pub created_at: String,
}

pub fn list_events(conn: &Connection, limit: usize) -> Result<Vec<EventRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, block, kind, payload, COALESCE(created_at, '') FROM events ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(EventRecord {
                id: row.get(0)?,
                block: row.get(1)?,
                kind: row.get(2)?,
                payload: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
