//! The full note set and its per-block state. Every engine operation goes
//! through here, keyed by block code.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::aggregate::displayed_amount;
use crate::bookvalue::{book_value, BalanceSheet};
use crate::error::{NoterError, Result};
use crate::fmt::parse_amount;
use crate::models::{AccountDetail, Amount, NoteBlock, NoteLineItem, Period, RowStyle};
use crate::numbering::{assign_numbers, NoteLabel, NumberingInput};
use crate::session::{BlockToggles, EditSession, NoteEvent, SessionState};
use crate::signs::SignNotice;
use crate::visibility::visible_indices;

pub fn block_fingerprint(items: &[NoteLineItem]) -> String {
    let mut hasher = Sha256::new();
    for item in items {
        // Serializing plain data into a Vec cannot fail.
        let bytes = serde_json::to_vec(item).unwrap_or_default();
        hasher.update(&bytes);
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Group rows by block code, blocks in order of first appearance.
pub fn group_blocks(items: Vec<NoteLineItem>) -> Vec<NoteBlock> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Vec<NoteLineItem>> = BTreeMap::new();
    for item in items {
        if !grouped.contains_key(&item.block) {
            order.push(item.block.clone());
        }
        grouped.entry(item.block.clone()).or_default().push(item);
    }
    order
        .into_iter()
        .map(|code| {
            let rows = grouped.remove(&code).unwrap_or_default();
            NoteBlock::new(&code, rows)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RenderedRow {
    pub row_id: i64,
    pub title: String,
    pub style: RowStyle,
    pub variable: Option<String>,
    pub current: Amount,
    pub previous: Amount,
    pub editable: bool,
    pub edited: bool,
    pub details: Vec<AccountDetail>,
}

#[derive(Debug, Clone)]
pub struct RenderedBlock {
    pub code: String,
    pub title: String,
    pub label: NoteLabel,
    pub state: SessionState,
    pub toggle_on: bool,
    /// Typed values not yet approved.
    pub has_drafts: bool,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, Default)]
pub struct Notebook {
    pub blocks: Vec<NoteBlock>,
    pub toggles: BTreeMap<String, BlockToggles>,
    pub sessions: BTreeMap<String, EditSession>,
    pub balance_sheet: BalanceSheet,
    pub notices: Vec<SignNotice>,
}

impl Notebook {
    #[cfg(test)]
    pub fn from_items(items: Vec<NoteLineItem>) -> Self {
        let mut notebook = Notebook::default();
        notebook.load(items);
        notebook
    }

    /// Replace the item lists. Blocks whose rows are unchanged keep their
    /// sessions; changed blocks get a fresh baseline; vanished blocks are
    /// dropped.
    pub fn load(&mut self, items: Vec<NoteLineItem>) {
        let blocks = group_blocks(items);
        let mut toggles = BTreeMap::new();
        let mut sessions = BTreeMap::new();
        for block in &blocks {
            let mut session = self.sessions.remove(&block.code).unwrap_or_default();
            if session.load_items(block, &block_fingerprint(&block.items)) {
                debug!(block = %block.code, rows = block.items.len(), "block (re)loaded");
            }
            let toggle = self
                .toggles
                .remove(&block.code)
                .unwrap_or_else(|| BlockToggles::for_block(block));
            sessions.insert(block.code.clone(), session);
            toggles.insert(block.code.clone(), toggle);
        }
        info!(blocks = blocks.len(), "note set loaded");
        self.blocks = blocks;
        self.toggles = toggles;
        self.sessions = sessions;
    }

    pub fn block(&self, code: &str) -> Result<&NoteBlock> {
        self.blocks
            .iter()
            .find(|b| b.code == code)
            .ok_or_else(|| NoterError::UnknownBlock(code.to_string()))
    }

    pub fn session(&self, code: &str) -> Option<&EditSession> {
        self.sessions.get(code)
    }

    pub fn block_toggles(&self, code: &str) -> BlockToggles {
        match (self.toggles.get(code), self.block(code)) {
            (Some(t), _) => t.clone(),
            (None, Ok(block)) => BlockToggles::for_block(block),
            (None, Err(_)) => BlockToggles::default(),
        }
    }

    fn parts_mut(&mut self, code: &str) -> Result<(&NoteBlock, &mut EditSession, &mut BlockToggles)> {
        let block = self
            .blocks
            .iter()
            .find(|b| b.code == code)
            .ok_or_else(|| NoterError::UnknownBlock(code.to_string()))?;
        let session = self.sessions.entry(code.to_string()).or_default();
        let toggles = self
            .toggles
            .entry(code.to_string())
            .or_insert_with(|| BlockToggles::for_block(block));
        Ok((block, session, toggles))
    }

    pub fn start_edit(&mut self, code: &str) -> Result<()> {
        let (block, session, toggles) = self.parts_mut(code)?;
        session.start_edit(block, toggles);
        Ok(())
    }

    /// Take raw user input for a flow. Non-numeric input degrades to 0.
    pub fn commit_draft(&mut self, code: &str, variable: &str, period: Period, input: &str) -> Result<Option<SignNotice>> {
        let raw = parse_amount(input);
        let (block, session, _) = self.parts_mut(code)?;
        let notice = session.commit_draft(block, variable, period, raw)?;
        if let Some(notice) = &notice {
            self.notices.push(notice.clone());
        }
        Ok(notice)
    }

    pub fn approve(&mut self, code: &str) -> Result<NoteEvent> {
        let book = book_value(self.block(code)?, &self.balance_sheet);
        let (block, session, toggles) = self.parts_mut(code)?;
        session.approve(block, toggles, book)
    }

    pub fn cancel(&mut self, code: &str) -> Result<()> {
        let (block, session, toggles) = self.parts_mut(code)?;
        session.cancel(block, toggles);
        Ok(())
    }

    pub fn undo(&mut self, code: &str) -> Result<()> {
        let (block, session, _) = self.parts_mut(code)?;
        session.undo(block);
        Ok(())
    }

    pub fn set_toggle(&mut self, code: &str, on: bool) -> Result<()> {
        let (_, _, toggles) = self.parts_mut(code)?;
        toggles.toggle_on = on;
        Ok(())
    }

    pub fn set_visibility(&mut self, code: &str, on: bool) -> Result<()> {
        let (block, _, toggles) = self.parts_mut(code)?;
        if !block.spec().visibility_toggle {
            return Err(NoterError::Other(format!(
                "Block {code} is always shown when it has content"
            )));
        }
        toggles.visibility_toggle = Some(on);
        Ok(())
    }

    pub fn set_always_show(&mut self, code: &str, on: bool) -> Result<()> {
        let (_, _, toggles) = self.parts_mut(code)?;
        toggles.always_show_note = on;
        Ok(())
    }

    fn visible_rows(&self, block: &NoteBlock) -> Vec<usize> {
        let toggles = self.block_toggles(&block.code);
        match self.sessions.get(&block.code) {
            Some(session) => visible_indices(block.spec(), &session.resolver(block), toggles.toggle_on),
            None => {
                let session = EditSession::default();
                visible_indices(block.spec(), &session.resolver(block), toggles.toggle_on)
            }
        }
    }

    /// Note numbers over all blocks, in traversal order.
    pub fn numbering(&self) -> Vec<(String, NoteLabel)> {
        let inputs: Vec<NumberingInput<'_>> = self
            .blocks
            .iter()
            .map(|block| {
                let toggles = self.block_toggles(&block.code);
                NumberingInput {
                    code: &block.code,
                    spec: block.spec(),
                    has_visible_rows: !self.visible_rows(block).is_empty(),
                    always_show_note: toggles.always_show_note,
                    visibility_toggle: toggles.visibility_toggle,
                }
            })
            .collect();
        assign_numbers(&inputs)
    }

    pub fn label(&self, code: &str) -> NoteLabel {
        self.numbering()
            .into_iter()
            .find(|(c, _)| c == code)
            .map(|(_, label)| label)
            .unwrap_or(NoteLabel::Omitted)
    }

    pub fn render_block(&self, code: &str) -> Result<RenderedBlock> {
        let block = self.block(code)?;
        let default_session = EditSession::default();
        let session = self.sessions.get(code).unwrap_or(&default_session);
        let toggles = self.block_toggles(code);
        let resolver = session.resolver(block);
        let spec = block.spec();
        let visible = visible_indices(spec, &resolver, toggles.toggle_on);

        let rows = visible
            .iter()
            .map(|&index| {
                let item = &block.items[index];
                let variable = item.variable().map(str::to_string);
                let editable = variable.as_deref().is_some_and(|v| spec.is_flow(v))
                    && !item.style.is_boundary();
                let edited = variable.as_deref().is_some_and(|v| {
                    Period::ALL.iter().any(|p| session.edited.get(*p, v).is_some())
                });
                RenderedRow {
                    row_id: item.row_id,
                    title: item.title.clone(),
                    style: item.style,
                    variable,
                    current: displayed_amount(index, spec, &resolver, Period::Current),
                    previous: displayed_amount(index, spec, &resolver, Period::Previous),
                    editable,
                    edited,
                    details: item.account_details.clone(),
                }
            })
            .collect();

        Ok(RenderedBlock {
            code: block.code.clone(),
            title: block.title(),
            label: self.label(code),
            state: session.state,
            toggle_on: toggles.toggle_on,
            has_drafts: !session.edited.is_empty(),
            rows,
        })
    }

    pub fn active_notices(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<&SignNotice> {
        self.notices.iter().filter(|n| !n.is_expired(now, ttl)).collect()
    }

    pub fn prune_notices(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.notices.retain(|n| !n.is_expired(now, ttl));
    }
}
