//! Per-block edit session: `Viewing -> Editing -> Viewing`, with approve
//! gated on the block reconciling against its book value.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::closing_value;
use crate::error::{NoterError, Result};
use crate::models::{Amount, NoteBlock, Period};
use crate::resolver::{PeriodValues, ValueResolver};
use crate::signs::{coerce, expected_sign, SignNotice};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Viewing,
    Editing,
}

/// User switches for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockToggles {
    /// "Show all rows": reveals zero rows flagged `toggle_show`.
    pub toggle_on: bool,
    /// "Show this note". Only kinds that declare the switch carry one.
    pub visibility_toggle: Option<bool>,
    pub always_show_note: bool,
}

impl BlockToggles {
    pub fn for_block(block: &NoteBlock) -> Self {
        Self {
            toggle_on: false,
            visibility_toggle: block.spec().visibility_toggle.then_some(false),
            always_show_note: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookValue {
    pub current: Amount,
    pub previous: Amount,
}

impl BookValue {
    pub fn get(&self, period: Period) -> Amount {
        match period {
            Period::Current => self.current,
            Period::Previous => self.previous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub delta_current: Amount,
    pub delta_previous: Amount,
    pub is_mismatch: bool,
}

impl ReconciliationResult {
    /// Deltas are computed minus book value.
    pub fn new(computed: BookValue, book: BookValue) -> Self {
        let delta_current = computed.current - book.current;
        let delta_previous = computed.previous - book.previous;
        Self {
            delta_current,
            delta_previous,
            is_mismatch: delta_current != 0 || delta_previous != 0,
        }
    }

    pub fn mismatched_periods(&self) -> Vec<Period> {
        let mut periods = Vec::new();
        if self.delta_current != 0 {
            periods.push(Period::Current);
        }
        if self.delta_previous != 0 {
            periods.push(Period::Previous);
        }
        periods
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NoteEvent {
    Committed {
        block: String,
        committed_current: std::collections::BTreeMap<String, Amount>,
        committed_previous: std::collections::BTreeMap<String, Amount>,
    },
    Mismatch {
        block: String,
        periods: Vec<Period>,
        delta_current: Amount,
        delta_previous: Amount,
    },
    SignAdjusted(SignNotice),
}

impl NoteEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NoteEvent::Committed { .. } => "committed",
            NoteEvent::Mismatch { .. } => "mismatch",
            NoteEvent::SignAdjusted(_) => "sign_adjusted",
        }
    }

    pub fn block(&self) -> &str {
        match self {
            NoteEvent::Committed { block, .. } | NoteEvent::Mismatch { block, .. } => block,
            NoteEvent::SignAdjusted(notice) => &notice.block,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    pub state: SessionState,
    /// Uncommitted drafts. Only flow variables ever land here.
    pub edited: PeriodValues,
    /// Approved overrides; survive cancel, reset by undo or a new load.
    pub committed: PeriodValues,
    /// Flow values of the item list as first loaded; the undo target.
    pub baseline: PeriodValues,
    /// Identity of the item list the baseline was taken from.
    pub fingerprint: Option<String>,
}

impl EditSession {
    /// Attach the session to an item list. A list with a new fingerprint
    /// recaptures the baseline and drops all overrides; the same list again is
    /// a no-op. Returns whether a new baseline was taken.
    pub fn load_items(&mut self, block: &NoteBlock, fingerprint: &str) -> bool {
        if self.fingerprint.as_deref() == Some(fingerprint) {
            return false;
        }
        let no_overrides = PeriodValues::default();
        let parsed = ValueResolver::new(&block.items, &no_overrides, None);
        let mut baseline = PeriodValues::default();
        for variable in block.flow_variables() {
            for period in Period::ALL {
                baseline.set(period, variable, parsed.original(variable, period));
            }
        }
        *self = EditSession {
            state: SessionState::Viewing,
            edited: PeriodValues::default(),
            committed: PeriodValues::default(),
            baseline,
            fingerprint: Some(fingerprint.to_string()),
        };
        debug!(block = %block.code, fingerprint, "captured baseline");
        true
    }

    pub fn is_editing(&self) -> bool {
        self.state == SessionState::Editing
    }

    pub fn resolver<'a>(&'a self, block: &'a NoteBlock) -> ValueResolver<'a> {
        ValueResolver::new(&block.items, &self.committed, Some(&self.edited))
    }

    pub fn start_edit(&mut self, block: &NoteBlock, toggles: &mut BlockToggles) {
        self.state = SessionState::Editing;
        toggles.toggle_on = true;
        info!(block = %block.code, "editing");
    }

    /// Store a draft value after sign enforcement. Returns the advisory when
    /// the sign had to be flipped.
    pub fn commit_draft(
        &mut self,
        block: &NoteBlock,
        variable: &str,
        period: Period,
        raw: Amount,
    ) -> Result<Option<SignNotice>> {
        if !self.is_editing() {
            return Err(NoterError::NotEditing(block.code.clone()));
        }
        if !block.has_variable(variable) {
            return Err(NoterError::UnknownVariable {
                block: block.code.clone(),
                variable: variable.to_string(),
            });
        }
        if !block.spec().is_flow(variable) {
            return Err(NoterError::NotEditable {
                variable: variable.to_string(),
            });
        }

        let rule = expected_sign(&block.code, variable);
        let coerced = coerce(raw, rule);
        self.edited.set(period, variable, coerced.stored);

        let notice = match rule {
            Some(expected) if coerced.forced => {
                info!(
                    block = %block.code,
                    variable,
                    %period,
                    typed = raw,
                    stored = coerced.stored,
                    "sign adjusted"
                );
                Some(SignNotice {
                    block: block.code.clone(),
                    variable: variable.to_string(),
                    period,
                    expected,
                    typed: raw,
                    adjusted: coerced.stored,
                    issued_at: Utc::now(),
                })
            }
            _ => None,
        };
        Ok(notice)
    }

    /// Recompute the block from drafts, committed and parsed values, and
    /// compare it with `book`. A mismatch leaves every field untouched.
    /// Which rows are on screen plays no part in the result.
    pub fn reconcile(&self, block: &NoteBlock, book: BookValue) -> ReconciliationResult {
        let resolver = self.resolver(block);
        let spec = block.spec();
        let computed = BookValue {
            current: closing_value(spec, &resolver, Period::Current).total,
            previous: closing_value(spec, &resolver, Period::Previous).total,
        };
        ReconciliationResult::new(computed, book)
    }

    /// `book` is ignored for kinds without a book value; those always commit.
    pub fn approve(
        &mut self,
        block: &NoteBlock,
        toggles: &mut BlockToggles,
        book: Option<BookValue>,
    ) -> Result<NoteEvent> {
        if !self.is_editing() {
            return Err(NoterError::NotEditing(block.code.clone()));
        }

        if let (true, Some(book)) = (block.spec().has_book_value(), book) {
            let result = self.reconcile(block, book);
            if result.is_mismatch {
                info!(
                    block = %block.code,
                    delta_current = result.delta_current,
                    delta_previous = result.delta_previous,
                    "approve rejected: book value mismatch"
                );
                return Ok(NoteEvent::Mismatch {
                    block: block.code.clone(),
                    periods: result.mismatched_periods(),
                    delta_current: result.delta_current,
                    delta_previous: result.delta_previous,
                });
            }
        }

        self.committed.merge_from(&self.edited);
        self.edited.clear();
        self.state = SessionState::Viewing;
        toggles.toggle_on = false;
        info!(block = %block.code, "approved");

        Ok(NoteEvent::Committed {
            block: block.code.clone(),
            committed_current: self.committed.current.clone(),
            committed_previous: self.committed.previous.clone(),
        })
    }

    pub fn cancel(&mut self, block: &NoteBlock, toggles: &mut BlockToggles) {
        self.edited.clear();
        self.state = SessionState::Viewing;
        toggles.toggle_on = false;
        info!(block = %block.code, "edit cancelled");
    }

    /// Drop drafts and put every flow back to its baseline. The state is left
    /// as it was.
    pub fn undo(&mut self, block: &NoteBlock) {
        self.edited.clear();
        self.committed = self.baseline.clone();
        info!(block = %block.code, "reverted to baseline");
    }
}
