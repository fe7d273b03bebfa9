use serde::Serialize;

use crate::kinds::KindSpec;

/// First number handed out after the two fixed notes.
const FIRST_FREE_NUMBER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "label", content = "number", rename_all = "snake_case")]
pub enum NoteLabel {
    Numbered(u32),
    /// Heading drawn without a number: the note's "show" switch is off.
    Greyed,
    Omitted,
}

impl NoteLabel {
    pub fn number(&self) -> Option<u32> {
        match self {
            NoteLabel::Numbered(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NumberingInput<'a> {
    pub code: &'a str,
    pub spec: &'static KindSpec,
    pub has_visible_rows: bool,
    pub always_show_note: bool,
    /// `None` when the kind has no "show this note" switch.
    pub visibility_toggle: Option<bool>,
}

/// Number the notes in traversal order. Fixed notes keep their own numbers;
/// everything else that is shown counts up from 3.
pub fn assign_numbers(blocks: &[NumberingInput<'_>]) -> Vec<(String, NoteLabel)> {
    let mut next = FIRST_FREE_NUMBER;
    blocks
        .iter()
        .map(|block| {
            let label = if let Some(fixed) = block.spec.fixed_number {
                NoteLabel::Numbered(fixed)
            } else if block.visibility_toggle == Some(false) {
                NoteLabel::Greyed
            } else if block.has_visible_rows || block.always_show_note {
                let label = NoteLabel::Numbered(next);
                next += 1;
                label
            } else {
                NoteLabel::Omitted
            };
            (block.code.to_string(), label)
        })
        .collect()
}
