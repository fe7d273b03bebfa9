use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NoterError;
use crate::kinds::{BlockKind, KindSpec};

/// Whole currency units. Parsed amounts are rounded into this on load.
pub type Amount = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Current,
    Previous,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::Current, Period::Previous];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Current => "current",
            Period::Previous => "previous",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Period {
    type Err = NoterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Period::Current),
            "previous" => Ok(Period::Previous),
            other => Err(NoterError::Other(format!("Unknown period: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleFamily {
    Normal,
    Heading(u8),
    Subtotal(u8),
}

/// Row style as emitted by the parser: `NORMAL`, `H0`..`H3`, `S1`..`S3`, and
/// the tabbed `T`-prefixed variants of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RowStyle {
    pub family: StyleFamily,
    pub tabbed: bool,
}

impl RowStyle {
    pub const NORMAL: RowStyle = RowStyle {
        family: StyleFamily::Normal,
        tabbed: false,
    };

    pub fn heading(level: u8) -> Self {
        Self {
            family: StyleFamily::Heading(level),
            tabbed: false,
        }
    }

    pub fn subtotal(level: u8) -> Self {
        Self {
            family: StyleFamily::Subtotal(level),
            tabbed: false,
        }
    }

    pub fn tabbed(self) -> Self {
        Self {
            tabbed: true,
            ..self
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.family, StyleFamily::Heading(_))
    }

    pub fn is_subtotal(&self) -> bool {
        matches!(self.family, StyleFamily::Subtotal(_))
    }

    /// S2/TS2 rows sum the section above them.
    pub fn is_section_sum(&self) -> bool {
        self.family == StyleFamily::Subtotal(2)
    }

    pub fn is_content(&self) -> bool {
        self.family == StyleFamily::Normal
    }

    /// Headings and subtotals both close a section.
    pub fn is_boundary(&self) -> bool {
        self.is_heading() || self.is_subtotal()
    }
}

impl Default for RowStyle {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for RowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tabbed {
            f.write_str("T")?;
        }
        match self.family {
            StyleFamily::Normal => f.write_str("NORMAL"),
            StyleFamily::Heading(level) => write!(f, "H{level}"),
            StyleFamily::Subtotal(level) => write!(f, "S{level}"),
        }
    }
}

impl FromStr for RowStyle {
    type Err = NoterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_uppercase();
        let (tabbed, rest) = match upper.strip_prefix('T') {
            Some(rest) => (true, rest),
            None => (false, upper.as_str()),
        };
        let family = match rest {
            "NORMAL" => StyleFamily::Normal,
            "" if !tabbed => StyleFamily::Normal,
            "H0" | "H1" | "H2" | "H3" => StyleFamily::Heading(rest.as_bytes()[1] - b'0'),
            "S1" | "S2" | "S3" => StyleFamily::Subtotal(rest.as_bytes()[1] - b'0'),
            _ => return Err(NoterError::InvalidStyle(raw.to_string())),
        };
        Ok(Self { family, tabbed })
    }
}

impl TryFrom<String> for RowStyle {
    type Error = NoterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RowStyle> for String {
    fn from(style: RowStyle) -> Self {
        style.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub account_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub balance: f64,
}

/// One parsed row of a note schedule. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteLineItem {
    pub row_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub variable_name: Option<String>,
    pub block: String,
    #[serde(default)]
    pub style: RowStyle,
    #[serde(default)]
    pub always_show: Option<bool>,
    #[serde(default)]
    pub toggle_show: bool,
    #[serde(default)]
    pub current_amount: Option<f64>,
    #[serde(default)]
    pub previous_amount: Option<f64>,
    #[serde(default)]
    pub account_details: Vec<AccountDetail>,
}

impl NoteLineItem {
    pub fn variable(&self) -> Option<&str> {
        self.variable_name.as_deref().filter(|v| !v.is_empty())
    }

    /// Parsed amount for `period`, rounded to whole units.
    pub fn amount(&self, period: Period) -> Amount {
        let raw = match period {
            Period::Current => self.current_amount,
            Period::Previous => self.previous_amount,
        };
        raw.map(round_amount).unwrap_or(0)
    }
}

pub fn round_amount(value: f64) -> Amount {
    if value.is_finite() {
        value.round() as Amount
    } else {
        0
    }
}

/// Rows sharing one `block` code, sorted by `row_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteBlock {
    pub code: String,
    pub kind: BlockKind,
    pub items: Vec<NoteLineItem>,
}

impl NoteBlock {
    pub fn new(code: &str, mut items: Vec<NoteLineItem>) -> Self {
        items.sort_by_key(|item| item.row_id);
        Self {
            code: code.to_string(),
            kind: BlockKind::from_code(code),
            items,
        }
    }

    pub fn spec(&self) -> &'static KindSpec {
        self.kind.spec()
    }

    pub fn title(&self) -> String {
        match self.kind {
            BlockKind::Generic => self
                .items
                .iter()
                .find(|item| item.style.is_heading())
                .map(|item| item.title.clone())
                .unwrap_or_else(|| self.code.clone()),
            kind => kind.spec().title.to_string(),
        }
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        self.items.iter().any(|item| item.variable() == Some(variable))
    }

    /// Editable variables present in the block, in row order.
    pub fn flow_variables(&self) -> impl Iterator<Item = &str> {
        let spec = self.spec();
        self.items
            .iter()
            .filter_map(|item| item.variable())
            .filter(move |variable| spec.is_flow(variable))
    }
}

/// Figures for one balance-sheet account, both periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceFigures {
    pub current: f64,
    pub previous: f64,
}

impl BalanceFigures {
    pub fn get(&self, period: Period) -> Amount {
        match period {
            Period::Current => round_amount(self.current),
            Period::Previous => round_amount(self.previous),
        }
    }
}
