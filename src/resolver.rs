use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Amount, NoteLineItem, Period};

/// Variable -> amount, kept separately for each period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodValues {
    pub current: BTreeMap<String, Amount>,
    pub previous: BTreeMap<String, Amount>,
}

impl PeriodValues {
    pub fn for_period(&self, period: Period) -> &BTreeMap<String, Amount> {
        match period {
            Period::Current => &self.current,
            Period::Previous => &self.previous,
        }
    }

    pub fn for_period_mut(&mut self, period: Period) -> &mut BTreeMap<String, Amount> {
        match period {
            Period::Current => &mut self.current,
            Period::Previous => &mut self.previous,
        }
    }

    pub fn get(&self, period: Period, variable: &str) -> Option<Amount> {
        self.for_period(period).get(variable).copied()
    }

    pub fn set(&mut self, period: Period, variable: &str, value: Amount) {
        self.for_period_mut(period).insert(variable.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }

    /// Overlay `other` on top of `self`, entry by entry.
    pub fn merge_from(&mut self, other: &PeriodValues) {
        for period in Period::ALL {
            let target = self.for_period_mut(period);
            for (variable, value) in other.for_period(period) {
                target.insert(variable.clone(), *value);
            }
        }
    }
}

/// Layered lookup: draft edits, then committed overrides, then the parse.
pub struct ValueResolver<'a> {
    items: &'a [NoteLineItem],
    committed: &'a PeriodValues,
    edited: Option<&'a PeriodValues>,
}

impl<'a> ValueResolver<'a> {
    pub fn new(
        items: &'a [NoteLineItem],
        committed: &'a PeriodValues,
        edited: Option<&'a PeriodValues>,
    ) -> Self {
        Self {
            items,
            committed,
            edited,
        }
    }

    pub fn items(&self) -> &'a [NoteLineItem] {
        self.items
    }

    /// Unknown variables resolve to 0 so formulas can name inputs the parse
    /// left out.
    pub fn resolve(&self, variable: &str, period: Period) -> Amount {
        if let Some(value) = self.edited.and_then(|e| e.get(period, variable)) {
            return value;
        }
        if let Some(value) = self.committed.get(period, variable) {
            return value;
        }
        self.original(variable, period)
    }

    pub fn original(&self, variable: &str, period: Period) -> Amount {
        self.items
            .iter()
            .find(|item| item.variable() == Some(variable))
            .map(|item| item.amount(period))
            .unwrap_or(0)
    }

    /// Resolved value of a row; rows without a variable carry their parsed
    /// amount as-is.
    pub fn resolve_row(&self, item: &NoteLineItem, period: Period) -> Amount {
        match item.variable() {
            Some(variable) => self.resolve(variable, period),
            None => item.amount(period),
        }
    }
}
