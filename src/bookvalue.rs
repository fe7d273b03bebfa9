use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Amount, BalanceFigures, NoteBlock, Period};
use crate::resolver::{PeriodValues, ValueResolver};
use crate::session::BookValue;

/// Balance-sheet figures keyed by account identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub accounts: BTreeMap<String, BalanceFigures>,
}

impl BalanceSheet {
    pub fn insert(&mut self, account_id: &str, figures: BalanceFigures) {
        self.accounts.insert(account_id.to_string(), figures);
    }

    pub fn get(&self, account_id: &str, period: Period) -> Option<Amount> {
        self.accounts.get(account_id).map(|f| f.get(period))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn lookup(block: &NoteBlock, sheet: &BalanceSheet, period: Period, fallback: &str) -> Amount {
    block
        .spec()
        .book_value_accounts
        .iter()
        .filter_map(|account| sheet.get(account, period))
        .find(|amount| *amount != 0)
        .unwrap_or_else(|| {
            let empty = PeriodValues::default();
            ValueResolver::new(&block.items, &empty, None).original(fallback, period)
        })
}

/// The figure a block must reconcile to: the first candidate account with a
/// non-zero balance, else the block's own parsed book-value row. `None` for
/// kinds without a book value.
pub fn book_value(block: &NoteBlock, sheet: &BalanceSheet) -> Option<BookValue> {
    let variable = block.spec().book_value_variable?;
    Some(BookValue {
        current: lookup(block, sheet, Period::Current, variable),
        previous: lookup(block, sheet, Period::Previous, variable),
    })
}
