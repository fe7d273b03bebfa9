use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Amount, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => f.write_str("+"),
            Sign::Minus => f.write_str("-"),
        }
    }
}

// (block, variable, expected sign). Variables not listed are unconstrained.
const SIGN_RULES: &[(&str, &str, Sign)] = &[
    ("inventory", "inv_purchase", Sign::Plus),
    ("inventory", "inv_sale", Sign::Minus),
    ("inventory", "inv_dep_sale", Sign::Plus),
    ("inventory", "inv_dep_current", Sign::Minus),
    ("inventory", "inv_imp_current", Sign::Minus),
    ("inventory", "inv_imp_reversal", Sign::Plus),
    ("inventory", "inv_imp_sale", Sign::Plus),
    ("machinery", "mach_purchase", Sign::Plus),
    ("machinery", "mach_sale", Sign::Minus),
    ("machinery", "mach_dep_sale", Sign::Plus),
    ("machinery", "mach_dep_current", Sign::Minus),
    ("machinery", "mach_imp_current", Sign::Minus),
    ("machinery", "mach_imp_reversal", Sign::Plus),
    ("machinery", "mach_imp_sale", Sign::Plus),
    ("buildings", "bld_purchase", Sign::Plus),
    ("buildings", "bld_sale", Sign::Minus),
    ("buildings", "bld_dep_sale", Sign::Plus),
    ("buildings", "bld_dep_current", Sign::Minus),
    ("buildings", "bld_imp_current", Sign::Minus),
    ("buildings", "bld_imp_reversal", Sign::Plus),
    ("buildings", "bld_imp_sale", Sign::Plus),
    ("buildings", "bld_rev_current", Sign::Plus),
    ("buildings", "bld_rev_dep", Sign::Minus),
    ("buildings", "bld_rev_sale", Sign::Minus),
    ("group_holdings", "grp_purchase", Sign::Plus),
    ("group_holdings", "grp_sale", Sign::Minus),
    ("group_holdings", "grp_shareholder_contribution", Sign::Plus),
    ("group_holdings", "grp_imp_current", Sign::Minus),
    ("group_holdings", "grp_imp_reversal", Sign::Plus),
    ("group_holdings", "grp_imp_sale", Sign::Plus),
    ("group_receivables", "grec_new_loans", Sign::Plus),
    ("group_receivables", "grec_repayments", Sign::Minus),
    ("group_receivables", "grec_imp_current", Sign::Minus),
    ("group_receivables", "grec_imp_reversal", Sign::Plus),
    ("securities", "sec_purchase", Sign::Plus),
    ("securities", "sec_sale", Sign::Minus),
    ("securities", "sec_imp_current", Sign::Minus),
    ("securities", "sec_imp_reversal", Sign::Plus),
    ("securities", "sec_imp_sale", Sign::Plus),
];

pub fn expected_sign(block: &str, variable: &str) -> Option<Sign> {
    SIGN_RULES
        .iter()
        .find(|(b, v, _)| *b == block && *v == variable)
        .map(|(_, _, sign)| *sign)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coerced {
    pub stored: Amount,
    pub forced: bool,
}

pub fn coerce(raw: Amount, rule: Option<Sign>) -> Coerced {
    match rule {
        Some(Sign::Minus) => Coerced {
            stored: -raw.saturating_abs(),
            forced: raw > 0,
        },
        Some(Sign::Plus) => Coerced {
            stored: raw.saturating_abs().max(0),
            forced: raw < 0,
        },
        None => Coerced {
            stored: raw,
            forced: false,
        },
    }
}

/// Advisory raised when typed input had its sign flipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignNotice {
    pub block: String,
    pub variable: String,
    pub period: Period,
    pub expected: Sign,
    pub typed: Amount,
    pub adjusted: Amount,
    pub issued_at: DateTime<Utc>,
}

impl SignNotice {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.issued_at >= ttl
    }

    pub fn message(&self) -> String {
        let expected = match self.expected {
            Sign::Plus => "positive",
            Sign::Minus => "negative",
        };
        format!(
            "{} ({}) is always {expected}: {} was stored as {}",
            self.variable, self.period, self.typed, self.adjusted
        )
    }
}
