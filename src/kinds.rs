//! Per-kind configuration table: which flows roll into which closing balance,
//! which balance-sheet accounts a block reconciles against, and how a block is
//! numbered. Every block editor runs off one of these entries.

use serde::{Deserialize, Serialize};

/// One closing balance: opening balance plus a fixed set of flows.
#[derive(Debug, Clone, Copy)]
pub struct SubFormula {
    pub name: &'static str,
    /// Variable of the S2 row that displays this closing balance.
    pub closing: &'static str,
    pub opening: &'static str,
    pub flows: &'static [&'static str],
}

impl SubFormula {
    pub fn inputs(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.opening).chain(self.flows.iter().copied())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    pub kind: BlockKind,
    pub code: &'static str,
    pub title: &'static str,
    pub formulas: &'static [SubFormula],
    /// Row holding the parsed book value; never editable.
    pub book_value_variable: Option<&'static str>,
    /// Balance-sheet accounts to reconcile against, best match first.
    pub book_value_accounts: &'static [&'static str],
    pub fixed_number: Option<u32>,
    /// Block carries a "show this note" switch that starts off.
    pub visibility_toggle: bool,
}

impl KindSpec {
    pub fn has_book_value(&self) -> bool {
        self.book_value_variable.is_some()
    }

    /// Flows are everything that moves within a period: not an opening
    /// (`_ib`) or closing (`_ub`) balance, and not the book value itself.
    pub fn is_flow(&self, variable: &str) -> bool {
        !variable.ends_with("_ib")
            && !variable.ends_with("_ub")
            && Some(variable) != self.book_value_variable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    AccountingPrinciples,
    AverageEmployees,
    Inventory,
    Buildings,
    Machinery,
    GroupHoldings,
    GroupReceivables,
    Securities,
    ContingentLiabilities,
    PledgedAssets,
    Generic,
}

impl BlockKind {
    pub fn from_code(code: &str) -> BlockKind {
        KINDS
            .iter()
            .find(|spec| spec.code == code)
            .map(|spec| spec.kind)
            .unwrap_or(BlockKind::Generic)
    }

    pub fn spec(self) -> &'static KindSpec {
        KINDS
            .iter()
            .find(|spec| spec.kind == self)
            .unwrap_or(&GENERIC)
    }
}

const DEPRECIABLE_INVENTORY: &[SubFormula] = &[
    SubFormula {
        name: "Accumulated acquisition cost",
        closing: "inv_acq_ub",
        opening: "inv_acq_ib",
        flows: &["inv_purchase", "inv_sale", "inv_reclass"],
    },
    SubFormula {
        name: "Accumulated depreciation",
        closing: "inv_dep_ub",
        opening: "inv_dep_ib",
        flows: &["inv_dep_sale", "inv_dep_current", "inv_dep_reclass"],
    },
    SubFormula {
        name: "Accumulated impairment",
        closing: "inv_imp_ub",
        opening: "inv_imp_ib",
        flows: &["inv_imp_current", "inv_imp_reversal", "inv_imp_sale"],
    },
];

const DEPRECIABLE_MACHINERY: &[SubFormula] = &[
    SubFormula {
        name: "Accumulated acquisition cost",
        closing: "mach_acq_ub",
        opening: "mach_acq_ib",
        flows: &["mach_purchase", "mach_sale", "mach_reclass"],
    },
    SubFormula {
        name: "Accumulated depreciation",
        closing: "mach_dep_ub",
        opening: "mach_dep_ib",
        flows: &["mach_dep_sale", "mach_dep_current", "mach_dep_reclass"],
    },
    SubFormula {
        name: "Accumulated impairment",
        closing: "mach_imp_ub",
        opening: "mach_imp_ib",
        flows: &["mach_imp_current", "mach_imp_reversal", "mach_imp_sale"],
    },
];

const DEPRECIABLE_BUILDINGS: &[SubFormula] = &[
    SubFormula {
        name: "Accumulated acquisition cost",
        closing: "bld_acq_ub",
        opening: "bld_acq_ib",
        flows: &["bld_purchase", "bld_sale", "bld_reclass"],
    },
    SubFormula {
        name: "Accumulated depreciation",
        closing: "bld_dep_ub",
        opening: "bld_dep_ib",
        flows: &["bld_dep_sale", "bld_dep_current", "bld_dep_reclass"],
    },
    SubFormula {
        name: "Accumulated impairment",
        closing: "bld_imp_ub",
        opening: "bld_imp_ib",
        flows: &["bld_imp_current", "bld_imp_reversal", "bld_imp_sale"],
    },
    SubFormula {
        name: "Accumulated revaluation",
        closing: "bld_rev_ub",
        opening: "bld_rev_ib",
        flows: &["bld_rev_current", "bld_rev_dep", "bld_rev_sale"],
    },
];

const FINANCIAL_GROUP_HOLDINGS: &[SubFormula] = &[
    SubFormula {
        name: "Accumulated acquisition cost",
        closing: "grp_acq_ub",
        opening: "grp_acq_ib",
        flows: &["grp_purchase", "grp_sale", "grp_shareholder_contribution", "grp_reclass"],
    },
    SubFormula {
        name: "Accumulated impairment",
        closing: "grp_imp_ub",
        opening: "grp_imp_ib",
        flows: &["grp_imp_current", "grp_imp_reversal", "grp_imp_sale"],
    },
];

const FINANCIAL_GROUP_RECEIVABLES: &[SubFormula] = &[
    SubFormula {
        name: "Accumulated acquisition cost",
        closing: "grec_acq_ub",
        opening: "grec_acq_ib",
        flows: &["grec_new_loans", "grec_repayments", "grec_reclass"],
    },
    SubFormula {
        name: "Accumulated impairment",
        closing: "grec_imp_ub",
        opening: "grec_imp_ib",
        flows: &["grec_imp_current", "grec_imp_reversal"],
    },
];

const FINANCIAL_SECURITIES: &[SubFormula] = &[
    SubFormula {
        name: "Accumulated acquisition cost",
        closing: "sec_acq_ub",
        opening: "sec_acq_ib",
        flows: &["sec_purchase", "sec_sale", "sec_reclass"],
    },
    SubFormula {
        name: "Accumulated impairment",
        closing: "sec_imp_ub",
        opening: "sec_imp_ib",
        flows: &["sec_imp_current", "sec_imp_reversal", "sec_imp_sale"],
    },
];

const GENERIC: KindSpec = KindSpec {
    kind: BlockKind::Generic,
    code: "",
    title: "Other",
    formulas: &[],
    book_value_variable: None,
    book_value_accounts: &[],
    fixed_number: None,
    visibility_toggle: false,
};

pub const KINDS: &[KindSpec] = &[
    KindSpec {
        kind: BlockKind::AccountingPrinciples,
        code: "accounting_principles",
        title: "Accounting principles",
        formulas: &[],
        book_value_variable: None,
        book_value_accounts: &[],
        fixed_number: Some(1),
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::AverageEmployees,
        code: "average_employees",
        title: "Average number of employees",
        formulas: &[],
        book_value_variable: None,
        book_value_accounts: &[],
        fixed_number: Some(2),
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::Inventory,
        code: "inventory",
        title: "Fixtures, tools and installations",
        formulas: DEPRECIABLE_INVENTORY,
        book_value_variable: Some("inv_book_value"),
        book_value_accounts: &["fixtures_tools_installations", "equipment"],
        fixed_number: None,
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::Buildings,
        code: "buildings",
        title: "Buildings and land",
        formulas: DEPRECIABLE_BUILDINGS,
        book_value_variable: Some("bld_book_value"),
        book_value_accounts: &["buildings_and_land", "buildings"],
        fixed_number: None,
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::Machinery,
        code: "machinery",
        title: "Machinery and other technical plant",
        formulas: DEPRECIABLE_MACHINERY,
        book_value_variable: Some("mach_book_value"),
        book_value_accounts: &["machinery_and_technical_plant", "machinery"],
        fixed_number: None,
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::GroupHoldings,
        code: "group_holdings",
        title: "Participations in group companies",
        formulas: FINANCIAL_GROUP_HOLDINGS,
        book_value_variable: Some("grp_book_value"),
        book_value_accounts: &["shares_in_group_companies"],
        fixed_number: None,
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::GroupReceivables,
        code: "group_receivables",
        title: "Receivables from group companies",
        formulas: FINANCIAL_GROUP_RECEIVABLES,
        book_value_variable: Some("grec_book_value"),
        book_value_accounts: &["long_term_receivables_group", "receivables_group_companies"],
        fixed_number: None,
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::Securities,
        code: "securities",
        title: "Other long-term securities",
        formulas: FINANCIAL_SECURITIES,
        book_value_variable: Some("sec_book_value"),
        book_value_accounts: &["other_long_term_securities"],
        fixed_number: None,
        visibility_toggle: false,
    },
    KindSpec {
        kind: BlockKind::ContingentLiabilities,
        code: "contingent_liabilities",
        title: "Contingent liabilities",
        formulas: &[],
        book_value_variable: None,
        book_value_accounts: &[],
        fixed_number: None,
        visibility_toggle: true,
    },
    KindSpec {
        kind: BlockKind::PledgedAssets,
        code: "pledged_assets",
        title: "Pledged assets",
        formulas: &[],
        book_value_variable: None,
        book_value_accounts: &[],
        fixed_number: None,
        visibility_toggle: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(BlockKind::from_code("machinery"), BlockKind::Machinery);
        assert_eq!(BlockKind::from_code("pledged_assets"), BlockKind::PledgedAssets);
        assert_eq!(BlockKind::from_code("something_else"), BlockKind::Generic);
        assert_eq!(BlockKind::Generic.spec().code, "");
    }

    #[test]
    fn test_exactly_two_fixed_kinds() {
        let mut fixed: Vec<u32> = KINDS.iter().filter_map(|k| k.fixed_number).collect();
        fixed.sort();
        assert_eq!(fixed, vec![1, 2]);
    }

    #[test]
    fn test_flow_classification() {
        let spec = BlockKind::Machinery.spec();
        assert!(spec.is_flow("mach_purchase"));
        assert!(spec.is_flow("mach_dep_current"));
        assert!(!spec.is_flow("mach_acq_ib"));
        assert!(!spec.is_flow("mach_acq_ub"));
        assert!(!spec.is_flow("mach_book_value"));
    }

    #[test]
    fn test_formula_tables_are_consistent() {
        for spec in KINDS {
            for formula in spec.formulas {
                assert!(formula.closing.ends_with("_ub"), "{}: {}", spec.code, formula.closing);
                assert!(formula.opening.ends_with("_ib"), "{}: {}", spec.code, formula.opening);
                for flow in formula.flows {
                    assert!(spec.is_flow(flow), "{}: {flow} should be a flow", spec.code);
                }
            }
            assert_eq!(spec.has_book_value(), !spec.formulas.is_empty(), "{}", spec.code);
        }
    }

    #[test]
    fn test_only_off_balance_kinds_have_visibility_toggle() {
        let toggled: Vec<BlockKind> = KINDS
            .iter()
            .filter(|k| k.visibility_toggle)
            .map(|k| k.kind)
            .collect();
        assert_eq!(
            toggled,
            vec![BlockKind::ContingentLiabilities, BlockKind::PledgedAssets]
        );
        for kind in toggled {
            assert!(!kind.spec().has_book_value());
        }
    }
}
