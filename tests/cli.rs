use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const NOTES: &str = r#"[
    {"row_id": 1, "title": "Accounting principles", "block": "accounting_principles", "style": "H0", "always_show": true},
    {"row_id": 2, "title": "Valuation at cost", "block": "accounting_principles", "always_show": true},
    {"row_id": 10, "title": "Acquisition value", "block": "machinery", "style": "H1"},
    {"row_id": 20, "title": "Opening cost", "variable_name": "mach_acq_ib", "block": "machinery", "current_amount": 1000, "previous_amount": 1000},
    {"row_id": 30, "title": "Purchases", "variable_name": "mach_purchase", "block": "machinery", "toggle_show": true},
    {"row_id": 40, "title": "Sales", "variable_name": "mach_sale", "block": "machinery", "toggle_show": true},
    {"row_id": 50, "title": "Reclassification", "variable_name": "mach_reclass", "block": "machinery", "toggle_show": true},
    {"row_id": 60, "title": "Closing cost", "variable_name": "mach_acq_ub", "block": "machinery", "style": "S2", "current_amount": 1000, "previous_amount": 1000},
    {"row_id": 70, "title": "Depreciation", "block": "machinery", "style": "H1"},
    {"row_id": 80, "title": "Opening depreciation", "variable_name": "mach_dep_ib", "block": "machinery", "current_amount": -400, "previous_amount": -400},
    {"row_id": 90, "title": "Reversed on sales", "variable_name": "mach_dep_sale", "block": "machinery", "toggle_show": true},
    {"row_id": 100, "title": "Depreciation for the year", "variable_name": "mach_dep_current", "block": "machinery", "toggle_show": true},
    {"row_id": 110, "title": "Reclassification", "variable_name": "mach_dep_reclass", "block": "machinery", "toggle_show": true},
    {"row_id": 120, "title": "Closing depreciation", "variable_name": "mach_dep_ub", "block": "machinery", "style": "S2", "current_amount": -400, "previous_amount": -400},
    {"row_id": 190, "title": "Book value", "variable_name": "mach_book_value", "block": "machinery", "style": "S1", "current_amount": 600, "previous_amount": 600,
     "account_details": [{"account_id": "1210", "text": "Machinery", "balance": 600}]}
]"#;

const BALANCE: &str = "account_id,current,previous\nmachinery,600,600\n";

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.home.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("noter").unwrap();
        cmd.env("HOME", self.path())
            .env("NO_COLOR", "1")
            .env("CLICOLOR", "0")
            .env_remove("RUST_LOG");
        cmd
    }

    /// init + load with the fixture files.
    fn loaded() -> Self {
        let env = Self::new();
        let data_dir = env.path().join("data");
        env.cmd()
            .args(["init", "--data-dir", data_dir.to_str().unwrap(), "--fiscal-year", "2025"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized noter"));

        let notes = env.path().join("notes.json");
        let balance = env.path().join("balance.csv");
        std::fs::write(&notes, NOTES).unwrap();
        std::fs::write(&balance, BALANCE).unwrap();
        env.cmd()
            .args(["load", notes.to_str().unwrap(), "--balance", balance.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Loaded 15 rows in 2 blocks"))
            .stdout(predicate::str::contains("Balance sheet: 1 accounts"));
        env
    }
}

#[test]
fn test_commands_require_init() {
    let env = Env::new();
    env.cmd()
        .args(["show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("noter init"));
}

#[test]
fn test_status_before_init() {
    let env = Env::new();
    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
}

#[test]
fn test_show_lists_numbered_notes() {
    let env = Env::loaded();
    env.cmd()
        .args(["show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accounting_principles"))
        .stdout(predicate::str::contains("machinery"))
        .stdout(predicate::str::contains("Machinery"));
}

#[test]
fn test_show_block_hides_zero_toggle_rows() {
    let env = Env::loaded();
    env.cmd()
        .args(["show", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note 3: Machinery"))
        .stdout(predicate::str::contains("Opening cost"))
        .stdout(predicate::str::contains("Purchases").not())
        .stdout(predicate::str::contains("2024"));

    env.cmd().args(["toggle", "machinery", "on"]).assert().success();
    env.cmd()
        .args(["show", "machinery", "--details"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Purchases"))
        .stdout(predicate::str::contains("1210 Machinery"));
}

#[test]
fn test_edit_mismatch_then_approve() {
    let env = Env::loaded();
    env.cmd().args(["edit", "machinery"]).assert().success();
    env.cmd()
        .args(["set", "machinery", "mach_purchase", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mach_purchase (current) = 200"));

    // 1000 + 200 - 400 = 800 against a book value of 600
    env.cmd()
        .args(["approve", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MISMATCH"))
        .stdout(predicate::str::contains("difference 200"));

    env.cmd()
        .args(["set", "machinery", "mach_dep_current", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored as -200"));

    env.cmd()
        .args(["approve", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approved machinery"));

    env.cmd()
        .args(["show", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("viewing"))
        .stdout(predicate::str::contains("1,200"));

    env.cmd()
        .args(["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("committed"))
        .stdout(predicate::str::contains("mismatch"))
        .stdout(predicate::str::contains("sign_adjusted"));
}

#[test]
fn test_set_without_edit_fails() {
    let env = Env::loaded();
    env.cmd()
        .args(["set", "machinery", "mach_purchase", "200"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not being edited"));
}

#[test]
fn test_set_balance_row_fails() {
    let env = Env::loaded();
    env.cmd().args(["edit", "machinery"]).assert().success();
    env.cmd()
        .args(["set", "machinery", "mach_acq_ib", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be edited"));
}

#[test]
fn test_cancel_and_undo() {
    let env = Env::loaded();
    env.cmd().args(["edit", "machinery"]).assert().success();
    env.cmd()
        .args(["set", "machinery", "mach_reclass", "-50", "--previous"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(previous) = -50"));
    env.cmd().args(["cancel", "machinery"]).assert().success();
    env.cmd()
        .args(["approve", "machinery"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not being edited"));
    env.cmd()
        .args(["undo", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reverted machinery"));
}

#[test]
fn test_visibility_switch_rejected_for_plain_kinds() {
    let env = Env::loaded();
    env.cmd()
        .args(["visibility", "machinery", "on"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("always shown"));
    env.cmd()
        .args(["show", "no_such_block"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown block"));
}

#[test]
fn test_reload_unchanged_file_keeps_edits() {
    let env = Env::loaded();
    env.cmd().args(["edit", "machinery"]).assert().success();
    env.cmd()
        .args(["set", "machinery", "mach_purchase", "75"])
        .assert()
        .success();

    let notes = env.path().join("notes.json");
    env.cmd()
        .args(["load", notes.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("edits kept"));
    env.cmd()
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Editing:       machinery"));
    env.cmd()
        .args(["show", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unapproved edits"));
}

#[test]
fn test_approve_result_does_not_depend_on_show_all() {
    let env = Env::loaded();
    env.cmd().args(["edit", "machinery"]).assert().success();
    env.cmd()
        .args(["set", "machinery", "mach_purchase", "200.4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mach_purchase (current) = 200"));
    env.cmd().args(["toggle", "machinery", "off"]).assert().success();
    env.cmd()
        .args(["approve", "machinery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("difference 200"));
}
