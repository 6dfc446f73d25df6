//! End-to-end tests for the deadasm binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn deadasm() -> Command {
    Command::cargo_bin("deadasm").unwrap()
}

const MAIN_AND_HELPER: &str = "\
\t.globl _main
\t.area CODE
_main:
\tld a, #0x01
\tret
_helper:
\tnop
\tret
";

const UNCALLED_GLOBAL: &str = "\
\t.globl _unused
\t.area CODE
_unused:
\tnop
\tret
";

fn write_fixture(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

// ============================================================================
// Argument handling
// ============================================================================

#[test]
fn version_flag_prints_name() {
    deadasm()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadasm"));
}

#[test]
fn missing_inputs_is_a_usage_error() {
    deadasm().assert().failure().code(2);
}

#[test]
fn suffix_and_in_place_conflict() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    deadasm()
        .arg("--in-place")
        .args(["--suffix", "bak"])
        .arg(dir.path().join("a.asm"))
        .assert()
        .failure()
        .code(2);
}

// ============================================================================
// Analysis and rewriting
// ============================================================================

#[test]
fn removes_unused_labels_into_suffixed_copy() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    deadasm()
        .arg(dir.path().join("a.asm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("UNUSED LABELS (1):"))
        .stdout(predicate::str::contains("_helper"));

    // The original is untouched; the suffixed copy has the label removed.
    let original = fs::read_to_string(dir.path().join("a.asm")).unwrap();
    assert_eq!(original, MAIN_AND_HELPER);

    let rewritten = fs::read_to_string(dir.path().join("a.asmrm")).unwrap();
    assert!(rewritten.contains("_main:"));
    assert!(!rewritten.contains("_helper:"));
}

#[test]
fn in_place_overwrites_the_input() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    deadasm()
        .arg("--in-place")
        .arg(dir.path().join("a.asm"))
        .assert()
        .success();

    let rewritten = fs::read_to_string(dir.path().join("a.asm")).unwrap();
    assert!(rewritten.contains("_main:"));
    assert!(!rewritten.contains("_helper:"));
    assert!(!dir.path().join("a.asmrm").exists());
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    deadasm()
        .arg("--dry-run")
        .arg(dir.path().join("a.asm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN] Would rewrite"));

    assert!(!dir.path().join("a.asmrm").exists());
    let original = fs::read_to_string(dir.path().join("a.asm")).unwrap();
    assert_eq!(original, MAIN_AND_HELPER);
}

#[test]
fn orphaned_export_declaration_is_dropped() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);
    write_fixture(dir.path(), "b.asm", UNCALLED_GLOBAL);

    deadasm()
        .arg(dir.path().join("a.asm"))
        .arg(dir.path().join("b.asm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("UNUSED LABELS (2):"));

    let rewritten = fs::read_to_string(dir.path().join("b.asmrm")).unwrap();
    assert!(!rewritten.contains(".globl _unused"));
    assert!(!rewritten.contains("_unused:"));
}

#[test]
fn exclusion_keeps_label_alive() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    deadasm()
        .args(["-x", "_helper"])
        .arg(dir.path().join("a.asm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No unused labels found."));

    let rewritten = fs::read_to_string(dir.path().join("a.asmrm")).unwrap();
    assert!(rewritten.contains("_helper:"));
}

#[test]
fn entry_flag_selects_the_root() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        dir.path(),
        "boot.asm",
        "\t.globl _boot\n\t.area CODE\n_boot:\n\tret\n",
    );

    deadasm()
        .args(["-e", "_boot"])
        .arg(dir.path().join("boot.asm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No unused labels found."));
}

#[test]
fn directory_input_is_expanded() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);
    write_fixture(dir.path(), "b.asm", UNCALLED_GLOBAL);

    deadasm()
        .arg("--dry-run")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 2 file(s)"));
}

// ============================================================================
// Error handling and exit codes
// ============================================================================

#[test]
fn missing_entry_aborts_with_code_one() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        dir.path(),
        "lib.asm",
        "\t.globl _helper\n\t.area CODE\n_helper:\n\tret\n",
    );

    deadasm()
        .arg(dir.path().join("lib.asm"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));

    // Aborted before the rewrite stage: no output file appears.
    assert!(!dir.path().join("lib.asmrm").exists());
}

#[test]
fn unreadable_file_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    deadasm()
        .arg(dir.path().join("a.asm"))
        .arg(dir.path().join("missing.asm"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 unreadable file(s)."));

    assert!(dir.path().join("a.asmrm").exists());
}

#[test]
fn nothing_readable_aborts_with_code_one() {
    let dir = TempDir::new().unwrap();

    deadasm()
        .arg(dir.path().join("missing.asm"))
        .assert()
        .failure()
        .code(1);
}

// ============================================================================
// Output formats and configuration
// ============================================================================

#[test]
fn json_output_carries_the_report() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);

    let output = deadasm()
        .arg("--json")
        .arg(dir.path().join("a.asm"))
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["entry"], "_main");
    assert_eq!(value["files_analyzed"], 1);
    assert_eq!(value["total_labels"], 2);
    assert_eq!(value["used_labels"], 1);
    assert_eq!(value["unused"][0]["name"], "_helper");
    assert_eq!(value["rewrite"]["lines_removed"], 3);
    assert_eq!(value["dry_run"], false);
}

#[test]
fn config_file_supplies_exclusions() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "a.asm", MAIN_AND_HELPER);
    write_fixture(dir.path(), "deadasm.toml", "exclude = [\"_helper\"]\n");

    deadasm()
        .current_dir(dir.path())
        .arg("a.asm")
        .assert()
        .success()
        .stdout(predicate::str::contains("No unused labels found."));
}

#[test]
fn cli_entry_overrides_config_entry() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        dir.path(),
        "boot.asm",
        "\t.globl _boot\n\t.area CODE\n_boot:\n\tret\n",
    );
    write_fixture(dir.path(), "deadasm.toml", "entry = \"_absent\"\n");

    deadasm()
        .current_dir(dir.path())
        .args(["-e", "_boot"])
        .arg("boot.asm")
        .assert()
        .success();
}
