use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn otf() -> Command {
    Command::cargo_bin("otf").unwrap()
}

fn sample_character() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../engine/content/characters/sample_fighter.json")
}

fn temp_bucket(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("otf-cli-{}-{name}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn parse_prints_span_and_action() {
    otf()
        .args(["parse", "[+2 aim]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("glinkmodplus"))
        .stdout(predicate::str::contains(r#""type": "modifier""#));
}

#[test]
fn parse_passes_plain_text_through() {
    otf()
        .args(["parse", "hello world"])
        .assert()
        .success()
        .stdout("hello world\n");
}

#[test]
fn link_renders_spans_in_prose() {
    otf()
        .args(["link", "Then [Dodge] or [run away]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<span class='gurpslink'"))
        .stdout(predicate::str::contains("[run away]"));
}

#[test]
fn check_rolls_against_target() {
    otf()
        .args(["check", "--target", "12", "--modifier", "-2", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3d6 (12)"))
        .stdout(predicate::str::contains("New Target: (10)"))
        .stdout(predicate::str::contains("Rolled"));
}

#[test]
fn check_rejects_non_positive_target() {
    otf().args(["check", "--target", "0"]).assert().failure();
}

#[test]
fn skill_roll_needs_a_character() {
    otf()
        .args(["roll", "[S:Broadsword]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("character selected"));
}

#[test]
fn skill_roll_against_sample_sheet() {
    otf()
        .args(["roll", "S:Broadsword", "--seed", "3", "--character"])
        .arg(sample_character())
        .assert()
        .success()
        .stdout(predicate::str::contains("Broadsword (14)"));
}

#[test]
fn bucket_survives_between_invocations() {
    let bucket = temp_bucket("roll");
    otf()
        .args(["roll", "+2 aim", "--bucket"])
        .arg(&bucket)
        .assert()
        .success()
        .stdout(predicate::str::contains("total: +2"));
    otf()
        .args(["roll", "Dodge", "--seed", "1", "--bucket"])
        .arg(&bucket)
        .arg("--character")
        .arg(sample_character())
        .assert()
        .success()
        .stdout(predicate::str::contains("+2 : aim"))
        .stdout(predicate::str::contains("New Target: (10)"));
    otf()
        .args(["bucket", "--file"])
        .arg(&bucket)
        .arg("show")
        .assert()
        .success()
        .stdout("No modifiers\n");
}

#[test]
fn fatigue_is_written_back_to_the_sheet() {
    let bucket = temp_bucket("fatigue");
    let sheet = temp_bucket("fatigue-sheet");
    std::fs::copy(sample_character(), &sheet).unwrap();
    otf()
        .args(["bucket", "--file"])
        .arg(&bucket)
        .args(["add", "2", "Feverish", "Defense", "*Cost", "1FP"])
        .assert()
        .success();
    otf()
        .args(["roll", "Dodge", "--seed", "5", "--bucket"])
        .arg(&bucket)
        .arg("--character")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sir Roderick spends 1 FP (11/12 left)"));

    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&sheet).unwrap()).unwrap();
    assert_eq!(saved["FP"]["value"], 11);
    assert_eq!(saved["name"], "Sir Roderick");
}

#[test]
fn bucket_subcommands_edit_the_file() {
    let bucket = temp_bucket("edit");
    otf().args(["bucket", "--file"]).arg(&bucket).args(["add", "-2", "dark"]).assert().success();
    otf().args(["bucket", "--file"]).arg(&bucket).args(["add", "1", "aim"]).assert().success();
    otf()
        .args(["bucket", "--file"])
        .arg(&bucket)
        .args(["remove", "0"])
        .assert()
        .success()
        .stdout("total: +1\n  +1 : aim\n");
    otf().args(["bucket", "--file"]).arg(&bucket).args(["remove", "5"]).assert().failure();
    otf().args(["bucket", "--file"]).arg(&bucket).arg("clear").assert().success().stdout("No modifiers\n");
}

#[test]
fn damage_and_pdf_print_without_rolling_a_target() {
    otf()
        .args(["roll", "3d+1 cut"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Damage 3d+1 cut (no character): 3d+1 [Cutting x1.5]"));
    otf()
        .args(["roll", "2d dmg"])
        .assert()
        .success()
        .stdout("Damage 2d dmg (no character): 2d\n");
    otf()
        .args(["roll", "PDF:B340"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B p.342"));
}

#[test]
fn menus_list_builtin_modifiers() {
    otf()
        .args(["menus", "--menu", "melee"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mighty Blow"))
        .stdout(predicate::str::contains("-- Extra Effort --"));
    otf().args(["menus", "--menu", "nope"]).assert().failure();
}

#[test]
fn odds_prints_a_table() {
    Command::cargo_bin("odds")
        .unwrap()
        .args(["--trials", "200", "--from", "10", "--to", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target"))
        .stdout(predicate::str::contains("12"));
}
