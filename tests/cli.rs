use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const RECEIPT: &str = r#"
title = "Invoice"
subtitle = "March"
total_text = "$20.00"
recipient = ["Bob", "55 Main St"]
details = [["No.", "INV-1"]]
line_items = [["Item", "Qty"], ["Widget", "2"]]
total_items = [["Subtotal", "$20"], ["Total", "$20"]]

[payment_link]
url = "https://pay/1"
text = "Pay now"

[company]
name = "Acme"
email = "a@acme.com"
"#;

fn receipt_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("receipt-pdf"))
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help() {
    receipt_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Render a receipt or invoice"));
}

#[test]
fn test_renders_next_to_input_by_default() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "march.toml", RECEIPT);

    receipt_cmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("march.pdf"));

    let pdf = fs::read(dir.path().join("march.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn test_explicit_output_path() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "receipt.toml", RECEIPT);
    let output = dir.path().join("out").join("r.pdf");
    fs::create_dir_all(output.parent().unwrap()).unwrap();

    receipt_cmd()
        .arg(&input)
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn test_template_fills_missing_fields() {
    let dir = TempDir::new().unwrap();
    let receipt = RECEIPT.replace("title = \"Invoice\"\n", "");
    let input = write_input(&dir, "receipt.toml", &receipt);
    let template = write_input(
        &dir,
        "template.json",
        r#"{"title": "Receipt", "currency": "EUR"}"#,
    );

    receipt_cmd()
        .arg(&input)
        .args(["-t", template.to_str().unwrap(), "--print-context"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Receipt\""))
        .stdout(predicate::str::contains("\"currency\": \"EUR\""))
        .stdout(predicate::str::contains("\"total_text\": \"$20.00\""));

    assert!(!dir.path().join("receipt.pdf").exists());
}

#[test]
fn test_missing_field_fails() {
    let dir = TempDir::new().unwrap();
    let receipt = RECEIPT.replace("total_text = \"$20.00\"\n", "");
    let input = write_input(&dir, "receipt.toml", &receipt);

    receipt_cmd()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required field `total_text`"));
}

#[test]
fn test_one_row_table_fails() {
    let dir = TempDir::new().unwrap();
    let receipt = RECEIPT.replace(
        "line_items = [[\"Item\", \"Qty\"], [\"Widget\", \"2\"]]",
        "line_items = [[\"Item\", \"Qty\"]]",
    );
    let input = write_input(&dir, "receipt.toml", &receipt);

    receipt_cmd()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line_items"))
        .stderr(predicate::str::contains("got 1"));
}

#[test]
fn test_missing_input_file() {
    receipt_cmd()
        .arg("/no/such/receipt.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
