//! Integration tests for the copybook-parser CLI.
//!
//! These run the built binary against the fixtures and inspect the JSON it
//! writes.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the path to the built binary.
fn get_bin_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("copybook-parser");
    path
}

/// Helper to get fixture path.
fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

/// Run the CLI with given arguments and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(get_bin_path())
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

/// Parse a fixture into a temporary directory and return the JSON document.
fn parse_fixture(name: &str, extra: &[&str]) -> serde_json::Value {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("layout.json");
    let input = fixture(name);
    let mut args = vec![input.to_str().unwrap(), "-o", out.to_str().unwrap()];
    args.extend_from_slice(extra);

    let (_, stderr, code) = run_cli(&args);
    assert_eq!(code, 0, "Command failed with stderr: {}", stderr);
    read_json(&out)
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn child<'a>(field: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    field["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap_or_else(|| panic!("no child {name}"))
}

#[test]
fn test_help_command() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("copybook-parser"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--no-pretty"));
    assert!(stdout.contains("--source-format"));
}

#[test]
fn test_version_command() {
    let (stdout, _, code) = run_cli(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("copybook-parser"));
}

#[test]
fn test_short_help_and_version() {
    let (stdout, _, code) = run_cli(&["-h"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("--pretty"));

    let (stdout, _, code) = run_cli(&["-V"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_fails() {
    let (_, _, code) = run_cli(&["--bogus", fixture("customer.cpy").to_str().unwrap()]);
    assert_eq!(code, 1);
}

#[test]
fn test_missing_input_fails() {
    let (_, stderr, code) = run_cli(&["/no/such/copybook.cpy"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
}

#[test]
fn test_copybook_without_entries_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.json");
    let input = fixture("empty.cpy");
    let (_, stderr, code) = run_cli(&[input.to_str().unwrap(), "-o", out.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no data description entries"), "stderr: {}", stderr);
    assert!(!out.exists());
}

#[test]
fn test_customer_layout() {
    let json = parse_fixture("customer.cpy", &[]);
    assert_eq!(json["fileName"], "customer.cpy");
    // REC LEN directive exceeds the 50 computed bytes.
    assert_eq!(json["totalLength"], 60);

    let record = &json["fields"][0];
    assert_eq!(record["name"], "CUSTOMER-RECORD");
    assert_eq!(record["length"], 50);

    let name = child(record, "CUST-NAME");
    assert_eq!(name["startPosition"], 7);
    assert_eq!(name["endPosition"], 36);

    let balance = child(record, "CUST-BALANCE");
    assert_eq!(balance["length"], 5);
    assert_eq!(balance["dataType"], "SIGNED_NUMERIC");

    let opened = child(record, "CUST-OPENED");
    let numeric = child(record, "CUST-OPENED-NUM");
    assert_eq!(opened["startPosition"], numeric["startPosition"]);
    assert_eq!(numeric["redefines"], "CUST-OPENED");

    let text = serde_json::to_string(&json).unwrap();
    assert!(!text.contains("CUST-ACTIVE"));
    assert!(!text.contains("CUST-CLOSED"));
}

#[test]
fn test_record_variants_and_tables() {
    let json = parse_fixture("orders.cpy", &[]);
    assert_eq!(json["totalLength"], 42);

    let layouts = json["recordLayouts"].as_array().unwrap();
    let names: Vec<&str> = layouts.iter().map(|l| l["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["ORDER-RECORD", "STANDARD-DATA", "EXPRESS-DATA"]);
    assert_eq!(layouts[1]["recordTypeValues"][0], "S");
    assert_eq!(layouts[2]["recordTypeValues"][0], "E");
    assert_eq!(layouts[2]["redefines"], "STANDARD-DATA");
    assert!(layouts.iter().all(|l| l["startPosition"] == 1));

    let lines = child(&json["fields"][0], "ORDER-LINE");
    assert_eq!(lines["occursCount"], 3);
    assert_eq!(lines["length"], 33);
    let elements = lines["arrayElements"].as_array().unwrap();
    let starts: Vec<u64> = elements.iter().map(|e| e["startPosition"].as_u64().unwrap()).collect();
    assert_eq!(starts, vec![10, 21, 32]);
    assert_eq!(elements[2]["fields"][1]["name"], "ITEM-QTY");
    assert_eq!(elements[2]["fields"][1]["startPosition"], 40);
}

#[test]
fn test_fixed_format_flag() {
    let json = parse_fixture("legacy.cpy", &["--source-format", "fixed"]);
    assert_eq!(json["totalLength"], 11);
    let record = &json["fields"][0];
    assert_eq!(child(record, "LEG-AMOUNT")["startPosition"], 5);
    assert_eq!(child(record, "LEG-AMOUNT")["decimalPlaces"], 2);
}

#[test]
fn test_pretty_and_compact_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture("customer.cpy");
    let pretty = dir.path().join("pretty.json");
    let compact = dir.path().join("compact.json");

    let (_, _, code) = run_cli(&[input.to_str().unwrap(), "-o", pretty.to_str().unwrap()]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(&[
        input.to_str().unwrap(),
        "-o",
        compact.to_str().unwrap(),
        "--no-pretty",
    ]);
    assert_eq!(code, 0);

    let short = dir.path().join("short.json");
    let (_, _, code) = run_cli(&[
        input.to_str().unwrap(),
        "--no-pretty",
        "-p",
        "-o",
        short.to_str().unwrap(),
    ]);
    assert_eq!(code, 0);
    assert!(std::fs::read_to_string(&short).unwrap().contains('\n'));

    let pretty_text = std::fs::read_to_string(&pretty).unwrap();
    let compact_text = std::fs::read_to_string(&compact).unwrap();
    assert!(pretty_text.contains('\n'));
    assert!(!compact_text.contains('\n'));
    assert_eq!(read_json(&pretty), read_json(&compact));
}

#[test]
fn test_default_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("copy.cpy");
    std::fs::copy(fixture("customer.cpy"), &input).unwrap();

    let (stdout, stderr, code) = run_cli(&[input.to_str().unwrap()]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Successfully parsed"), "Output: {}", stdout);
    assert!(dir.path().join("copy.json").exists());
}

#[test]
fn test_verbose_summary() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("orders.json");
    let input = fixture("orders.cpy");
    let (stdout, _, code) = run_cli(&[input.to_str().unwrap(), "-o", out.to_str().unwrap(), "-v"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Total record length: 42 bytes"), "Output: {}", stdout);
    assert!(stdout.contains("EXPRESS-DATA (REDEFINES STANDARD-DATA)"), "Output: {}", stdout);
    assert!(stdout.contains("JSON saved to:"), "Output: {}", stdout);
}
