use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PAGE: &str = "\
كوتاژ: ۱۲۳۴۵۶۷۸
کد کالا: 84713000
نرخ ارز: 425000.0
نوع ارز: یورو
";

/// A `gomrok` command isolated from the user's configuration.
fn gomrok(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gomrok").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn field<'a>(record: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    record["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["field"] == name)
        .unwrap()
}

fn write_page(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn process_text_file_as_json() {
    let dir = TempDir::new().unwrap();
    let page = write_page(dir.path(), "page.txt", PAGE);

    let output = gomrok(dir.path())
        .arg("process")
        .arg(&page)
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["summary"]["identifiers"]["item_code"], "84713000");
    assert_eq!(record["summary"]["identifiers"]["cottage_number"], "12345678");
    assert_eq!(record["summary"]["administrative"]["currency_type"], "EUR");

    assert_eq!(record["document_info"]["default_strategy"], "priority");
    assert_eq!(field(&record, "item_code")["strategy"], "priority");
    assert_eq!(field(&record, "currency_type")["strategy"], "voting");
}

#[test]
fn process_ocr_json_with_page_number() {
    let dir = TempDir::new().unwrap();
    let json = serde_json::json!({
        "text": PAGE,
        "confidence": 81.0,
        "processing_time": 1.5
    });
    let page = write_page(dir.path(), "page.json", &json.to_string());

    let output = gomrok(dir.path())
        .args(["process", "--page", "2"])
        .arg(&page)
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["document_info"]["page_number"], 2);
}

#[test]
fn process_csv_and_text_formats() {
    let dir = TempDir::new().unwrap();
    let page = write_page(dir.path(), "page.txt", PAGE);

    gomrok(dir.path())
        .args(["process", "--format", "csv"])
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("field,status,value"))
        .stdout(predicate::str::contains("item_code,extracted,84713000"));

    gomrok(dir.path())
        .args(["process", "--format", "text", "--show-confidence"])
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("Identifiers:"))
        .stdout(predicate::str::contains("item_code: 84713000"));
}

#[test]
fn process_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let page = write_page(dir.path(), "page.txt", PAGE);
    let out = dir.path().join("record.json");

    gomrok(dir.path())
        .arg("process")
        .arg(&page)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let record: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(record["document_info"]["document_type"], "customs_declaration");
}

#[test]
fn process_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    gomrok(dir.path())
        .args(["process", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_unsupported_format_fails() {
    let dir = TempDir::new().unwrap();
    let page = write_page(dir.path(), "page.pdf", "%PDF");

    gomrok(dir.path())
        .arg("process")
        .arg(&page)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    write_page(&pages, "a.txt", PAGE);
    write_page(&pages, "b.txt", "کد کالا: 11112222");
    let out = dir.path().join("out");

    gomrok(dir.path())
        .arg("batch")
        .arg(format!("{}/*.txt", pages.display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--summary", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,page_type,item_code"));
    assert!(summary.contains("a.txt,success,single_item,84713000"));
    assert!(summary.contains("b.txt,success,single_item,11112222"));
}

#[test]
fn batch_stops_on_error_unless_asked_to_continue() {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    write_page(&pages, "good.txt", PAGE);
    write_page(&pages, "broken.json", "{not json");
    let pattern = format!("{}/*", pages.display());

    gomrok(dir.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));

    gomrok(dir.path())
        .args(["batch", &pattern, "--continue-on-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 1 failed"));
}

#[test]
fn batch_blank_page_yields_empty_record() {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    write_page(&pages, "a.txt", PAGE);
    write_page(&pages, "blank.txt", "  \n");
    let out = dir.path().join("out");

    gomrok(dir.path())
        .arg("batch")
        .arg(format!("{}/*.txt", pages.display()))
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful, 0 failed"));

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("blank.json")).unwrap()).unwrap();
    assert_eq!(record["stats"]["extracted_fields"], 0);
    assert!(record["stats"]["total_fields"].as_u64().unwrap() > 0);

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("blank.txt,success,single_item,"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();

    gomrok(dir.path())
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn catalog_show_lists_fields() {
    let dir = TempDir::new().unwrap();

    gomrok(dir.path())
        .args(["catalog", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("item_code"))
        .stdout(predicate::str::contains("currency_type"));
}

#[test]
fn catalog_export_then_check() {
    let dir = TempDir::new().unwrap();
    let exported = dir.path().join("catalog.json");

    gomrok(dir.path())
        .args(["catalog", "export", "--output"])
        .arg(&exported)
        .assert()
        .success();

    gomrok(dir.path())
        .args(["catalog", "check"])
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 skipped pattern(s)"));
}

#[test]
fn catalog_check_reports_broken_patterns_and_rejects_bad_files() {
    let dir = TempDir::new().unwrap();
    let catalog = write_page(
        dir.path(),
        "catalog.json",
        r#"{"version": "x", "fields": [{"name": "code", "patterns": ["(\\d+", "code:(\\d+)"]}]}"#,
    );

    gomrok(dir.path())
        .args(["catalog", "check"])
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("code pattern #0 does not compile"))
        .stdout(predicate::str::contains("1 skipped pattern(s)"));

    let duplicate = write_page(
        dir.path(),
        "duplicate.json",
        r#"{"version": "x", "fields": [{"name": "a", "patterns": []}, {"name": "a", "patterns": []}]}"#,
    );

    gomrok(dir.path())
        .args(["catalog", "check"])
        .arg(&duplicate)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate field name"));
}

#[test]
fn custom_catalog_drives_process() {
    let dir = TempDir::new().unwrap();
    let catalog = write_page(
        dir.path(),
        "catalog.json",
        r#"{"version": "custom-1", "fields": [{"name": "ref", "patterns": ["ref=(\\d+)"], "value_type": "int", "group": "identifiers"}]}"#,
    );
    let page = write_page(dir.path(), "page.txt", "ref=42");

    let output = gomrok(dir.path())
        .arg("process")
        .arg(&page)
        .arg("--catalog")
        .arg(&catalog)
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["document_info"]["catalog_version"], "custom-1");
    assert_eq!(record["summary"]["identifiers"]["ref"], 42);
}

#[test]
fn config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config_arg = config.to_str().unwrap();

    gomrok(dir.path())
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    gomrok(dir.path())
        .args(["--config", config_arg, "config", "set", "extraction.strategy", "voting"])
        .assert()
        .success();

    gomrok(dir.path())
        .args(["--config", config_arg, "config", "get", "extraction.strategy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"voting\""));

    gomrok(dir.path())
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_strategy_reaches_the_record() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config_arg = config.to_str().unwrap();
    let page = write_page(dir.path(), "page.txt", PAGE);

    gomrok(dir.path())
        .args(["--config", config_arg, "config", "set", "extraction.strategy", "voting"])
        .assert()
        .success();

    let output = gomrok(dir.path())
        .args(["--config", config_arg, "process"])
        .arg(&page)
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["document_info"]["default_strategy"], "voting");
    assert_eq!(field(&record, "item_code")["strategy"], "voting");
}
