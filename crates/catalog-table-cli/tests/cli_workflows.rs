#![allow(missing_docs)]

mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::{TestResult, write_config, write_id_ts_parquet, write_name_parquet};

fn cli(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("catalog-table"));
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn put_then_get_returns_rows_in_commit_order() -> TestResult {
    let tmp = TempDir::new()?;
    let config = write_config(&tmp, "ns1")?;
    let first = tmp.path().join("first.parquet");
    let second = tmp.path().join("second.parquet");
    write_id_ts_parquet(&first, 0..10)?;
    write_id_ts_parquet(&second, 10..15)?;

    cli(&config)
        .args(["put", "--table", "events", "--parquet"])
        .arg(&first)
        .assert()
        .success()
        .stdout(predicate::str::contains("Appended 10 rows to ns1.events (version 2)"));
    cli(&config)
        .args(["put", "--table", "events", "--parquet"])
        .arg(&second)
        .assert()
        .success()
        .stdout(predicate::str::contains("version 3"));

    let output = cli(&config)
        .args(["get", "--table", "events", "--format", "csv"])
        .output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout)?;
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("id,ts"));
    let ids: Vec<i32> = lines
        .map(|line| line.split(',').next().unwrap_or_default().parse())
        .collect::<Result<_, _>>()?;
    assert_eq!(ids, (0..15).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn get_writes_jsonl_to_output_file() -> TestResult {
    let tmp = TempDir::new()?;
    let config = write_config(&tmp, "ns1")?;
    let input = tmp.path().join("in.parquet");
    write_id_ts_parquet(&input, 0..3)?;
    cli(&config)
        .args(["put", "--table", "events", "--parquet"])
        .arg(&input)
        .assert()
        .success();

    let out = tmp.path().join("out.jsonl");
    cli(&config)
        .args(["get", "--table", "events", "--format", "jsonl", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out)?;
    assert_eq!(written.lines().count(), 3);
    assert!(written.starts_with(r#"{"id":0,"ts":0}"#));
    Ok(())
}

#[test]
fn get_before_put_fails_with_not_found() -> TestResult {
    let tmp = TempDir::new()?;
    let config = write_config(&tmp, "ns1")?;

    cli(&config)
        .args(["get", "--table", "events"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Table ns1.events does not exist"));
    Ok(())
}

#[test]
fn schema_mismatch_is_reported_and_table_is_unchanged() -> TestResult {
    let tmp = TempDir::new()?;
    let config = write_config(&tmp, "ns1")?;
    let good = tmp.path().join("good.parquet");
    let bad = tmp.path().join("bad.parquet");
    write_id_ts_parquet(&good, 0..4)?;
    write_name_parquet(&bad, &["a", "b"])?;

    cli(&config)
        .args(["put", "--table", "events", "--parquet"])
        .arg(&good)
        .assert()
        .success();
    cli(&config)
        .args(["put", "--table", "events", "--parquet"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("incompatible with the schema of ns1.events"));

    cli(&config)
        .args(["get", "--table", "events", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(4 rows)"));
    Ok(())
}

#[test]
fn listing_and_history_commands() -> TestResult {
    let tmp = TempDir::new()?;
    let config = write_config(&tmp, "ns1")?;
    let input = tmp.path().join("in.parquet");
    write_id_ts_parquet(&input, 0..5)?;

    for table in ["events", "metrics"] {
        cli(&config)
            .args(["put", "--table", table, "--parquet"])
            .arg(&input)
            .assert()
            .success();
    }

    cli(&config)
        .arg("namespaces")
        .assert()
        .success()
        .stdout("ns1\n");
    cli(&config)
        .arg("tables")
        .assert()
        .success()
        .stdout("ns1.events\nns1.metrics\n");

    let output = cli(&config).args(["history", "--table", "events"]).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let rows: Vec<Vec<&str>> = stdout.lines().skip(1).map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0][0], rows[0][2], rows[0][3]), ("1", "create", "0"));
    assert_eq!((rows[1][0], rows[1][2], rows[1][3]), ("2", "append", "5"));
    Ok(())
}

#[test]
fn missing_config_is_an_error() {
    let tmp = TempDir::new().expect("tempdir");
    cli(&tmp.path().join("nope.json"))
        .arg("namespaces")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn numeric_config_properties_are_accepted() -> TestResult {
    let tmp = TempDir::new()?;
    let config = tmp.path().join("catalog.json");
    let json = serde_json::json!({
        "identifier": "ns1",
        "warehouse_path": tmp.path().join("warehouse"),
        "commit.max-attempts": 5,
    });
    std::fs::write(&config, serde_json::to_vec_pretty(&json)?)?;
    let input = tmp.path().join("in.parquet");
    write_id_ts_parquet(&input, 0..2)?;

    cli(&config)
        .args(["put", "--table", "events", "--parquet"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Appended 2 rows to ns1.events (version 2)"));
    Ok(())
}
