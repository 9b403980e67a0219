//! End-to-end tests for the `sneaky` binary.

use assert_cmd::Command;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("test.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE
        );",
    )
    .unwrap();
    (dir, db)
}

fn sneaky(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sneaky").unwrap();
    cmd.env_remove("SNEAKY_DB")
        .env_remove("SNEAKY_BUSY_TIMEOUT_MS")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db);
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_insert_assigns_generated_key() {
    let (_dir, db) = setup();

    let output = sneaky(&db)
        .args(["--json", "insert", "users", "--values", r#"{"name":"ada","email":"ada@x.io"}"#])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["saved"], true);
    assert_eq!(json["id"], 1);
    assert_eq!(json["record"]["name"], "ada");

    let conn = Connection::open(&db).unwrap();
    let name: String = conn
        .query_row("SELECT name FROM users WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "ada");
}

#[test]
fn test_duplicate_best_effort_reports_not_saved() {
    let (_dir, db) = setup();
    let values = r#"{"name":"ada","email":"dup@x.io"}"#;

    sneaky(&db)
        .args(["insert", "users", "--values", values])
        .assert()
        .success();

    let output = sneaky(&db)
        .args(["--json", "insert", "users", "--values", values])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["saved"], false);
}

#[test]
fn test_duplicate_strict_fails() {
    let (_dir, db) = setup();
    let values = r#"{"name":"ada","email":"dup@x.io"}"#;

    sneaky(&db)
        .args(["insert", "users", "--values", values])
        .assert()
        .success();

    let output = sneaky(&db)
        .args(["--json", "insert", "users", "--strict", "--values", values])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("STATEMENT_FAILED"));
}

#[test]
fn test_update_changes_row() {
    let (_dir, db) = setup();
    sneaky(&db)
        .args(["insert", "users", "--values", r#"{"name":"ada","email":"ada@x.io"}"#])
        .assert()
        .success();

    let output = sneaky(&db)
        .args(["--json", "update", "users", "1", "--set", r#"{"name":"grace"}"#])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["saved"], true);

    let output = sneaky(&db)
        .args(["--json", "show", "users", "1"])
        .output()
        .unwrap();
    let row = stdout_json(&output);
    assert_eq!(row["name"], "grace");
    assert_eq!(row["email"], "ada@x.io");
}

#[test]
fn test_update_missing_row() {
    let (_dir, db) = setup();

    let output = sneaky(&db)
        .args(["update", "users", "404", "--set", r#"{"name":"ghost"}"#])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_sequenced_insert_draws_from_sequence() {
    let (_dir, db) = setup();

    let output = sneaky(&db)
        .args(["--json", "--sequences", "insert", "users", "--values", r#"{"name":"ada"}"#])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["id"], 1);

    let conn = Connection::open(&db).unwrap();
    let last: i64 = conn
        .query_row(
            "SELECT last_value FROM sneaky_sequences WHERE name = 'users_seq'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(last, 1);
}

#[test]
fn test_sequenced_update_leaves_schema_alone() {
    let (_dir, db) = setup();
    sneaky(&db)
        .args(["insert", "users", "--values", r#"{"name":"ada"}"#])
        .assert()
        .success();

    sneaky(&db)
        .args(["--sequences", "update", "users", "1", "--set", r#"{"name":"grace"}"#])
        .assert()
        .success();

    let conn = Connection::open(&db).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'sneaky_sequences'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
    let name: String = conn
        .query_row("SELECT name FROM users WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "grace");
}

#[test]
fn test_missing_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("absent.db");

    let output = sneaky(&db)
        .args(["insert", "users", "--values", r#"{"name":"ada"}"#])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(!db.exists());
}

#[test]
fn test_missing_table_propagates() {
    let (_dir, db) = setup();

    let output = sneaky(&db)
        .args(["insert", "ghosts", "--values", r#"{"name":"boo"}"#])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_version_json() {
    let (_dir, db) = setup();
    let output = sneaky(&db).args(["--json", "version"]).output().unwrap();
    assert!(output.status.success());
    let info = stdout_json(&output);
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["sqlite"], rusqlite::version());
    assert_eq!(info["database"], db.display().to_string());
}
