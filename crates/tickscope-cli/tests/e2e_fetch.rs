//! E2E tests for `tks fetch` against a local stand-in for the tracker's
//! search endpoint.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn tks_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tks"));
    cmd.current_dir(dir);
    cmd.env("TICKSCOPE_LOG", "error");
    cmd.env_remove("TICKSCOPE_FORMAT");
    cmd.env_remove("JIRA_USERNAME");
    cmd.env_remove("JIRA_API_KEY");
    cmd
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answer one request per body, in order, and hand back the raw requests.
fn serve(bodies: Vec<Value>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for body in bodies {
            let (mut stream, _) = listener.accept().expect("accept");
            requests.push(read_request(&mut stream));
            let body = body.to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
        }
        requests
    });
    (format!("http://{addr}"), handle)
}

fn issue(key: &str, assignee: &str, histories: Value) -> Value {
    json!({
        "key": key,
        "fields": {
            "created": "2024-01-15T09:00:00.000+0000",
            "summary": format!("{key} summary"),
            "reporter": {"displayName": "Rita"},
            "priority": {"name": "High"},
            "resolution": null,
            "assignee": {"displayName": assignee},
            "status": {"name": "In Progress"},
            "customfield_10072": {"value": "Major"}
        },
        "changelog": {"histories": histories}
    })
}

fn status_change(author: &str, at: &str, from: &str, to: &str) -> Value {
    json!({
        "author": {"displayName": author},
        "created": at,
        "items": [{"field": "status", "fromString": from, "toString": to}]
    })
}

// ---------------------------------------------------------------------------
// tks fetch
// ---------------------------------------------------------------------------

#[test]
fn fetch_without_server_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    tks_cmd(dir.path())
        .args(["fetch", "--output", "out.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tracker server configured"));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn fetch_without_credentials_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("tickscope.toml"),
        "[tracker]\nserver = \"http://127.0.0.1:9\"\n",
    )
    .expect("write config");
    tks_cmd(dir.path())
        .args(["fetch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001"))
        .stderr(predicate::str::contains("JIRA_API_KEY"));
}

#[test]
fn fetch_writes_flattened_export() {
    let dir = TempDir::new().expect("tempdir");
    let (server, handle) = serve(vec![
        json!({"startAt": 0, "maxResults": 0, "total": 2, "issues": []}),
        json!({
            "startAt": 0,
            "maxResults": 100,
            "total": 2,
            "issues": [
                issue("UAT-1", "Alice", json!([
                    status_change("Bob", "2024-01-15T12:00:00.000+0000", "Open", "In Progress"),
                ])),
                issue("UAT-2", "Bob", json!([])),
            ]
        }),
    ]);

    let output = tks_cmd(dir.path())
        .env("JIRA_USERNAME", "me")
        .env("JIRA_API_KEY", "secret")
        .args([
            "fetch",
            "--server",
            &server,
            "--jql",
            "project = UAT",
            "--output",
            "uat.csv",
            "--json",
        ])
        .output()
        .expect("fetch should not crash");
    assert!(
        output.status.success(),
        "fetch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["tickets"], 2);
    assert_eq!(report["jql"], "project = UAT");

    let requests = handle.join().expect("server thread");
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("GET /rest/api/2/search?"));
    assert!(requests[0].contains("maxResults=0"));
    assert!(requests[1].contains("expand=changelog"));
    let auth = requests[1].to_ascii_lowercase();
    assert!(auth.contains("authorization: basic bwu6c2vjcmv0"));

    let csv = std::fs::read_to_string(dir.path().join("uat.csv")).expect("export written");
    let header = csv.lines().next().expect("header");
    for column in ["JIRA Key", "Created Date", "Severity", "Changed By 0", "Time In Status 0"] {
        assert!(header.contains(column), "missing column {column} in {header}");
    }
    assert!(csv.contains("01/15/2024 09:00 AM"));
    assert!(csv.contains("Major"));

    // The export feeds straight back into the read commands.
    let report = tks_cmd(dir.path())
        .args(["report", "--input", "uat.csv", "--json"])
        .output()
        .expect("report");
    assert!(report.status.success());
    let report: Value = serde_json::from_slice(&report.stdout).expect("report JSON");
    // Tied on assignments, so names order descending.
    assert_eq!(report["people"][0]["person"], "Bob");
    assert_eq!(report["people"][0]["contributor_count"], 1);
    assert_eq!(report["people"][1]["person"], "Alice");
    assert_eq!(report["people"][1]["assignee_count"], 1);
}
