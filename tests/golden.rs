//! Golden tests for ctxforge
//!
//! Runs the context command against the committed fixture project and
//! checks the stable parts of the serialized pack.

use assert_cmd::Command;
use std::path::PathBuf;

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn rg_available() -> bool {
    std::process::Command::new("which")
        .arg("rg")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn context_pack_structure_on_fixture_project() {
    if !rg_available() {
        return;
    }

    let root = fixtures_dir().join("javaproj");
    assert!(root.is_dir(), "fixture project missing");

    let mut cmd = Command::cargo_bin("ctxforge").unwrap();
    cmd.arg("--root")
        .arg(&root)
        .arg("context")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("charge")
        .arg("--out")
        .arg("-");

    let assert = cmd.assert().success();
    let doc = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    // Header block, then snippets, then stats, in that order.
    let header_end = doc.find("====\n").expect("header terminator");
    let first_snippet = doc.find("[SNIPPET]").expect("at least one snippet");
    let stats = doc.find("[STATS]").expect("stats block");
    assert!(header_end < first_snippet);
    assert!(first_snippet < stats);

    // The anchor leads the pack.
    let anchor_pos = doc.find("symbol: ANCHOR").unwrap();
    assert!(anchor_pos < doc.find("symbol: post").unwrap());

    // Both callees of charge() are resolved to their declarations.
    assert!(doc.contains("file: src/main/java/com/acme/Ledger.java"));
    assert!(doc.contains("public int post(int amount)"));
    assert!(doc.contains("symbol: record"));

    // charge() has exactly two non-noise callees, so two queries ran.
    assert!(doc.contains("search_queries: 2"));
}

#[test]
fn context_pack_is_byte_stable_across_runs() {
    if !rg_available() {
        return;
    }

    let root = fixtures_dir().join("javaproj");

    let run = || {
        let mut cmd = Command::cargo_bin("ctxforge").unwrap();
        cmd.arg("--root")
            .arg(&root)
            .arg("context")
            .arg("--class")
            .arg("com.acme.Billing")
            .arg("--method")
            .arg("charge")
            .arg("--out")
            .arg("-");
        let assert = cmd.assert().success();
        String::from_utf8_lossy(&assert.get_output().stdout).to_string()
    };

    assert_eq!(run(), run());
}
