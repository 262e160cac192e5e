use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn ctxforge_cmd() -> Command {
    Command::cargo_bin("ctxforge").expect("Failed to find ctxforge binary")
}

fn rg_available() -> bool {
    std::process::Command::new("which")
        .arg("rg")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A two-class project: Billing.charge calls record() and ledger.post().
fn write_billing_project(root: &Path) {
    write_file(
        &root.join("src/main/java/com/acme/Billing.java"),
        "package com.acme;\n\npublic class Billing {\n    private final Ledger ledger = new Ledger();\n\n    public int charge(int amount) {\n        record(amount);\n        return ledger.post(amount);\n    }\n\n    void record(int amount) {\n        int noted = amount;\n    }\n}\n",
    );
    write_file(
        &root.join("src/main/java/com/acme/Ledger.java"),
        "package com.acme;\n\npublic class Ledger {\n    public int post(int amount) {\n        return amount;\n    }\n}\n",
    );
}

#[test]
fn scan_lists_java_files_in_stable_order() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("b/B.java"), "class B {}");
    write_file(&temp.path().join("a/A.java"), "class A {}");
    write_file(&temp.path().join("a/notes.txt"), "not java");

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root").arg(temp.path()).arg("scan");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);

    let paths: Vec<_> = items
        .iter()
        .map(|v| v.get("rel_path").and_then(|p| p.as_str()).unwrap().to_string())
        .collect();

    assert_eq!(paths, vec!["a/A.java", "b/B.java"]);
}

#[test]
fn scan_skips_excluded_directories() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("src/A.java"), "class A {}");
    write_file(&temp.path().join("build/B.java"), "class B {}");
    write_file(&temp.path().join("node_modules/C.java"), "class C {}");

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root").arg(temp.path()).arg("scan");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("rel_path").unwrap(), "src/A.java");
}

#[test]
fn scan_respects_limit() {
    let temp = tempdir().unwrap();
    for name in ["A", "B", "C"] {
        write_file(&temp.path().join(format!("{}.java", name)), "class X {}");
    }

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("scan")
        .arg("--limit")
        .arg("2");

    let assert = cmd.assert().success();
    assert_eq!(parse_jsonl(&assert.get_output().stdout).len(), 2);
}

#[test]
fn locate_resolves_fqcn() {
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("locate")
        .arg("--class")
        .arg("com.acme.Billing");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("found").unwrap(), true);
    assert_eq!(
        items[0].get("rel_path").unwrap(),
        "src/main/java/com/acme/Billing.java"
    );
}

#[test]
fn locate_unknown_class_fails() {
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("locate")
        .arg("--class")
        .arg("com.acme.Nothing");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("locate failed"));
}

#[test]
fn extract_prints_method_text() {
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("extract")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("charge");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.contains("FILE: src/main/java/com/acme/Billing.java"));
    assert!(s.contains("METHOD: charge"));
    assert!(s.contains("BYTE_RANGE: "));
    assert!(s.contains("public int charge(int amount)"));
}

#[test]
fn extract_missing_method_fails() {
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("extract")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("refund");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("extract failed"));
}

#[test]
fn search_reports_hits_with_byte_offsets() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("search")
        .arg("--pattern")
        .arg(r"post\s*\(");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.contains("exit: 0"));
    assert!(s.contains("byte="));
    assert!(s.contains("Ledger.java"));
}

#[test]
fn snippets_promotes_hits_to_declarations() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("snippets")
        .arg("--pattern")
        .arg(r"post\s*\(");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.contains("[SNIPPET]"));
    assert!(s.contains("kind: method_declaration"));
    assert!(s.contains("public int post(int amount)"));
}

#[test]
fn context_builds_pack_to_stdout() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("context")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("charge")
        .arg("--out")
        .arg("-");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.starts_with("[CONTEXT]\n"));
    assert!(s.contains("anchor_class: com.acme.Billing\n"));
    assert!(s.contains("symbol: ANCHOR\n"));
    assert!(s.contains("symbol: post\n"));
    assert!(s.contains("file: src/main/java/com/acme/Ledger.java\n"));
    assert!(s.contains("[STATS]"));
    assert!(s.ends_with("[/CONTEXT]\n"));
}

#[test]
fn context_missing_anchor_writes_empty_pack_and_fails() {
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());
    let out = temp.path().join("context.txt");

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("context")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("doesNotExist")
        .arg("--out")
        .arg(&out);

    cmd.assert().failure();

    let doc = fs::read_to_string(&out).unwrap();
    assert!(doc.contains("snippets_written: 0"));
    assert!(doc.contains("hops_used: 0"));
}

#[test]
fn context_without_anchor_flags_fails() {
    let temp = tempdir().unwrap();

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root").arg(temp.path()).arg("context");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing anchor"));
}

#[test]
fn context_honors_snippet_budget() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("context")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("charge")
        .arg("--max-snippets")
        .arg("1")
        .arg("--out")
        .arg("-");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.contains("snippets_written: 1"));
    assert_eq!(s.matches("[SNIPPET]").count(), 1);
}

#[test]
fn context_reads_anchor_from_prompt_file() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());
    write_file(
        &temp.path().join("prompt.txt"),
        "[HINTS]\nanchor_class=com.acme.Billing\nanchor_method=charge\nscope=deps\n[/HINTS]\n",
    );

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("context")
        .arg("--prompt")
        .arg(temp.path().join("prompt.txt"))
        .arg("--out")
        .arg("-");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    // deps scope pins the hop budget to 1
    assert!(s.contains("max_hops: 1\n"));
    assert!(s.contains("symbol: ANCHOR\n"));
}

#[test]
fn context_explicit_root_beats_prompt_repo_root() {
    let project = tempdir().unwrap();
    write_billing_project(project.path());
    // A real directory with no anchor in it, named by the prompt.
    let decoy = tempdir().unwrap();

    // scope=local keeps the hop budget at 0, so no search tool is needed.
    write_file(
        &project.path().join("prompt.txt"),
        &format!(
            "[HINTS]\nrepo_root={}\nanchor_class=com.acme.Billing\nanchor_method=charge\nscope=local\n[/HINTS]\n",
            decoy.path().display()
        ),
    );

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(project.path())
        .arg("context")
        .arg("--prompt")
        .arg(project.path().join("prompt.txt"))
        .arg("--out")
        .arg("-");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    // The explicit flag wins; the prompt's repo_root is discarded.
    assert!(s.contains(&format!("repo_root: {}", project.path().display())));
    assert!(!s.contains(&decoy.path().display().to_string()));
    assert!(s.contains("symbol: ANCHOR\n"));
}

#[test]
fn context_prompt_repo_root_applies_when_flag_absent() {
    let project = tempdir().unwrap();
    write_billing_project(project.path());

    let prompt_dir = tempdir().unwrap();
    write_file(
        &prompt_dir.path().join("prompt.txt"),
        &format!(
            "[HINTS]\nrepo_root={}\nanchor_class=com.acme.Billing\nanchor_method=charge\nscope=local\n[/HINTS]\n",
            project.path().display()
        ),
    );

    // No --root: the prompt's repo_root carries the day.
    let mut cmd = ctxforge_cmd();
    cmd.arg("context")
        .arg("--prompt")
        .arg(prompt_dir.path().join("prompt.txt"))
        .arg("--out")
        .arg("-");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.contains(&format!("repo_root: {}", project.path().display())));
    assert!(s.contains("symbol: ANCHOR\n"));
    assert!(s.contains("file: src/main/java/com/acme/Billing.java\n"));
}

#[test]
fn context_stats_flag_reports_tokens() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());

    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("context")
        .arg("--class")
        .arg("com.acme.Billing")
        .arg("--method")
        .arg("charge")
        .arg("--out")
        .arg("-")
        .arg("--stats");

    let assert = cmd.assert().success();
    let err = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(err.contains("estimated tokens:"));
}

#[test]
fn ask_pipes_final_prompt_through_adaptor() {
    if !rg_available() {
        return;
    }
    let temp = tempdir().unwrap();
    write_billing_project(temp.path());
    write_file(
        &temp.path().join("prompt.txt"),
        "[HINTS]\nanchor_class=com.acme.Billing\nanchor_method=charge\n[/HINTS]\n[TASK]\nAdd an overdraft check.\n[/TASK]\n",
    );

    let context_out = temp.path().join("context.txt");
    let answer_out = temp.path().join("answer.txt");

    // `cat -` stands in for the model adaptor and echoes the prompt back.
    let mut cmd = ctxforge_cmd();
    cmd.arg("--root")
        .arg(temp.path())
        .arg("ask")
        .arg("--prompt")
        .arg(temp.path().join("prompt.txt"))
        .arg("--py")
        .arg("cat")
        .arg("--script")
        .arg("-")
        .arg("--context-out")
        .arg(&context_out)
        .arg("--out")
        .arg(&answer_out);

    cmd.assert().success();

    let context = fs::read_to_string(&context_out).unwrap();
    assert!(context.starts_with("[CONTEXT]\n"));

    let answer = fs::read_to_string(&answer_out).unwrap();
    assert!(answer.contains("TASK:\nAdd an overdraft check."));
    assert!(answer.contains("[SNIPPET]"));
    assert!(answer.ends_with("END.\n"));
}

#[test]
fn doctor_reports_dependencies() {
    let mut cmd = ctxforge_cmd();
    cmd.arg("doctor");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(s.contains("ripgrep"));
    assert!(s.contains("tree-sitter-java"));
}
