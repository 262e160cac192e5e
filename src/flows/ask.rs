//! Ask flow - pipe a built context pack through a downstream model
//!
//! Builds the pack for a prompt file, composes the final codegen prompt
//! (task text + snippets), feeds it to the model adaptor process over
//! stdin, and streams the model's stdout into the answer file. The
//! adaptor's stderr flows through to ours.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::backends::scan::{scan_workspace, ScanOptions};
use crate::core::model::{ContextOptions, ContextPack, ContextRequest};
use crate::core::render::render_pack;
use crate::core::util::write_out;
use crate::flows::context::build_context_pack;
use crate::flows::prompt::{parse_prompt_file, PromptSpec};

/// Compose the one-shot codegen prompt sent to the model.
///
/// The output contract asks for plain text with `FILE:` headers so the
/// host can split the answer back into files.
fn build_final_prompt(
    spec: &PromptSpec,
    req: &ContextRequest,
    opt: &ContextOptions,
    pack: &ContextPack,
) -> String {
    let mut p = String::new();

    p.push_str("You are a senior software engineer. Follow instructions carefully.\n\n");

    p.push_str("TASK:\n");
    if spec.task_text.is_empty() {
        p.push_str("(no task text provided)\n");
    } else {
        p.push_str(&spec.task_text);
        p.push('\n');
    }
    p.push('\n');

    p.push_str("OUTPUT FORMAT:\n");
    p.push_str("- Output plain text only (no markdown fences).\n");
    p.push_str("- If you propose changes to files, output the COMPLETE contents of each file.\n");
    p.push_str("- Use this exact header before each file:\n");
    p.push_str("  FILE: <relative/path>\n");
    p.push_str("- If only one file is involved, output that file only.\n");
    p.push_str("- Do not include explanations unless explicitly asked in TASK.\n\n");

    p.push_str("CONTEXT:\n");
    p.push_str(&format!("repo_root: {}\n", req.repo_root.display()));
    p.push_str(&format!("anchor_class: {}\n", req.anchor_class));
    p.push_str(&format!("anchor_method: {}\n", req.anchor_method));
    p.push_str(&format!("max_hops: {}\n\n", opt.max_hops));

    for s in &pack.snippets {
        p.push_str("\n[SNIPPET]\n");
        p.push_str(&format!("hop: {}\n", s.hop));
        p.push_str(&format!("symbol: {}\n", s.symbol));
        p.push_str(&format!("file: {}\n", s.rel_path));
        p.push_str(&format!("kind: {}\n", s.kind));
        p.push_str("----\n");
        p.push_str(&s.text);
        p.push_str("\n[/SNIPPET]\n");
    }

    p.push_str("\nEND.\n");
    p
}

/// Spawn the model adaptor, write the prompt to its stdin, and stream
/// its stdout to the answer file.
fn run_model(py: &str, script: &str, prompt: &str, answer_path: &Path) -> Result<()> {
    let mut child = Command::new(py)
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to spawn model adaptor: {} {}", py, script))?;

    {
        let mut stdin = child.stdin.take().context("model adaptor stdin missing")?;
        stdin.write_all(prompt.as_bytes())?;
        // Dropping stdin sends EOF.
    }

    let mut stdout = child.stdout.take().context("model adaptor stdout missing")?;
    let mut answer = File::create(answer_path)
        .with_context(|| format!("failed to create answer file: {}", answer_path.display()))?;
    std::io::copy(&mut stdout, &mut answer)?;

    let status = child.wait()?;
    if !status.success() {
        eprintln!("model process exited with code {}", status.code().unwrap_or(-1));
    }
    Ok(())
}

/// Run the ask command.
pub fn run_ask(
    root: &Path,
    prompt_path: &Path,
    py: &str,
    script: &str,
    context_out: &Path,
    answer_out: &Path,
) -> Result<()> {
    let spec = parse_prompt_file(prompt_path)?;

    let root = spec.repo_root.clone().unwrap_or_else(|| root.to_path_buf());
    let mut opt = ContextOptions::default();
    if let Some(hops) = spec.scope.to_hops() {
        opt.max_hops = hops;
    }

    let files = scan_workspace(&root, &ScanOptions::default())?;
    let req = ContextRequest::new(root, spec.anchor_class.clone(), spec.anchor_method.clone());
    let pack = build_context_pack(&req, &opt, &files)?;

    if pack.snippets.is_empty() {
        bail!("context pack is empty (anchor not found or extraction failed)");
    }

    // Intermediate context file for debugging and reuse.
    write_out(context_out, &render_pack(&req, &opt, &pack))?;

    let final_prompt = build_final_prompt(&spec, &req, &opt, &pack);
    run_model(py, script, &final_prompt, answer_out)?;

    println!(
        "wrote {} and {}",
        context_out.display(),
        answer_out.display()
    );
    Ok(())
}
