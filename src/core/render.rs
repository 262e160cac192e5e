//! Pack rendering
//!
//! Serializes a finished context pack into the stable textual form hosts
//! consume. Field order and delimiters are part of the contract; prompt
//! tooling downstream splits on the literal markers, so this output is
//! byte-stable across runs.

use std::fmt::Write as _;

use crate::core::model::{ContextOptions, ContextPack, ContextRequest, ContextSnippet};

/// Render the `[CONTEXT]`-framed document for a pack.
pub fn render_pack(req: &ContextRequest, opt: &ContextOptions, pack: &ContextPack) -> String {
    let mut out = String::new();

    out.push_str("[CONTEXT]\n");
    let _ = writeln!(out, "repo_root: {}", req.repo_root.display());
    let _ = writeln!(out, "anchor_class: {}", req.anchor_class);
    let _ = writeln!(out, "anchor_method: {}", req.anchor_method);
    let _ = writeln!(out, "max_hops: {}", opt.max_hops);
    let _ = writeln!(out, "max_snippets: {}", opt.max_snippets);
    let _ = writeln!(out, "max_bytes: {}", opt.max_bytes);
    out.push_str("====\n");

    for snip in &pack.snippets {
        render_snippet(&mut out, snip);
    }

    out.push_str("\n[STATS]\n");
    let _ = writeln!(out, "hops_used: {}", pack.stats.hops_used);
    let _ = writeln!(out, "snippets_written: {}", pack.stats.snippets_written);
    let _ = writeln!(out, "bytes_written: {}", pack.stats.bytes_written);
    let _ = writeln!(out, "symbols_seen: {}", pack.stats.symbols_seen);
    let _ = writeln!(out, "search_queries: {}", pack.stats.search_queries);
    let _ = writeln!(out, "search_hits_total: {}", pack.stats.search_hits_total);
    out.push_str("[/STATS]\n");
    out.push_str("[/CONTEXT]\n");

    out
}

fn render_snippet(out: &mut String, snip: &ContextSnippet) {
    out.push_str("\n[SNIPPET]\n");
    let _ = writeln!(out, "hop: {}", snip.hop);
    let _ = writeln!(out, "score: {}", snip.score);
    let _ = writeln!(out, "symbol: {}", snip.symbol);
    let _ = writeln!(out, "file: {}", snip.rel_path);
    let _ = writeln!(out, "kind: {}", snip.kind);
    let _ = writeln!(out, "range: {}..{}", snip.start, snip.end);
    out.push_str("----\n");
    out.push_str(&snip.text);
    out.push_str("\n[/SNIPPET]\n");
}

/// Render a sequence of serializable items as JSON Lines.
pub fn render_jsonl<T: serde::Serialize>(items: &[T]) -> String {
    items
        .iter()
        .filter_map(|item| serde_json::to_string(item).ok())
        .collect::<Vec<_>>()
        .join("\n")
}
