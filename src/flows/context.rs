//! Context building flow - the budgeted call-graph walk
//!
//! Seeds a frontier with the anchor method, then breadth-first: harvest
//! callee names, search the repository for call sites, promote each hit
//! to its enclosing declaration, rank, and emit until the hop, snippet
//! or byte budget runs out. The builder is liberal: a failed file, parse
//! or search never aborts the pack, it just contributes nothing.

use anyhow::{bail, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::backends::rg::{rg_search_json, SearchQuery};
use crate::backends::scan::{scan_workspace, ScanOptions};
use crate::core::model::{
    ContextOptions, ContextPack, ContextRequest, ContextSnippet, FileEntry, HitSnippet,
};
use crate::core::paths::dir_prefix;
use crate::core::render::render_pack;
use crate::core::tokenizer::estimate_pack_tokens;
use crate::core::util::write_out;
use crate::flows::prompt::parse_prompt_file;
use crate::java::extract::extract_method;
use crate::java::harvest::harvest_callees;
use crate::java::locate::locate_class;
use crate::java::resolve::snippet_from_hit;

const ANCHOR_SYMBOL: &str = "ANCHOR";
const ANCHOR_SCORE: i32 = 1000;

/// Snippet sizes that start costing ranking points.
const LONG_SNIPPET_BYTES: usize = 8_000;
const HUGE_SNIPPET_BYTES: usize = 20_000;

fn is_expandable_kind(kind: &str) -> bool {
    kind == "method_declaration" || kind == "constructor_declaration"
}

fn path_is_main_java(p: &str) -> bool {
    p.contains("/src/main/java/")
}

/// Call-site pattern for a symbol. Matches call sites and declarations
/// alike; the scope resolver promotes either into a relevant definition.
fn call_site_pattern(sym: &str) -> String {
    format!(r"\b{}\s*\(", regex::escape(sym))
}

/// Score a candidate snippet relative to the anchor's file.
///
/// Pure in `(anchor_rel, kind, rel_path, length)`: equal inputs always
/// yield equal scores.
fn score_snippet(anchor_rel: &str, snip: &HitSnippet) -> i32 {
    let mut score = 0;

    if is_expandable_kind(&snip.kind) {
        score += 50;
    } else if snip.kind.contains("class") || snip.kind.contains("interface") {
        score += 30;
    }

    if path_is_main_java(&snip.rel_path) {
        score += 20;
    }

    if let Some(dir) = dir_prefix(anchor_rel) {
        if snip.rel_path.starts_with(dir) {
            score += 20;
        }
    }

    let len = snip.end.saturating_sub(snip.start);
    if len > LONG_SNIPPET_BYTES {
        score -= 20;
    }
    if len > HUGE_SNIPPET_BYTES {
        score -= 60;
    }

    score
}

/// A frontier entry: a method/constructor range to harvest next hop.
struct Pending {
    rel_path: String,
    abs_path: PathBuf,
    kind: String,
    start: usize,
    end: usize,
}

type SnipKey = (String, usize, usize);

fn snip_key(rel_path: &str, start: usize, end: usize) -> SnipKey {
    (rel_path.to_string(), start, end)
}

fn budget_reached(pack: &ContextPack, opt: &ContextOptions) -> bool {
    pack.stats.snippets_written >= opt.max_snippets || pack.stats.bytes_written >= opt.max_bytes
}

/// Build a context pack for the request over the given inventory.
///
/// Only a failure to run the external search tool escalates as an error;
/// an unresolvable anchor yields an empty pack.
pub fn build_context_pack(
    req: &ContextRequest,
    opt: &ContextOptions,
    files: &[FileEntry],
) -> Result<ContextPack> {
    let mut pack = ContextPack::default();

    let loc = locate_class(files, &req.anchor_class);
    if !loc.found {
        return Ok(pack);
    }

    let anchor = extract_method(&loc.abs_path, &loc.rel_path, &req.anchor_method);
    if !anchor.found {
        return Ok(pack);
    }

    // Snippet keys already emitted; symbols already expanded per hop.
    let mut seen_snips: HashSet<SnipKey> = HashSet::new();
    let mut seen_symbols: HashSet<(u32, String)> = HashSet::new();

    if opt.include_anchor_in_snippets {
        seen_snips.insert(snip_key(&loc.rel_path, anchor.start, anchor.end));
        pack.stats.snippets_written += 1;
        pack.stats.bytes_written += anchor.text.len();
        pack.snippets.push(ContextSnippet {
            rel_path: loc.rel_path.clone(),
            abs_path: loc.abs_path.clone(),
            kind: "method_declaration".to_string(),
            start: anchor.start,
            end: anchor.end,
            score: ANCHOR_SCORE,
            hop: 0,
            symbol: ANCHOR_SYMBOL.to_string(),
            text: anchor.text.clone(),
        });
    }

    let mut frontier = vec![Pending {
        rel_path: loc.rel_path.clone(),
        abs_path: loc.abs_path.clone(),
        kind: "method_declaration".to_string(),
        start: anchor.start,
        end: anchor.end,
    }];

    for hop in 0..opt.max_hops {
        if budget_reached(&pack, opt) {
            break;
        }

        let mut next_frontier: Vec<Pending> = Vec::new();

        for pending in &frontier {
            if budget_reached(&pack, opt) {
                break;
            }
            if !is_expandable_kind(&pending.kind) {
                continue;
            }

            let mut callees = harvest_callees(&pending.abs_path, pending.start, pending.end);
            callees.truncate(opt.max_symbols_per_method);

            for sym in callees {
                if budget_reached(&pack, opt) {
                    break;
                }

                pack.stats.symbols_seen += 1;

                // Avoid exploding on repeated symbols within a hop.
                if !seen_symbols.insert((hop, sym.clone())) {
                    continue;
                }

                let query = SearchQuery {
                    pattern: call_site_pattern(&sym),
                    fixed_string: false,
                    include_globs: req.include_globs.clone(),
                    exclude_globs: req.exclude_globs.clone(),
                };

                pack.stats.search_queries += 1;
                let result = rg_search_json(&req.repo_root, &query)?;
                if result.exit_code == 2 {
                    continue;
                }
                pack.stats.search_hits_total += result.hits.len();

                let take = result.hits.len().min(opt.max_hits_per_symbol);
                let mut cands: Vec<(HitSnippet, i32)> = Vec::with_capacity(take);

                for hit in &result.hits[..take] {
                    let snip = snippet_from_hit(&hit.abs_path, &hit.rel_path, hit.match_byte_offset);
                    if !snip.found {
                        continue;
                    }
                    if seen_snips.contains(&snip_key(&snip.rel_path, snip.start, snip.end)) {
                        continue;
                    }
                    let score = score_snippet(&loc.rel_path, &snip);
                    cands.push((snip, score));
                }

                if cands.is_empty() {
                    continue;
                }

                // Stable sort: equal scores keep arrival order.
                cands.sort_by(|a, b| b.1.cmp(&a.1));

                let emit_count = opt.max_snippets_per_symbol.max(1);
                for (snip, score) in cands.into_iter().take(emit_count) {
                    seen_snips.insert(snip_key(&snip.rel_path, snip.start, snip.end));

                    if pack.stats.bytes_written + snip.text.len() > opt.max_bytes {
                        break;
                    }

                    if is_expandable_kind(&snip.kind) {
                        next_frontier.push(Pending {
                            rel_path: snip.rel_path.clone(),
                            abs_path: snip.abs_path.clone(),
                            kind: snip.kind.clone(),
                            start: snip.start,
                            end: snip.end,
                        });
                    }

                    pack.stats.snippets_written += 1;
                    pack.stats.bytes_written += snip.text.len();
                    pack.snippets.push(ContextSnippet {
                        rel_path: snip.rel_path,
                        abs_path: snip.abs_path,
                        kind: snip.kind,
                        start: snip.start,
                        end: snip.end,
                        score,
                        hop: hop + 1,
                        symbol: sym.clone(),
                        text: snip.text,
                    });

                    if budget_reached(&pack, opt) {
                        break;
                    }
                }
            }
        }

        pack.stats.hops_used = hop + 1;
        frontier = next_frontier;
        if frontier.is_empty() {
            break;
        }
    }

    Ok(pack)
}

/// Run the context command: resolve the anchor from flags and/or a
/// prompt file, build the pack, and write the serialized form to `out`
/// (`-` for stdout).
///
/// `cli_root` is the `--root` flag only when the user actually passed
/// it; an explicit flag beats the prompt file's `repo_root`.
#[allow(clippy::too_many_arguments)]
pub fn run_context(
    cli_root: Option<&Path>,
    prompt: Option<&Path>,
    class: Option<&str>,
    method: Option<&str>,
    out: &Path,
    include_globs: Vec<String>,
    exclude_globs: Vec<String>,
    mut opt: ContextOptions,
    show_stats: bool,
) -> Result<()> {
    let mut root = PathBuf::from(".");
    let mut class_name = class.map(|s| s.to_string());
    let mut method_name = method.map(|s| s.to_string());

    if let Some(prompt_path) = prompt {
        let spec = parse_prompt_file(prompt_path)?;
        if let Some(prompt_root) = spec.repo_root {
            root = prompt_root;
        }
        if class_name.is_none() {
            class_name = Some(spec.anchor_class);
        }
        if method_name.is_none() {
            method_name = Some(spec.anchor_method);
        }
        if let Some(hops) = spec.scope.to_hops() {
            opt.max_hops = hops;
        }
    }

    // CLI overrides prompt
    if let Some(r) = cli_root {
        root = r.to_path_buf();
    }

    let (class_name, method_name) = match (class_name, method_name) {
        (Some(c), Some(m)) => (c, m),
        _ => bail!("missing anchor: provide --prompt or both --class and --method"),
    };

    let files = scan_workspace(&root, &ScanOptions::default())?;
    let mut req = ContextRequest::new(root, class_name, method_name);
    if !include_globs.is_empty() {
        req.include_globs = include_globs;
    }
    req.exclude_globs = exclude_globs;
    let pack = build_context_pack(&req, &opt, &files)?;

    let doc = render_pack(&req, &opt, &pack);
    write_out(out, &doc)?;

    if show_stats {
        eprintln!("context pack:");
        eprintln!("  snippets: {}", pack.stats.snippets_written);
        eprintln!("  bytes: {}", pack.stats.bytes_written);
        eprintln!("  hops: {}", pack.stats.hops_used);
        eprintln!("  estimated tokens: {}", estimate_pack_tokens(&pack));
    }

    if pack.snippets.is_empty() {
        bail!("no snippets produced (anchor not found or extraction failed)");
    }

    Ok(())
}
