//! ripgrep integration
//!
//! Invokes `rg --json` as a subprocess and parses the newline-delimited
//! match records into byte-offset-precise hits. The exit code follows the
//! conventional three-value contract: 0 = hits, 1 = no hits, 2 = tool
//! error. Only a failure to run the tool at all is escalated to the
//! caller; everything else is surfaced in the result.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::core::paths::{absolutize, make_relative, normalize_path};
use crate::core::util::command_exists;

const RG_BIN: &str = "rg";

/// A search request: pattern plus glob filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub pattern: String,
    /// Treat the pattern as a literal string (`-F`).
    pub fixed_string: bool,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
}

/// One match, placed globally in its file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub abs_path: PathBuf,
    pub rel_path: String,
    pub line_number: u64,
    /// Byte offset of the first submatch, from the start of the file.
    pub match_byte_offset: u64,
    pub match_len: u32,
}

/// Outcome of one search-tool invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Hits in the order the tool produced them.
    pub hits: Vec<SearchHit>,
}

/// Failure to run the external search tool at all. Per-query failures
/// (exit code 2) are not errors; they live in `SearchResult`.
#[derive(Debug, Error)]
pub enum SearchToolError {
    #[error("failed to run search tool '{tool}': {source}")]
    Run {
        tool: &'static str,
        source: std::io::Error,
    },
}

/// Check if ripgrep is available
pub fn is_rg_available() -> bool {
    command_exists(RG_BIN)
}

/// Parse one `rg --json` output line into a hit.
///
/// Lines that are not match records, or that lack the absolute offset
/// needed to place the match globally, yield `None` and are discarded.
fn parse_match_line(line: &str, repo_abs: &Path) -> Option<SearchHit> {
    let v: serde_json::Value = serde_json::from_str(line).ok()?;

    if v.get("type").and_then(|t| t.as_str()) != Some("match") {
        return None;
    }

    // rg nests the payload under "data"; tolerate flattened records too.
    let data = v.get("data").unwrap_or(&v);

    let path_text = data
        .get("path")
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())?;

    let line_number = data
        .get("line_number")
        .and_then(|n| n.as_u64())
        .unwrap_or(0);

    // Without the absolute offset the match cannot be placed globally.
    let absolute_offset = data.get("absolute_offset").and_then(|n| n.as_u64())?;

    let first_sub = data
        .get("submatches")
        .and_then(|s| s.as_array())
        .and_then(|a| a.first())?;
    let sub_start = first_sub.get("start").and_then(|n| n.as_u64())?;
    let sub_end = first_sub.get("end").and_then(|n| n.as_u64())?;
    if sub_end < sub_start {
        return None;
    }

    let p = Path::new(path_text);
    let abs_path = if p.is_absolute() {
        p.to_path_buf()
    } else {
        repo_abs.join(p)
    };

    let rel_path =
        make_relative(&abs_path, repo_abs).unwrap_or_else(|| normalize_path(&abs_path));

    Some(SearchHit {
        abs_path,
        rel_path,
        line_number,
        match_byte_offset: absolute_offset + sub_start,
        match_len: (sub_end - sub_start) as u32,
    })
}

/// Run the search tool over `repo_root` and collect global hits.
///
/// Argument order is part of the collaborator contract: `--json`,
/// optional `-F`, `-g <glob>` per include, `-g !<glob>` per exclude, the
/// pattern, then the root. The tool's stderr flows through to ours.
pub fn rg_search_json(repo_root: &Path, query: &SearchQuery) -> Result<SearchResult> {
    let mut res = SearchResult::default();

    if query.pattern.is_empty() {
        res.exit_code = 2;
        res.error = Some("empty pattern".to_string());
        return Ok(res);
    }

    let repo_abs = absolutize(repo_root);

    let mut cmd = Command::new(RG_BIN);
    cmd.arg("--json");

    if query.fixed_string {
        cmd.arg("-F");
    }

    for glob in &query.include_globs {
        cmd.arg("-g").arg(glob);
    }

    for glob in &query.exclude_globs {
        cmd.arg("-g").arg(format!("!{}", glob));
    }

    cmd.arg(&query.pattern).arg(repo_root);
    cmd.stdin(Stdio::null()).stderr(Stdio::inherit());

    let output = cmd.output().map_err(|source| SearchToolError::Run {
        tool: RG_BIN,
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(hit) = parse_match_line(line, &repo_abs) {
            res.hits.push(hit);
        }
    }

    res.exit_code = output.status.code().unwrap_or(2);
    if res.exit_code == 2 {
        res.error = Some("search tool failed (exit=2)".to_string());
    }

    Ok(res)
}
