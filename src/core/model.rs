//! Context-pack data model
//!
//! All pipeline stages (scanner, locator, extractor, resolver, search
//! driver, builder) produce and consume these types. Byte ranges are
//! inclusive-exclusive `[start, end)` offsets into the owning file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One source file in the workspace inventory.
///
/// `rel_path` is relative to the scan root and uses '/' as separator;
/// it never escapes the root. Entries are immutable once scanned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub size_bytes: u64,
}

/// Result of resolving a fully qualified class name to a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassLocation {
    pub found: bool,
    pub abs_path: PathBuf,
    pub rel_path: String,
    /// Free-form diagnostics: winning score and heuristic check outcomes.
    pub reason: String,
}

/// Result of extracting a named method from a file.
///
/// When `found`, `end > start`, both offsets lie within the file, and
/// `text` equals the file's bytes on `[start, end)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Method {
    pub found: bool,
    pub abs_path: PathBuf,
    pub rel_path: String,
    pub start: usize,
    pub end: usize,
    pub reason: String,
    pub text: String,
}

/// Enclosing scope of a byte-offset hit.
///
/// `kind` is the syntax-node label of the enclosing declaration, e.g.
/// `method_declaration` or `class_declaration`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HitSnippet {
    pub found: bool,
    pub abs_path: PathBuf,
    pub rel_path: String,
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub reason: String,
    pub text: String,
}

/// An entry in the final context pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub score: i32,
    /// BFS distance from the anchor; the anchor itself is hop 0.
    pub hop: u32,
    /// The callee name that caused this snippet (`"ANCHOR"` for the anchor).
    pub symbol: String,
    pub text: String,
}

/// Counters accumulated while building a pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStats {
    pub hops_used: u32,
    pub snippets_written: usize,
    pub bytes_written: usize,
    pub symbols_seen: usize,
    pub search_queries: usize,
    pub search_hits_total: usize,
}

/// The ordered snippet list plus stats returned by the builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextPack {
    pub snippets: Vec<ContextSnippet>,
    pub stats: ContextStats,
}

/// Input to the builder: where to look and what to anchor on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRequest {
    pub repo_root: PathBuf,
    pub anchor_class: String,
    pub anchor_method: String,
    /// Search include globs, passed through to the search tool.
    pub include_globs: Vec<String>,
    /// Search exclude globs (negated on the tool command line).
    pub exclude_globs: Vec<String>,
}

impl ContextRequest {
    pub fn new(
        repo_root: impl Into<PathBuf>,
        anchor_class: impl Into<String>,
        anchor_method: impl Into<String>,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            anchor_class: anchor_class.into(),
            anchor_method: anchor_method.into(),
            include_globs: vec!["*.java".to_string()],
            exclude_globs: Vec::new(),
        }
    }
}

/// Budgets and caps enforced by the builder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContextOptions {
    pub max_hops: u32,
    pub max_snippets: usize,
    pub max_bytes: usize,
    pub max_symbols_per_method: usize,
    pub max_hits_per_symbol: usize,
    /// Top candidates emitted per callee; treated as at least 1.
    pub max_snippets_per_symbol: usize,
    pub include_anchor_in_snippets: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_hops: 2,
            max_snippets: 20,
            max_bytes: 120_000,
            max_symbols_per_method: 12,
            max_hits_per_symbol: 6,
            max_snippets_per_symbol: 1,
            include_anchor_in_snippets: true,
        }
    }
}
