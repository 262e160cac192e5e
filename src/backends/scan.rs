//! Workspace scanning backend
//!
//! Walks the repository root and produces the filtered, sorted file
//! inventory every other stage works from. No gitignore semantics: the
//! walk is governed only by the explicit exclusion set and extension
//! filter so the inventory is reproducible across checkouts.

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::Path;

use crate::core::model::FileEntry;
use crate::core::paths::{absolutize, make_relative};

/// Options for the workspace scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory names pruned wherever they appear in the tree.
    pub exclude_dir_names: Vec<String>,
    /// Path suffixes a file must carry to be included.
    pub include_exts: Vec<String>,
    /// Files larger than this are dropped from the inventory.
    pub max_file_size_bytes: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_dir_names: [
                ".git",
                ".idea",
                ".venv",
                ".run",
                ".oca",
                "build",
                "build_config",
                "out",
                "target",
                "node_modules",
                "codegen",
                "resources",
                "environment-config",
                "config",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            include_exts: vec![".java".to_string()],
            max_file_size_bytes: 2 * 1024 * 1024,
        }
    }
}

fn has_included_ext(exts: &[String], path: &Path) -> bool {
    let s = path.to_string_lossy();
    exts.iter().any(|e| s.ends_with(e.as_str()))
}

/// Scan the workspace under `root` and return the sorted inventory.
///
/// Per-entry failures (permission denied, stat errors) are swallowed and
/// the walk continues; only a missing root is fatal. Symbolic links are
/// not followed. Entries come back sorted by relative path so downstream
/// tie-breaking is stable.
pub fn scan_workspace(root: &Path, opt: &ScanOptions) -> Result<Vec<FileEntry>> {
    let abs_root = absolutize(root);
    if !abs_root.is_dir() {
        bail!("scan root not found: {}", root.display());
    }

    let skip: HashSet<String> = opt.exclude_dir_names.iter().cloned().collect();

    let mut builder = WalkBuilder::new(&abs_root);
    builder
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .map(|name| !skip.contains(name))
                .unwrap_or(true)
        });

    let mut out = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        if !has_included_ext(&opt.include_exts, path) {
            continue;
        }

        let size_bytes = match entry.metadata() {
            Ok(md) => md.len(),
            Err(_) => continue,
        };
        if size_bytes > opt.max_file_size_bytes {
            continue;
        }

        let rel_path = match make_relative(path, &abs_root) {
            Some(r) if !r.is_empty() => r,
            _ => continue,
        };

        out.push(FileEntry {
            rel_path,
            abs_path: path.to_path_buf(),
            size_bytes,
        });
    }

    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(out)
}
