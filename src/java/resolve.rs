//! Enclosing-scope resolution
//!
//! Promotes a raw byte offset (typically a search hit) to the smallest
//! enclosing declaration worth quoting: method, constructor, class,
//! interface, enum or record. Falls back to the whole file when no
//! preferred ancestor exists.

use std::path::Path;
use tree_sitter::Node;

use crate::core::model::HitSnippet;
use crate::core::util::{bytes_to_string, read_file_bytes};
use crate::java::parse_java;

/// Declaration kinds a hit is promoted into, in no particular order.
pub const PREFERRED_TYPES: [&str; 6] = [
    "method_declaration",
    "constructor_declaration",
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

pub fn is_preferred_type(kind: &str) -> bool {
    PREFERRED_TYPES.contains(&kind)
}

fn climb_to_preferred(node: Node) -> Option<Node> {
    let mut cur = Some(node);
    while let Some(n) = cur {
        if is_preferred_type(n.kind()) {
            return Some(n);
        }
        cur = n.parent();
    }
    None
}

/// Resolve the enclosing declaration of `hit_byte_offset` in a file.
pub fn snippet_from_hit(abs_path: &Path, rel_path: &str, hit_byte_offset: u64) -> HitSnippet {
    let mut out = HitSnippet {
        abs_path: abs_path.to_path_buf(),
        rel_path: rel_path.to_string(),
        ..Default::default()
    };

    let src = match read_file_bytes(abs_path) {
        Ok(s) => s,
        Err(_) => {
            out.reason = "failed to read file".to_string();
            return out;
        }
    };

    if hit_byte_offset >= src.len() as u64 {
        out.reason = "hit byte offset out of range".to_string();
        return out;
    }

    let tree = match parse_java(&src) {
        Ok(t) => t,
        Err(e) => {
            out.reason = format!("parser init failed: {}", e);
            return out;
        }
    };

    let root = tree.root_node();
    let offset = hit_byte_offset as usize;

    let leaf = match root.descendant_for_byte_range(offset, offset) {
        Some(n) => n,
        None => {
            out.reason = "no node spans the hit offset".to_string();
            return out;
        }
    };

    // Whole file when nothing preferred encloses the hit.
    let best = climb_to_preferred(leaf).unwrap_or(root);

    let (start, end) = (best.start_byte(), best.end_byte());
    if start > end || end > src.len() {
        out.reason = "invalid node byte range".to_string();
        return out;
    }

    out.found = true;
    out.kind = best.kind().to_string();
    out.start = start;
    out.end = end;
    out.text = bytes_to_string(&src[start..end]);
    out.reason = "tree-sitter enclosing node".to_string();
    out
}
