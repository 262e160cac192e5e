//! Method extraction
//!
//! Pulls the byte range and text of the first implemented declaration of
//! a named method out of a file. Tree-sitter drives the search; a
//! best-effort text scan takes over when no tree can be produced.

use regex::bytes::Regex;
use std::path::Path;
use tree_sitter::Node;

use crate::core::model::Method;
use crate::core::util::{bytes_to_string, read_file_bytes};
use crate::java::parse_java;

/// Extract the first implemented declaration of `method_name`.
///
/// Declarations without a body (abstract methods, interface methods) are
/// skipped. The returned range covers the whole declaration, header
/// through closing brace.
pub fn extract_method(abs_path: &Path, rel_path: &str, method_name: &str) -> Method {
    let mut out = Method {
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

    let tree = match parse_java(&src) {
        Ok(t) => t,
        Err(_) => return extract_method_text(&src, out, method_name),
    };

    let method = match find_first_method_decl(tree.root_node(), &src, method_name) {
        Some(n) => n,
        None => {
            out.reason = "method_declaration not found (or no body)".to_string();
            return out;
        }
    };

    let (start, end) = (method.start_byte(), method.end_byte());
    if start > end || end > src.len() {
        out.reason = "invalid node byte range".to_string();
        return out;
    }

    out.found = true;
    out.start = start;
    out.end = end;
    out.text = bytes_to_string(&src[start..end]);
    out.reason = "tree-sitter method_declaration match".to_string();
    out
}

/// Depth-first walk for the first `method_declaration` whose name matches
/// and which carries a body.
fn find_first_method_decl<'t>(root: Node<'t>, src: &[u8], method_name: &str) -> Option<Node<'t>> {
    let mut cursor = root.walk();

    'walk: loop {
        let n = cursor.node();
        if n.kind() == "method_declaration" {
            if let Some(name) = n.child_by_field_name("name") {
                let text = &src[name.start_byte()..name.end_byte().min(src.len())];
                if text == method_name.as_bytes() && n.child_by_field_name("body").is_some() {
                    return Some(n);
                }
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        if cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                break 'walk;
            }
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
        }
    }

    None
}

/// Text-only fallback: name + parameter list + brace matching.
///
/// Best effort: braces inside strings and comments are not ignored.
fn extract_method_text(src: &[u8], mut out: Method, method_name: &str) -> Method {
    let pattern = format!(r"\b{}\s*\(", regex::escape(method_name));
    let re = match Regex::new(&pattern) {
        Ok(r) => r,
        Err(_) => {
            out.reason = "invalid method name".to_string();
            return out;
        }
    };

    let m = match re.find(src) {
        Some(m) => m,
        None => {
            out.reason = "method name not found".to_string();
            return out;
        }
    };

    let name_pos = m.start();
    let open_paren = m.end() - 1;

    let after_params = match walk_paren_list(src, open_paren) {
        Some(i) => i,
        None => {
            out.reason = "unbalanced parameter list".to_string();
            return out;
        }
    };

    let open_brace = match find_body_brace(src, after_params) {
        Some(i) => i,
        None => {
            out.reason =
                "found name, but could not locate method body (maybe abstract/interface?)"
                    .to_string();
            return out;
        }
    };

    let end = match brace_match(src, open_brace) {
        Some(i) => i,
        None => {
            out.reason = "failed to brace-match method body".to_string();
            return out;
        }
    };

    out.found = true;
    out.start = name_pos;
    out.end = end;
    out.text = bytes_to_string(&src[name_pos..end]);
    out.reason = "extracted by text match (fallback)".to_string();
    out
}

/// Walk from an opening '(' past its matching ')'; returns the index
/// just after the ')'.
fn walk_paren_list(src: &[u8], open_paren: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &c) in src.iter().enumerate().skip(open_paren) {
        match c {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Scan forward for the '{' that begins the body, tolerating `throws`
/// clauses. A ';' first means there is no body.
fn find_body_brace(src: &[u8], from: usize) -> Option<usize> {
    for (i, &c) in src.iter().enumerate().skip(from) {
        match c {
            b'{' => return Some(i),
            b';' => return None,
            _ => {}
        }
    }
    None
}

/// Match from an opening '{' to just past its closing '}'.
fn brace_match(src: &[u8], open_brace: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &c) in src.iter().enumerate().skip(open_brace) {
        match c {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
