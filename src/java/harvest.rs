//! Callee harvesting
//!
//! Collects the distinct method names invoked inside a method or
//! constructor body, filtered against a stop list of ubiquitous noise
//! methods that would otherwise dominate every search.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;
use tree_sitter::Node;

use crate::core::util::read_file_bytes;
use crate::java::parse_java;

/// Method names too common to be worth chasing.
static NOISE_METHODS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "toString", "hashCode", "equals", "getClass", "notify", "notifyAll", "wait", "size",
        "isEmpty", "get", "set", "add", "remove", "contains", "stream", "map", "flatMap",
        "filter", "collect", "forEach", "of", "valueOf",
    ]
    .into_iter()
    .collect()
});

fn is_noise_method(name: &str) -> bool {
    name.len() < 2 || NOISE_METHODS.contains(name)
}

/// The called name of a `method_invocation` node: the `name` field for
/// plain calls, the `member` field for qualified calls, else the first
/// identifier among named children.
fn invocation_name_node<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(name);
    }
    if let Some(member) = node.child_by_field_name("member") {
        return Some(member);
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "identifier");
    found
}

fn node_text<'s>(src: &'s [u8], node: Node) -> &'s [u8] {
    let (a, b) = (node.start_byte(), node.end_byte());
    if a > b || b > src.len() {
        return &[];
    }
    &src[a..b]
}

/// Harvest the distinct, noise-filtered callee names inside the method or
/// constructor whose body spans `[start, end)`.
///
/// The offset is climbed to its enclosing `method_declaration` or
/// `constructor_declaration`; no such ancestor means no callees. Output
/// is sorted ascending for deterministic downstream ordering. Read and
/// parse failures yield an empty result.
pub fn harvest_callees(abs_path: &Path, start: usize, end: usize) -> Vec<String> {
    let src = match read_file_bytes(abs_path) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    if start >= src.len() || end > src.len() || start >= end {
        return Vec::new();
    }

    let tree = match parse_java(&src) {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };

    let leaf = match tree.root_node().descendant_for_byte_range(start, start) {
        Some(n) => n,
        None => return Vec::new(),
    };

    let mut scope = Some(leaf);
    while let Some(n) = scope {
        if n.kind() == "method_declaration" || n.kind() == "constructor_declaration" {
            break;
        }
        scope = n.parent();
    }
    let method = match scope {
        Some(n) => n,
        None => return Vec::new(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    // Full subtree traversal of the enclosing method.
    let mut cursor = method.walk();
    'walk: loop {
        let n = cursor.node();
        if n.kind() == "method_invocation" {
            if let Some(name_node) = invocation_name_node(n) {
                let text = node_text(&src, name_node);
                if !text.is_empty() {
                    let name = String::from_utf8_lossy(text).into_owned();
                    if !is_noise_method(&name) && seen.insert(name.clone()) {
                        out.push(name);
                    }
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

    out.sort();
    out
}
