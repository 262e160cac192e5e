//! Class location by fully qualified name
//!
//! Maps `a.b.C` to a file in the inventory without build metadata. Path
//! suffix matching selects candidates, then cheap text checks (package
//! line, type declaration) and path heuristics rank them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::model::{ClassLocation, FileEntry};

/// Lines scanned from the top of a file for the package declaration.
const PACKAGE_SCAN_LINES: usize = 256;
/// Lines scanned for a matching type declaration.
const DECL_SCAN_LINES: usize = 2048;

// a.b.C -> a/b/C.java
fn path_suffix(fqcn: &str) -> String {
    let mut out = fqcn.replace('.', "/");
    out.push_str(".java");
    out
}

// a.b.C -> C
fn simple_name(fqcn: &str) -> &str {
    fqcn.rsplit('.').next().unwrap_or(fqcn)
}

// a.b.C -> a.b
fn package_name(fqcn: &str) -> &str {
    match fqcn.rfind('.') {
        Some(pos) => &fqcn[..pos],
        None => "",
    }
}

/// True if a `package <pkg>;` line appears before the first type
/// declaration, within the scan window. I/O errors read as false.
fn file_contains_package_line(abs_path: &Path, pkg: &str) -> bool {
    if pkg.is_empty() {
        return false;
    }
    let file = match File::open(abs_path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let needle = format!("package {};", pkg);
    for line in BufReader::new(file).lines().take(PACKAGE_SCAN_LINES) {
        let line = match line {
            Ok(l) => l,
            Err(_) => return false,
        };
        let t = line.trim_start();
        if t.starts_with(&needle) {
            return true;
        }
        if t.contains("class ")
            || t.contains("interface ")
            || t.contains("enum ")
            || t.contains("record ")
        {
            break;
        }
    }
    false
}

/// True if any type-declaration form for `simple` appears in the scan
/// window. Substring match suffices.
fn file_contains_type_decl(abs_path: &Path, simple: &str) -> bool {
    let file = match File::open(abs_path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let patterns = [
        format!("class {}", simple),
        format!("interface {}", simple),
        format!("enum {}", simple),
        format!("record {}", simple),
    ];

    for line in BufReader::new(file).lines().take(DECL_SCAN_LINES) {
        let line = match line {
            Ok(l) => l,
            Err(_) => return false,
        };
        if patterns.iter().any(|p| line.contains(p.as_str())) {
            return true;
        }
    }
    false
}

fn score_path(rel_path: &str) -> i32 {
    let mut score = 0;

    if rel_path.contains("/src/main/java/") {
        score += 50;
    }
    if rel_path.contains("/src/test/java/") {
        score += 20;
    }
    if rel_path.contains("/target/") {
        score -= 80;
    }
    if rel_path.contains("/build/") {
        score -= 80;
    }

    score
}

/// Resolve a fully qualified class name against the inventory.
///
/// Candidates matching the full package path win over bare file-name
/// matches; ties keep inventory order. The reason string records the
/// winning score and both text checks for diagnostics.
pub fn locate_class(files: &[FileEntry], fqcn: &str) -> ClassLocation {
    if fqcn.is_empty() {
        return ClassLocation {
            found: false,
            reason: "empty class name".to_string(),
            ..Default::default()
        };
    }

    let suffix = path_suffix(fqcn);
    let simple = simple_name(fqcn);
    let pkg = package_name(fqcn);

    let mut candidates: Vec<&FileEntry> = files
        .iter()
        .filter(|fe| fe.rel_path.ends_with(&suffix))
        .collect();

    if candidates.is_empty() {
        let file_name = format!("{}.java", simple);
        candidates = files
            .iter()
            .filter(|fe| fe.rel_path.ends_with(&file_name))
            .collect();
    }

    if candidates.is_empty() {
        return ClassLocation {
            found: false,
            reason: "no candidates by path".to_string(),
            ..Default::default()
        };
    }

    struct Scored<'a> {
        fe: &'a FileEntry,
        score: i32,
        pkg_ok: bool,
        decl_ok: bool,
    }

    let mut scored: Vec<Scored> = candidates
        .iter()
        .map(|fe| {
            let pkg_ok = file_contains_package_line(&fe.abs_path, pkg);
            let decl_ok = file_contains_type_decl(&fe.abs_path, simple);
            let mut score = score_path(&fe.rel_path);
            if pkg_ok {
                score += 30;
            }
            if decl_ok {
                score += 30;
            }
            Scored {
                fe,
                score,
                pkg_ok,
                decl_ok,
            }
        })
        .collect();

    // Stable sort keeps inventory order on ties.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    let best = &scored[0];

    ClassLocation {
        found: true,
        abs_path: best.fe.abs_path.clone(),
        rel_path: best.fe.rel_path.clone(),
        reason: format!(
            "best score={} pkg_ok={} decl_ok={}",
            best.score, best.pkg_ok as u8, best.decl_ok as u8
        ),
    }
}
