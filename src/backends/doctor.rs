//! Doctor - Dependency checking

use anyhow::Result;
use colored::Colorize;

use crate::backends::rg::is_rg_available;

/// Dependency status
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub required: bool,
    pub notes: Option<String>,
}

/// Check all dependencies
pub fn check_dependencies() -> Vec<DependencyStatus> {
    let mut deps = Vec::new();

    // ripgrep (required for search and context commands)
    deps.push(DependencyStatus {
        name: "ripgrep".to_string(),
        available: is_rg_available(),
        required: true,
        notes: Some("Install: brew install ripgrep / cargo install ripgrep".to_string()),
    });

    // Java grammar is linked into the binary; report it for completeness.
    deps.push(DependencyStatus {
        name: "tree-sitter-java".to_string(),
        available: true,
        required: true,
        notes: Some("statically linked grammar".to_string()),
    });

    deps
}

/// Run the doctor command
pub fn run_doctor() -> Result<()> {
    let deps = check_dependencies();
    let mut missing_required = false;

    for dep in &deps {
        let status = if dep.available {
            "ok".green()
        } else {
            "missing".red()
        };
        let required = if dep.required { "required" } else { "optional" };

        print!("{:<18} {} ({})", dep.name, status, required);
        if let Some(notes) = &dep.notes {
            print!(" - {}", notes);
        }
        println!();

        if dep.required && !dep.available {
            missing_required = true;
        }
    }

    if missing_required {
        eprintln!("\nsome required dependencies are missing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dependencies() {
        let deps = check_dependencies();
        assert!(!deps.is_empty());

        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert!(names.contains(&"ripgrep"));
        assert!(names.contains(&"tree-sitter-java"));
    }

    #[test]
    fn test_grammar_is_always_available() {
        let deps = check_dependencies();
        let grammar = deps.iter().find(|d| d.name == "tree-sitter-java").unwrap();
        assert!(grammar.available);
    }
}
