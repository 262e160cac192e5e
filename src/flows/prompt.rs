//! Prompt file parsing
//!
//! A prompt file carries the anchor in a `[HINTS]` block of `key=value`
//! lines plus an optional free-text `[TASK]` block:
//!
//! ```text
//! [HINTS]
//! repo_root=..
//! anchor_class=com.foo.Bar
//! anchor_method=baz
//! scope=local|deps|deep|auto
//! [/HINTS]
//! [TASK] rename the method and update all callers [/TASK]
//! ```

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// How far the call exploration should reach, as hinted by the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Keep the configured hop budget.
    #[default]
    Auto,
    Local,
    Deps,
    Deep,
}

impl Scope {
    /// Hop budget for this scope; `Auto` leaves the default in place.
    pub fn to_hops(self) -> Option<u32> {
        match self {
            Scope::Local => Some(0),
            Scope::Deps => Some(1),
            Scope::Deep => Some(3),
            Scope::Auto => None,
        }
    }
}

fn parse_scope(value: &str) -> Scope {
    match value.trim().to_lowercase().as_str() {
        "local" => Scope::Local,
        "deps" => Scope::Deps,
        "deep" => Scope::Deep,
        _ => Scope::Auto,
    }
}

/// Parsed prompt: the anchor plus optional overrides and task text.
#[derive(Debug, Clone, Default)]
pub struct PromptSpec {
    pub repo_root: Option<PathBuf>,
    pub anchor_class: String,
    pub anchor_method: String,
    pub scope: Scope,
    pub task_text: String,
}

fn find_section<'s>(src: &'s str, open_tag: &str, close_tag: &str) -> Option<&'s str> {
    let a = src.find(open_tag)? + open_tag.len();
    let b = src[a..].find(close_tag)? + a;
    Some(&src[a..b])
}

/// Parse a prompt file. Missing `[HINTS]` or a missing anchor is an error.
pub fn parse_prompt_file(path: &Path) -> Result<PromptSpec> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read prompt file: {}", path.display()))?;

    let hints = match find_section(&src, "[HINTS]", "[/HINTS]") {
        Some(body) => body,
        None => bail!("missing [HINTS]...[/HINTS] section"),
    };

    let mut spec = PromptSpec::default();

    for raw in hints.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "repo_root" => spec.repo_root = Some(PathBuf::from(value)),
            "anchor_class" | "class" => spec.anchor_class = value.to_string(),
            "anchor_method" | "method" => spec.anchor_method = value.to_string(),
            "scope" => spec.scope = parse_scope(value),
            _ => {}
        }
    }

    if let Some(task) = find_section(&src, "[TASK]", "[/TASK]") {
        spec.task_text = task.trim().to_string();
    }

    if spec.anchor_class.is_empty() {
        bail!("missing anchor_class in [HINTS]");
    }
    if spec.anchor_method.is_empty() {
        bail!("missing anchor_method in [HINTS]");
    }

    Ok(spec)
}
