//! Java source analysis
//!
//! Class location by fully qualified name, method extraction,
//! enclosing-scope resolution and callee harvesting. Everything here is
//! approximate by design: no build metadata, no compiler, just the
//! inventory, the syntax tree and path heuristics.

use anyhow::{anyhow, Result};
use tree_sitter::{Language, Parser, Tree};

pub mod extract;
pub mod harvest;
pub mod locate;
pub mod resolve;

/// Parse a Java source buffer into a fresh syntax tree.
///
/// Each call constructs and releases its own parser; nothing outlives a
/// single operation.
pub(crate) fn parse_java(source: &[u8]) -> Result<Tree> {
    let language: Language = tree_sitter_java::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| anyhow!("failed to load java grammar: {}", e))?;
    parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("parse produced no tree"))
}
