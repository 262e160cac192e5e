//! ctxforge - a context pack builder for code-generation prompts
//!
//! ctxforge provides:
//! - Workspace scanning with a configurable exclusion set
//! - Heuristic class location by fully qualified name
//! - Tree-sitter-driven method extraction and scope resolution
//! - A ripgrep search driver with global byte offsets
//! - A budgeted breadth-first context builder

use anyhow::Result;
use clap::Parser;

mod backends;
mod cli;
mod core;
mod flows;
mod java;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
