//! CLI module - Command-line interface definitions and handlers

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::backends::rg::{rg_search_json, SearchQuery};
use crate::backends::scan::{scan_workspace, ScanOptions};
use crate::core::model::ContextOptions;
use crate::core::render::render_jsonl;
use crate::core::util::write_out;
use crate::java::extract::extract_method;
use crate::java::locate::locate_class;
use crate::java::resolve::snippet_from_hit;

/// ctxforge - build budgeted source-code context packs around a code anchor.
#[derive(Parser, Debug)]
#[command(name = "ctxforge")]
#[command(
    author,
    version,
    about,
    long_about = r#"ctxforge assembles a bounded, ranked set of source snippets around an
anchor (a fully qualified class name plus a method name) so a downstream
code-generation model sees the code that actually matters.

The pipeline: scan the workspace, locate the anchor class, extract the
anchor method, then breadth-first over its callees - search call sites,
promote hits to their enclosing declarations, rank, and emit under hop,
snippet and byte budgets.

Examples:
    ctxforge scan --limit 20
    ctxforge locate --class com.foo.Bar
    ctxforge extract --class com.foo.Bar --method baz
    ctxforge search --pattern 'charge\('
    ctxforge context --class com.foo.Bar --method baz --out -
    ctxforge ask --prompt prompt.txt
"#
)]
pub struct Cli {
    /// Repository root for all operations.
    #[arg(
        long,
        global = true,
        value_name = "ROOT",
        long_help = "Repository root for all operations (defaults to the current directory).\n\n\
All paths emitted in results are relative to this root. For the context\n\
command an explicit --root overrides a repo_root carried by the prompt file;\n\
when the flag is absent the prompt's repo_root applies."
    )]
    pub root: Option<PathBuf>,

    /// Disable colored output (when applicable).
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the workspace and print the file inventory.
    #[command(
        long_about = "Scan the workspace under ROOT and emit one JSON line per source file.\n\
Output is sorted by relative path for stability.\n\n\
Examples:\n\
  ctxforge scan\n\
  ctxforge scan --limit 20\n"
    )]
    Scan {
        /// Print at most N entries.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Resolve a fully qualified class name to a file.
    #[command(
        long_about = "Resolve a fully qualified class name against the inventory using path\n\
suffix matching plus package/declaration checks, and print the result as JSON.\n\n\
Exits 1 when no candidate is found.\n\n\
Example:\n\
  ctxforge locate --class com.foo.Bar\n"
    )]
    Locate {
        /// Fully qualified class name (e.g. com.foo.Bar).
        #[arg(long, value_name = "FQCN")]
        class: String,
    },

    /// Extract a method body by class and method name.
    #[command(
        long_about = "Locate the class, extract the first implemented declaration of the method,\n\
and print a small header followed by the method text.\n\n\
Example:\n\
  ctxforge extract --class com.foo.Bar --method baz\n"
    )]
    Extract {
        /// Fully qualified class name.
        #[arg(long, value_name = "FQCN")]
        class: String,

        /// Method name inside the class.
        #[arg(long, value_name = "NAME")]
        method: String,

        /// Output path ('-' for stdout).
        #[arg(long, default_value = "-", value_name = "PATH")]
        out: PathBuf,
    },

    /// Search file contents with byte-offset-precise hits.
    #[command(
        long_about = r#"Run the external search tool (rg --json) and print one row per hit with
its global byte offset. Defaults to searching *.java files.

Examples:
    ctxforge search --pattern 'charge\('
    ctxforge search --pattern TODO --glob '*.java' --exclude 'gen/**'
"#
    )]
    Search {
        /// Search pattern (regex unless --fixed).
        #[arg(long, value_name = "PATTERN")]
        pattern: String,

        /// Include glob (repeatable; defaults to *.java).
        #[arg(long = "glob", value_name = "GLOB")]
        globs: Vec<String>,

        /// Exclude glob (repeatable).
        #[arg(long = "exclude", value_name = "GLOB")]
        excludes: Vec<String>,

        /// Treat the pattern as a literal string.
        #[arg(long)]
        fixed: bool,

        /// Print at most N hits.
        #[arg(long, default_value = "50", value_name = "N")]
        limit: usize,
    },

    /// Search, then print the enclosing declaration of each hit.
    #[command(
        long_about = "Run a search and promote every hit to its smallest enclosing declaration\n\
(method, constructor, class, interface, enum or record). A one-shot preview of\n\
what the context builder would collect for a symbol.\n\n\
Example:\n\
  ctxforge snippets --pattern 'charge\\(' --limit 10\n"
    )]
    Snippets {
        /// Search pattern (regex unless --fixed).
        #[arg(long, value_name = "PATTERN")]
        pattern: String,

        /// Include glob (repeatable; defaults to *.java).
        #[arg(long = "glob", value_name = "GLOB")]
        globs: Vec<String>,

        /// Exclude glob (repeatable).
        #[arg(long = "exclude", value_name = "GLOB")]
        excludes: Vec<String>,

        /// Treat the pattern as a literal string.
        #[arg(long)]
        fixed: bool,

        /// Resolve at most N hits.
        #[arg(long, default_value = "20", value_name = "N")]
        limit: usize,

        /// Output path ('-' for stdout).
        #[arg(long, default_value = "-", value_name = "PATH")]
        out: PathBuf,
    },

    /// Build a context pack around an anchor.
    #[command(
        long_about = r#"Build the context pack for an anchor and write the serialized
[CONTEXT] document. The anchor comes from --class/--method, from a prompt
file ([HINTS] block), or both (flags win; the prompt's scope still sets
the hop budget).

Examples:
    ctxforge context --class com.foo.Bar --method baz --out -
    ctxforge context --prompt prompt.txt --max-snippets 10 --stats
"#
    )]
    Context {
        /// Prompt file carrying [HINTS] (and optionally [TASK]).
        #[arg(long, value_name = "FILE")]
        prompt: Option<PathBuf>,

        /// Fully qualified anchor class name.
        #[arg(long, value_name = "FQCN")]
        class: Option<String>,

        /// Anchor method name.
        #[arg(long, value_name = "NAME")]
        method: Option<String>,

        /// Output path ('-' for stdout).
        #[arg(long, default_value = "context.txt", value_name = "PATH")]
        out: PathBuf,

        /// Include glob for call-site search (repeatable; defaults to *.java).
        #[arg(long = "glob", value_name = "GLOB")]
        globs: Vec<String>,

        /// Exclude glob for call-site search (repeatable).
        #[arg(long = "exclude", value_name = "GLOB")]
        excludes: Vec<String>,

        /// Maximum exploration hops from the anchor.
        #[arg(long, value_name = "N")]
        max_hops: Option<u32>,

        /// Maximum snippets in the pack.
        #[arg(long, value_name = "N")]
        max_snippets: Option<usize>,

        /// Maximum total snippet bytes in the pack.
        #[arg(long, value_name = "N")]
        max_bytes: Option<usize>,

        /// Maximum callees explored per method.
        #[arg(long, value_name = "N")]
        max_symbols_per_method: Option<usize>,

        /// Maximum search hits considered per callee.
        #[arg(long, value_name = "N")]
        max_hits_per_symbol: Option<usize>,

        /// Maximum snippets emitted per callee.
        #[arg(long, value_name = "N")]
        max_snippets_per_symbol: Option<usize>,

        /// Do not include the anchor method itself in the pack.
        #[arg(long)]
        no_anchor: bool,

        /// Print pack stats (plus an estimated token count) to stderr.
        #[arg(long)]
        stats: bool,
    },

    /// Build a pack and pipe it through a downstream model.
    #[command(
        long_about = "Build the context pack for a prompt file, compose the final codegen\n\
prompt (task text + snippets), feed it to the model adaptor over stdin, and\n\
stream the answer to --out.\n\n\
Example:\n\
  ctxforge ask --prompt prompt.txt\n"
    )]
    Ask {
        /// Prompt file with [HINTS] and [TASK].
        #[arg(long, value_name = "FILE")]
        prompt: PathBuf,

        /// Interpreter for the model adaptor.
        #[arg(long, default_value = "python3", value_name = "BIN")]
        py: String,

        /// Model adaptor script (reads prompt on stdin, writes answer on stdout).
        #[arg(long, default_value = "python/llm_adaptor.py", value_name = "PATH")]
        script: String,

        /// Where to write the intermediate context document.
        #[arg(long, default_value = "context.txt", value_name = "PATH")]
        context_out: PathBuf,

        /// Where to write the model's answer.
        #[arg(long, default_value = "answer.txt", value_name = "PATH")]
        out: PathBuf,
    },

    /// Check external dependencies and system status.
    Doctor,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Keep the distinction between "user passed --root" and the default:
    // the context command lets a prompt file supply repo_root, and only an
    // explicitly given flag may override it.
    let explicit_root = cli.root;
    let root = explicit_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Scan { limit } => run_scan(&root, limit),

        Commands::Locate { class } => run_locate(&root, &class),

        Commands::Extract { class, method, out } => run_extract(&root, &class, &method, &out),

        Commands::Search {
            pattern,
            globs,
            excludes,
            fixed,
            limit,
        } => run_search(&root, &pattern, globs, excludes, fixed, limit),

        Commands::Snippets {
            pattern,
            globs,
            excludes,
            fixed,
            limit,
            out,
        } => run_snippets(&root, &pattern, globs, excludes, fixed, limit, &out),

        Commands::Context {
            prompt,
            class,
            method,
            out,
            globs,
            excludes,
            max_hops,
            max_snippets,
            max_bytes,
            max_symbols_per_method,
            max_hits_per_symbol,
            max_snippets_per_symbol,
            no_anchor,
            stats,
        } => {
            let mut opt = ContextOptions::default();
            if let Some(v) = max_hops {
                opt.max_hops = v;
            }
            if let Some(v) = max_snippets {
                opt.max_snippets = v;
            }
            if let Some(v) = max_bytes {
                opt.max_bytes = v;
            }
            if let Some(v) = max_symbols_per_method {
                opt.max_symbols_per_method = v;
            }
            if let Some(v) = max_hits_per_symbol {
                opt.max_hits_per_symbol = v;
            }
            if let Some(v) = max_snippets_per_symbol {
                opt.max_snippets_per_symbol = v;
            }
            opt.include_anchor_in_snippets = !no_anchor;

            crate::flows::context::run_context(
                explicit_root.as_deref(),
                prompt.as_deref(),
                class.as_deref(),
                method.as_deref(),
                &out,
                globs,
                excludes,
                opt,
                stats,
            )
        }

        Commands::Ask {
            prompt,
            py,
            script,
            context_out,
            out,
        } => crate::flows::ask::run_ask(&root, &prompt, &py, &script, &context_out, &out),

        Commands::Doctor => crate::backends::doctor::run_doctor(),
    }
}

fn default_globs(globs: Vec<String>) -> Vec<String> {
    if globs.is_empty() {
        vec!["*.java".to_string()]
    } else {
        globs
    }
}

fn run_scan(root: &Path, limit: Option<usize>) -> Result<()> {
    let mut files = scan_workspace(root, &ScanOptions::default())?;
    if let Some(n) = limit {
        files.truncate(n);
    }
    println!("{}", render_jsonl(&files));
    Ok(())
}

fn run_locate(root: &Path, class: &str) -> Result<()> {
    let files = scan_workspace(root, &ScanOptions::default())?;
    let loc = locate_class(&files, class);

    println!("{}", render_jsonl(std::slice::from_ref(&loc)));

    if !loc.found {
        bail!("locate failed: {}", loc.reason);
    }
    Ok(())
}

fn run_extract(root: &Path, class: &str, method: &str, out: &Path) -> Result<()> {
    let files = scan_workspace(root, &ScanOptions::default())?;

    let loc = locate_class(&files, class);
    if !loc.found {
        bail!("locate failed: {}", loc.reason);
    }

    let m = extract_method(&loc.abs_path, &loc.rel_path, method);
    if !m.found {
        bail!("extract failed: {}", m.reason);
    }

    let mut doc = String::new();
    let _ = writeln!(doc, "FILE: {}", m.rel_path);
    let _ = writeln!(doc, "METHOD: {}", method);
    let _ = writeln!(doc, "REASON: {}", m.reason);
    let _ = writeln!(doc, "BYTE_RANGE: {}..{}", m.start, m.end);
    doc.push_str("----\n");
    doc.push_str(&m.text);
    doc.push('\n');

    write_out(out, &doc)
}

fn run_search(
    root: &Path,
    pattern: &str,
    globs: Vec<String>,
    excludes: Vec<String>,
    fixed: bool,
    limit: usize,
) -> Result<()> {
    let query = SearchQuery {
        pattern: pattern.to_string(),
        fixed_string: fixed,
        include_globs: default_globs(globs),
        exclude_globs: excludes,
    };

    let res = rg_search_json(root, &query)?;

    println!("exit: {}", res.exit_code);
    println!("hits: {}", res.hits.len());

    for hit in res.hits.iter().take(limit) {
        println!(
            "{}:{} byte={} len={}",
            hit.rel_path, hit.line_number, hit.match_byte_offset, hit.match_len
        );
    }

    if res.exit_code == 2 {
        bail!(
            "search tool error: {}",
            res.error.unwrap_or_else(|| "unknown".to_string())
        );
    }
    Ok(())
}

fn run_snippets(
    root: &Path,
    pattern: &str,
    globs: Vec<String>,
    excludes: Vec<String>,
    fixed: bool,
    limit: usize,
    out: &Path,
) -> Result<()> {
    let query = SearchQuery {
        pattern: pattern.to_string(),
        fixed_string: fixed,
        include_globs: default_globs(globs),
        exclude_globs: excludes,
    };

    let res = rg_search_json(root, &query)?;
    if res.exit_code == 2 {
        bail!(
            "search tool error: {}",
            res.error.unwrap_or_else(|| "unknown".to_string())
        );
    }

    let showing = res.hits.len().min(limit);

    let mut doc = String::new();
    let _ = writeln!(doc, "pattern: {}", pattern);
    let _ = writeln!(doc, "hits: {}", res.hits.len());
    let _ = writeln!(doc, "showing: {}", showing);
    doc.push_str("====\n");

    for hit in res.hits.iter().take(showing) {
        let snip = snippet_from_hit(&hit.abs_path, &hit.rel_path, hit.match_byte_offset);

        doc.push_str("\n[SNIPPET]\n");
        let _ = writeln!(doc, "file: {}", hit.rel_path);
        let _ = writeln!(doc, "line: {}", hit.line_number);
        let _ = writeln!(doc, "hit_byte: {}", hit.match_byte_offset);

        if !snip.found {
            doc.push_str("found: 0\n");
            let _ = writeln!(doc, "reason: {}", snip.reason);
            doc.push_str("[/SNIPPET]\n");
            continue;
        }

        doc.push_str("found: 1\n");
        let _ = writeln!(doc, "kind: {}", snip.kind);
        let _ = writeln!(doc, "range: {}..{}", snip.start, snip.end);
        doc.push_str("----\n");
        doc.push_str(&snip.text);
        doc.push_str("\n[/SNIPPET]\n");
    }

    write_out(out, &doc)
}
