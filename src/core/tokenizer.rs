//! Token estimation for LLM context budgeting
//!
//! Uses tiktoken (cl100k_base) when the encoding loads, with a fast
//! chars/4 heuristic fallback. Estimates are advisory only: the builder
//! enforces byte budgets, not token budgets.

use once_cell::sync::Lazy;
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::core::model::ContextPack;

// Lazy-initialized BPE encoding (loaded once on first use)
static CL100K_BPE: Lazy<Option<CoreBPE>> = Lazy::new(|| cl100k_base().ok());

/// Heuristic estimate: ~4 characters per token for code, rounded up.
fn estimate_tokens_heuristic(chars: usize) -> usize {
    chars.div_ceil(4)
}

/// Count tokens in a text, preferring the BPE encoding.
pub fn count_tokens(text: &str) -> usize {
    match CL100K_BPE.as_ref() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens_heuristic(text.chars().count()),
    }
}

/// Estimate the token footprint of a finished pack (snippet text only).
pub fn estimate_pack_tokens(pack: &ContextPack) -> usize {
    pack.snippets.iter().map(|s| count_tokens(&s.text)).sum()
}
