//! Flows module - Multi-step operations combining several backends
//!
//! Provides:
//! - context: the budgeted call-graph context builder
//! - prompt: prompt-file parsing ([HINTS]/[TASK])
//! - ask: build a pack and pipe it through a downstream model

pub mod ask;
pub mod context;
pub mod prompt;
