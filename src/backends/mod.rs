//! Backends module - External tool integrations and file operations
//!
//! Provides:
//! - scan: Workspace inventory scanning
//! - rg: ripgrep search driver with global byte offsets
//! - doctor: Dependency checking

pub mod doctor;
pub mod rg;
pub mod scan;
