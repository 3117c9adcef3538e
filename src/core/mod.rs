//! Core functionality module
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `pixel` - The normalized pixel buffer every loader produces

pub mod config;
pub mod error;
pub mod pixel;
