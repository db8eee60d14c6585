//! # RustedCode Core
//!
//! Domain types and error definitions for the RustedCode coding-assistant
//! runtime. This crate has **no framework dependencies**: it defines the
//! context memory model that the memory, config and CLI crates build on.

pub mod context;
pub mod error;

// Re-export key types at crate root for ergonomics
pub use context::{CompressedContext, ContextItem, ContextStats, Metadata, Tier};
pub use error::{ContextError, Error, Result};
