//! Tiered context memory for RustedCode.
//!
//! Keeps the context fed to the model bounded: items flow from the
//! immediate tier into short-term, aged short-term items are compacted into
//! medium-term summaries, and queries rank everything by relevance.

pub mod clock;
pub mod compaction;
pub mod manager;
pub mod render;
pub mod scoring;

pub use clock::{Clock, ManualClock, SystemClock};
pub use compaction::CompressionKind;
pub use manager::ContextMemoryManager;
pub use render::render_context;
