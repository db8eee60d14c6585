//! Context memory domain types.
//!
//! A [`ContextItem`] is the atomic unit the session driver stores and later
//! retrieves when building a prompt. Items live in exactly one [`Tier`] at a
//! time. Compaction folds aged short-term items into a [`CompressedContext`],
//! which is projected back into the medium-term tier as a summary item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ContextError;

/// String-keyed hints attached to an item (`file`, `file_type`, `decision`, ...).
pub type Metadata = BTreeMap<String, String>;

/// One of the four memory tiers, ordered from most to least recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Immediate,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl Tier {
    /// All tiers in query concatenation order.
    pub const ALL: [Tier; 4] = [
        Tier::Immediate,
        Tier::ShortTerm,
        Tier::MediumTerm,
        Tier::LongTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Immediate => "immediate",
            Tier::ShortTerm => "short_term",
            Tier::MediumTerm => "medium_term",
            Tier::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(Tier::Immediate),
            "short_term" | "short-term" | "shortterm" => Ok(Tier::ShortTerm),
            "medium_term" | "medium-term" | "mediumterm" => Ok(Tier::MediumTerm),
            "long_term" | "long-term" | "longterm" => Ok(Tier::LongTerm),
            _ => Err(ContextError::InvalidTier(s.to_string())),
        }
    }
}

/// A single piece of remembered context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    /// Unique ID; assigned by the store when left empty.
    #[serde(default)]
    pub id: String,

    /// Tier this item currently lives in.
    pub tier: Tier,

    /// Free-text content.
    pub content: String,

    /// Coarse hints supplied by the caller.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,

    /// Intrinsic value in [0, 1]. Zero means "compute on insert".
    #[serde(default)]
    pub importance: f64,

    /// Query-dependent score, overwritten on every query.
    #[serde(default)]
    pub relevance: f64,

    /// Number of times this item was returned by a query.
    #[serde(default)]
    pub access_count: u64,

    /// Creation time (set by the store).
    pub timestamp: DateTime<Utc>,

    /// Time of the last query hit.
    pub last_access: DateTime<Utc>,
}

impl ContextItem {
    /// Create an item for `tier`. Id, timestamps and importance are filled in
    /// by the store on insertion.
    pub fn new(tier: Tier, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            tier,
            content: content.into(),
            metadata: Metadata::new(),
            importance: 0.0,
            relevance: 0.0,
            access_count: 0,
            timestamp: now,
            last_access: now,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Bytes counted toward memory usage: content plus metadata keys and values.
    pub fn memory_size(&self) -> usize {
        self.content.len()
            + self
                .metadata
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
    }
}

/// The artifact produced by compacting a batch of short-term items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedContext {
    pub summary: String,
    pub key_points: Vec<String>,
    pub important_files: Vec<String>,
    pub recent_decisions: Vec<String>,
    /// Bookkeeping: `items_compressed`, `compression_type`.
    pub metadata: Metadata,
    /// Byte length of the newline-joined source content.
    pub original_size: usize,
    /// Byte length of the summary plus concatenated key points.
    pub compressed_size: usize,
    pub compressed_at: DateTime<Utc>,
}

impl CompressedContext {
    /// Bytes saved by this compaction; negative when the artifact grew.
    pub fn bytes_saved(&self) -> i64 {
        self.original_size as i64 - self.compressed_size as i64
    }
}

/// Point-in-time snapshot of the context memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextStats {
    pub immediate_items: usize,
    pub short_term_items: usize,
    pub medium_term_items: usize,
    pub long_term_items: usize,
    /// Content plus metadata bytes across all tiers.
    pub total_memory_usage: usize,
    /// Mean of the last computed relevance across all items (0 when empty).
    pub average_relevance: f64,
    pub last_compression: Option<DateTime<Utc>>,
    pub compression_history: usize,
    pub total_compressed: usize,
    pub total_memory_saved: i64,
    /// Configured target ratio (reporting only).
    pub compression_ratio: f64,
    /// Observed compressed/original ratio over the retained history.
    pub actual_compression_ratio: f64,
}

impl ContextStats {
    pub fn total_items(&self) -> usize {
        self.immediate_items + self.short_term_items + self.medium_term_items + self.long_term_items
    }
}
