//! Lossy compaction of aged short-term items.
//!
//! Selection and artifact construction are pure; the manager decides when to
//! run them and commits the result under its exclusive lock.

use chrono::{DateTime, Duration, Utc};
use rustedcode_core::context::{CompressedContext, ContextItem, Metadata};
use rustedcode_core::error::ContextError;

/// Minimum hours between two automatic compactions.
pub const COMPRESSION_COOLDOWN_HOURS: i64 = 1;

/// Short-term items older than this many hours are compaction targets.
pub const COMPACTION_AGE_HOURS: i64 = 2;

/// Compaction artifacts kept in history.
pub const MAX_HISTORY: usize = 100;

/// Fixed importance of the medium-term item synthesized from an artifact.
pub const COMPRESSED_ITEM_IMPORTANCE: f64 = 0.8;

const KEY_POINT_IMPORTANCE: f64 = 0.7;
const KEY_POINT_MAX_CHARS: usize = 100;
const SUMMARY_KEYWORDS: &[&str] = &["function", "class", "error", "todo", "important", "fix", "bug"];
const SUMMARY_MAX_LINES: usize = 10;
const SUMMARY_FALLBACK_LINES: usize = 5;

/// Why a compaction ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    Automatic,
    Forced,
}

impl CompressionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionKind::Automatic => "automatic",
            CompressionKind::Forced => "forced",
        }
    }
}

/// Indices (ascending) of the short-term items to compact.
///
/// Items older than [`COMPACTION_AGE_HOURS`] are always selected. A forced run
/// tops the selection up with newer items, but never selects more than half
/// of the tier.
pub fn select_targets(short_term: &[ContextItem], now: DateTime<Utc>, force: bool) -> Vec<usize> {
    let cutoff = now - Duration::hours(COMPACTION_AGE_HOURS);
    let is_aged = |item: &ContextItem| item.timestamp < cutoff;

    let mut selected: Vec<usize> = short_term
        .iter()
        .enumerate()
        .filter(|(_, item)| is_aged(item))
        .map(|(i, _)| i)
        .collect();

    if force {
        let limit = short_term.len() / 2;
        for (i, item) in short_term.iter().enumerate() {
            if selected.len() >= limit {
                break;
            }
            if !is_aged(item) {
                selected.push(i);
            }
        }
        selected.truncate(limit);
        selected.sort_unstable();
    }

    selected
}

/// Build the compaction artifact for `items`.
pub fn compress_items(
    items: &[&ContextItem],
    kind: CompressionKind,
    now: DateTime<Utc>,
) -> Result<CompressedContext, ContextError> {
    if items.is_empty() {
        return Err(ContextError::CompactionFailed("no items to compress".into()));
    }

    let combined = items
        .iter()
        .map(|item| item.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut important_files = Vec::new();
    let mut recent_decisions = Vec::new();
    let mut key_points = Vec::new();

    for item in items {
        if let Some(file) = item.metadata.get("file") {
            push_unique(&mut important_files, file);
        }
        if let Some(decision) = item.metadata.get("decision") {
            push_unique(&mut recent_decisions, decision);
        }
        if item.importance > KEY_POINT_IMPORTANCE {
            if let Some(point) = extract_key_point(&item.content) {
                push_unique(&mut key_points, &point);
            }
        }
    }

    let summary = build_summary(&combined);
    let compressed_size = summary.len() + key_points.iter().map(String::len).sum::<usize>();

    let mut metadata = Metadata::new();
    metadata.insert("items_compressed".into(), items.len().to_string());
    metadata.insert("compression_type".into(), kind.as_str().into());

    Ok(CompressedContext {
        summary,
        key_points,
        important_files,
        recent_decisions,
        metadata,
        original_size: combined.len(),
        compressed_size,
        compressed_at: now,
    })
}

/// First non-empty line, cut to 100 characters with an ellipsis.
pub fn extract_key_point(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().count() > KEY_POINT_MAX_CHARS {
        let truncated: String = line.chars().take(KEY_POINT_MAX_CHARS).collect();
        Some(format!("{truncated}..."))
    } else {
        Some(line.to_string())
    }
}

/// Keep up to ten lines mentioning a summary keyword; otherwise the first five lines.
pub fn build_summary(content: &str) -> String {
    let matching: Vec<&str> = content
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            SUMMARY_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .take(SUMMARY_MAX_LINES)
        .collect();

    if matching.is_empty() {
        content
            .lines()
            .take(SUMMARY_FALLBACK_LINES)
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        matching.join("\n")
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
