//! Tiered context store behind a single reader-writer lock.
//!
//! | Tier | Capacity policy |
//! |------|-----------------|
//! | Immediate | Oldest item promoted to short-term past `max_immediate_items` |
//! | Short-term | Automatic compaction attempted past `max_short_term_items` |
//! | Medium-term | Unbounded; receives compaction summaries |
//! | Long-term | Unbounded; direct inserts only |
//!
//! Every operation runs synchronously on the caller's thread. Mutations and
//! queries take the exclusive lock (queries bump per-item access counters);
//! usage and stats reporting take the shared lock.

use chrono::{DateTime, Duration, Utc};
use rustedcode_config::ContextConfig;
use rustedcode_core::context::{CompressedContext, ContextItem, ContextStats, Tier};
use rustedcode_core::error::ContextError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::clock::{Clock, SystemClock};
use crate::compaction::{self, CompressionKind};
use crate::scoring;

/// The four tier collections plus compaction bookkeeping.
#[derive(Debug, Default)]
struct TieredStore {
    immediate: Vec<ContextItem>,
    short_term: Vec<ContextItem>,
    medium_term: Vec<ContextItem>,
    long_term: Vec<ContextItem>,
    /// Most recent last, capped at [`compaction::MAX_HISTORY`].
    history: VecDeque<CompressedContext>,
    total_compressed: usize,
    total_memory_saved: i64,
    last_compression: Option<DateTime<Utc>>,
}

impl TieredStore {
    fn tier(&self, tier: Tier) -> &Vec<ContextItem> {
        match tier {
            Tier::Immediate => &self.immediate,
            Tier::ShortTerm => &self.short_term,
            Tier::MediumTerm => &self.medium_term,
            Tier::LongTerm => &self.long_term,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut Vec<ContextItem> {
        match tier {
            Tier::Immediate => &mut self.immediate,
            Tier::ShortTerm => &mut self.short_term,
            Tier::MediumTerm => &mut self.medium_term,
            Tier::LongTerm => &mut self.long_term,
        }
    }

    fn iter_all(&self) -> impl Iterator<Item = &ContextItem> {
        self.immediate
            .iter()
            .chain(&self.short_term)
            .chain(&self.medium_term)
            .chain(&self.long_term)
    }

    fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut ContextItem> {
        self.immediate
            .iter_mut()
            .chain(self.short_term.iter_mut())
            .chain(self.medium_term.iter_mut())
            .chain(self.long_term.iter_mut())
    }
}

/// Concurrency-safe facade over the tiered context store.
pub struct ContextMemoryManager {
    config: ContextConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<TieredStore>,
    /// Disambiguates ids minted within the same clock reading.
    id_seq: AtomicU64,
}

impl ContextMemoryManager {
    /// Create a manager with default capacities and the system clock.
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ContextConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: RwLock::new(TieredStore::default()),
            id_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    // ── Insertion ─────────────────────────────────────────────────────

    /// Store an item in the tier it names.
    ///
    /// Ids are minted for empty ids, timestamps are always overwritten and
    /// importance is computed when the caller left it at zero. If the
    /// insert overflows the short-term tier and the resulting compaction
    /// fails, the item stays stored and [`ContextError::AutoCompaction`] is
    /// returned.
    pub fn add(&self, mut item: ContextItem) -> Result<(), ContextError> {
        let now = self.clock.now();
        let mut store = self.write()?;

        if item.id.is_empty() {
            item.id = self.next_id(now);
        }
        item.timestamp = now;
        item.last_access = now;
        if item.importance == 0.0 {
            item.importance = scoring::importance(&item);
        }

        tracing::debug!(
            id = %item.id,
            tier = %item.tier,
            importance = item.importance,
            "Context item added"
        );

        let tier = item.tier;
        store.tier_mut(tier).push(item);

        match tier {
            Tier::Immediate if store.immediate.len() > self.config.max_immediate_items => {
                let mut oldest = store.immediate.remove(0);
                oldest.tier = Tier::ShortTerm;
                tracing::debug!(id = %oldest.id, "Promoted oldest immediate item to short-term");
                store.short_term.push(oldest);
            }
            Tier::ShortTerm if store.short_term.len() > self.config.max_short_term_items => {
                if let Err(e) = self.compress_locked(&mut store, false, now) {
                    tracing::warn!(error = %e, "Automatic compaction after short-term overflow failed");
                    return Err(ContextError::AutoCompaction(Box::new(e)));
                }
            }
            _ => {}
        }

        Ok(())
    }

    // ── Retrieval ─────────────────────────────────────────────────────

    /// Rank every stored item against `query` and return the best
    /// `max_items` scoring at least the relevance threshold.
    ///
    /// Each candidate's relevance is overwritten and its access counters
    /// bumped, whether or not it makes the cut. Returned items are
    /// snapshots; later queries do not change them.
    pub fn query(&self, query: &str, max_items: usize) -> Result<Vec<ContextItem>, ContextError> {
        let now = self.clock.now();
        let mut store = self.write()?;

        let mut candidates: Vec<&mut ContextItem> = store.iter_all_mut().collect();
        for item in candidates.iter_mut() {
            item.relevance = scoring::relevance(item, query, now);
            item.access_count += 1;
            item.last_access = item.last_access.max(now);
        }

        candidates.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| b.importance.total_cmp(&a.importance))
        });

        let threshold = self.config.relevance_threshold;
        let results: Vec<ContextItem> = candidates
            .into_iter()
            .filter(|item| item.relevance >= threshold)
            .take(max_items)
            .map(|item| item.clone())
            .collect();

        tracing::debug!(query, returned = results.len(), "Context query served");
        Ok(results)
    }

    /// Relevance of `item` to `query` right now. No side effects.
    pub fn calculate_relevance(&self, item: &ContextItem, query: &str) -> f64 {
        scoring::relevance(item, query, self.clock.now())
    }

    // ── Compaction ────────────────────────────────────────────────────

    /// Compact aged short-term items into a single medium-term summary.
    ///
    /// Returns `Ok(None)` when there is nothing to do: unforced calls are
    /// gated by the cooldown and by the short-term tier being under
    /// capacity, and any call with no qualifying targets is a no-op.
    pub fn compress(&self, force: bool) -> Result<Option<CompressedContext>, ContextError> {
        let now = self.clock.now();
        let mut store = self.write()?;
        self.compress_locked(&mut store, force, now)
    }

    fn compress_locked(
        &self,
        store: &mut TieredStore,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<CompressedContext>, ContextError> {
        if !force {
            if let Some(last) = store.last_compression {
                if now - last < Duration::hours(compaction::COMPRESSION_COOLDOWN_HOURS) {
                    tracing::debug!("Compaction skipped: cooldown active");
                    return Ok(None);
                }
            }
            if store.short_term.len() < self.config.max_short_term_items {
                tracing::debug!(
                    short_term = store.short_term.len(),
                    "Compaction skipped: short-term tier under capacity"
                );
                return Ok(None);
            }
        }

        let targets = compaction::select_targets(&store.short_term, now, force);
        if targets.is_empty() {
            tracing::debug!("Compaction skipped: no qualifying items");
            return Ok(None);
        }

        let kind = if force {
            CompressionKind::Forced
        } else {
            CompressionKind::Automatic
        };
        let selected: Vec<&ContextItem> = targets.iter().map(|&i| &store.short_term[i]).collect();
        let artifact = compaction::compress_items(&selected, kind, now)?;

        // Commit: nothing below can fail.
        let mut index = 0;
        store.short_term.retain(|_| {
            let keep = targets.binary_search(&index).is_err();
            index += 1;
            keep
        });

        let mut summary_item = ContextItem::new(Tier::MediumTerm, artifact.summary.clone())
            .with_id(self.next_id(now))
            .with_importance(compaction::COMPRESSED_ITEM_IMPORTANCE)
            .with_metadata("type", "compressed")
            .with_metadata("items_compressed", targets.len().to_string())
            .with_metadata("compression_type", kind.as_str());
        summary_item.timestamp = now;
        summary_item.last_access = now;
        store.medium_term.push(summary_item);

        store.total_compressed += targets.len();
        store.total_memory_saved += artifact.bytes_saved();
        store.last_compression = Some(now);

        store.history.push_back(artifact.clone());
        while store.history.len() > compaction::MAX_HISTORY {
            store.history.pop_front();
        }

        tracing::info!(
            items = targets.len(),
            kind = kind.as_str(),
            original_size = artifact.original_size,
            compressed_size = artifact.compressed_size,
            "Compacted short-term context"
        );

        Ok(Some(artifact))
    }

    // ── Maintenance ───────────────────────────────────────────────────

    /// Empty one tier. History and counters are untouched.
    pub fn clear(&self, tier: Tier) -> Result<(), ContextError> {
        let mut store = self.write()?;
        let removed = store.tier(tier).len();
        store.tier_mut(tier).clear();
        tracing::debug!(%tier, removed, "Cleared context tier");
        Ok(())
    }

    /// Empty the tier named by `tier`, rejecting unknown names.
    pub fn clear_named(&self, tier: &str) -> Result<(), ContextError> {
        self.clear(tier.parse()?)
    }

    // ── Inspection ────────────────────────────────────────────────────

    /// Content plus metadata bytes across all tiers.
    pub fn memory_usage(&self) -> Result<usize, ContextError> {
        let store = self.read()?;
        Ok(store.iter_all().map(ContextItem::memory_size).sum())
    }

    pub fn stats(&self) -> Result<ContextStats, ContextError> {
        let store = self.read()?;

        let (count, relevance_sum) = store
            .iter_all()
            .fold((0usize, 0.0f64), |(n, sum), item| (n + 1, sum + item.relevance));
        let average_relevance = if count == 0 {
            0.0
        } else {
            relevance_sum / count as f64
        };

        let (original, compressed) = store.history.iter().fold((0usize, 0usize), |(o, c), h| {
            (o + h.original_size, c + h.compressed_size)
        });
        let actual_compression_ratio = if original == 0 {
            0.0
        } else {
            compressed as f64 / original as f64
        };

        Ok(ContextStats {
            immediate_items: store.immediate.len(),
            short_term_items: store.short_term.len(),
            medium_term_items: store.medium_term.len(),
            long_term_items: store.long_term.len(),
            total_memory_usage: store.iter_all().map(ContextItem::memory_size).sum(),
            average_relevance,
            last_compression: store.last_compression,
            compression_history: store.history.len(),
            total_compressed: store.total_compressed,
            total_memory_saved: store.total_memory_saved,
            compression_ratio: self.config.compression_ratio,
            actual_compression_ratio,
        })
    }

    /// Snapshot of the compaction history, oldest first.
    pub fn history(&self) -> Result<Vec<CompressedContext>, ContextError> {
        Ok(self.read()?.history.iter().cloned().collect())
    }

    /// Snapshot of one tier in insertion order.
    pub fn tier_items(&self, tier: Tier) -> Result<Vec<ContextItem>, ContextError> {
        Ok(self.read()?.tier(tier).clone())
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let seq = self.id_seq.fetch_add(1, Ordering::Relaxed);
        let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros() * 1_000);
        format!("ctx_{nanos}_{seq}")
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TieredStore>, ContextError> {
        self.state
            .read()
            .map_err(|e| ContextError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TieredStore>, ContextError> {
        self.state
            .write()
            .map_err(|e| ContextError::LockPoisoned(e.to_string()))
    }
}

impl Default for ContextMemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
