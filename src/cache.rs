//! Explicit memo table for the deterministic stages.
//!
//! Entries are found by a content hash of the inputs and confirmed by comparing
//! the stored inputs, so two equal tables hit the same entry even if they were
//! loaded separately. Imputation draws random
//! values and has no cached counterpart.

use crate::clean::{
    normalize_feature_table, normalize_metadata, reconcile, FeatureColumnSpec, ReconcileReport,
};
use crate::cluster::reorder_for_heatmap;
use crate::data::{FeatureTable, Metadata};
use crate::error::Result;
use crate::filter::{filter_blanks, BlankFilterResult};
use crate::profile::{summarize_levels, LevelSummary};
use crate::zero::estimate_lod;
use log::debug;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// 64-bit hash of a value's content.
pub fn content_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut h = DefaultHasher::new();
    value.hash(&mut h);
    h.finish()
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Entries grouped by content hash. Each entry keeps the inputs it was computed
/// from, so a hash collision between different inputs is a miss, not a wrong hit.
#[derive(Debug)]
struct MemoTable<K, V> {
    buckets: HashMap<u64, Vec<(K, V)>>,
}

impl<K, V> Default for MemoTable<K, V> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<K, V: Clone> MemoTable<K, V> {
    fn get<M: Fn(&K) -> bool>(&self, hash: u64, matches: M) -> Option<V> {
        self.buckets
            .get(&hash)?
            .iter()
            .find(|(key, _)| matches(key))
            .map(|(_, value)| value.clone())
    }

    fn insert(&mut self, hash: u64, key: K, value: V) {
        self.buckets.entry(hash).or_default().push((key, value));
    }

    fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

fn lookup<K, V, M>(
    table: &MemoTable<K, V>,
    stats: &mut CacheStats,
    hash: u64,
    matches: M,
) -> Option<V>
where
    V: Clone,
    M: Fn(&K) -> bool,
{
    let found = table.get(hash, matches);
    if found.is_some() {
        stats.hits += 1;
    } else {
        stats.misses += 1;
    }
    found
}

fn memoize<K, V, M, I, F>(
    table: &mut MemoTable<K, V>,
    stats: &mut CacheStats,
    hash: u64,
    matches: M,
    inputs: I,
    compute: F,
) -> Result<V>
where
    V: Clone,
    M: Fn(&K) -> bool,
    I: FnOnce() -> K,
    F: FnOnce() -> Result<V>,
{
    if let Some(v) = lookup(table, stats, hash, matches) {
        return Ok(v);
    }
    let v = compute()?;
    table.insert(hash, inputs(), v.clone());
    Ok(v)
}

type Reconciled = (Metadata, FeatureTable, ReconcileReport);
type BlankFiltered = (FeatureTable, BlankFilterResult);

/// Memoizing front end to the cleanup and clustering stages.
///
/// Failed computations are not cached. Every entry holds a copy of its
/// inputs, so the cache costs about as much memory as the tables it has seen.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    metadata: MemoTable<Metadata, Metadata>,
    features: MemoTable<(FeatureTable, FeatureColumnSpec), FeatureTable>,
    reconciled: MemoTable<(Metadata, FeatureTable), Reconciled>,
    levels: MemoTable<Metadata, LevelSummary>,
    lods: MemoTable<FeatureTable, f64>,
    blanks: MemoTable<(FeatureTable, FeatureTable, u64), BlankFiltered>,
    heatmaps: MemoTable<FeatureTable, FeatureTable>,
    stats: CacheStats,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize_metadata(&mut self, metadata: &Metadata) -> Result<Metadata> {
        let hash = content_hash(metadata);
        memoize(
            &mut self.metadata,
            &mut self.stats,
            hash,
            |md| md == metadata,
            || metadata.clone(),
            || normalize_metadata(metadata),
        )
    }

    pub fn normalize_feature_table(
        &mut self,
        features: &FeatureTable,
        spec: &FeatureColumnSpec,
    ) -> Result<FeatureTable> {
        let hash = content_hash(&(features, spec));
        memoize(
            &mut self.features,
            &mut self.stats,
            hash,
            |(ft, s)| ft == features && s == spec,
            || (features.clone(), spec.clone()),
            || normalize_feature_table(features, spec),
        )
    }

    pub fn reconcile(&mut self, metadata: &Metadata, features: &FeatureTable) -> Result<Reconciled> {
        let hash = content_hash(&(metadata, features));
        memoize(
            &mut self.reconciled,
            &mut self.stats,
            hash,
            |(md, ft)| md == metadata && ft == features,
            || (metadata.clone(), features.clone()),
            || reconcile(metadata, features),
        )
    }

    pub fn summarize_levels(&mut self, metadata: &Metadata) -> LevelSummary {
        let hash = content_hash(metadata);
        if let Some(levels) = lookup(&self.levels, &mut self.stats, hash, |md| md == metadata) {
            return levels;
        }
        let levels = summarize_levels(metadata);
        self.levels.insert(hash, metadata.clone(), levels.clone());
        levels
    }

    pub fn estimate_lod(&mut self, features: &FeatureTable) -> f64 {
        let hash = content_hash(features);
        if let Some(lod) = lookup(&self.lods, &mut self.stats, hash, |ft| ft == features) {
            return lod;
        }
        let lod = estimate_lod(features);
        self.lods.insert(hash, features.clone(), lod);
        lod
    }

    pub fn filter_blanks(
        &mut self,
        blanks: &FeatureTable,
        samples: &FeatureTable,
        cutoff: f64,
    ) -> Result<BlankFiltered> {
        let bits = cutoff.to_bits();
        let hash = content_hash(&(blanks, samples, bits));
        memoize(
            &mut self.blanks,
            &mut self.stats,
            hash,
            |(b, s, c)| b == blanks && s == samples && *c == bits,
            || (blanks.clone(), samples.clone(), bits),
            || filter_blanks(blanks, samples, cutoff),
        )
    }

    pub fn reorder_for_heatmap(&mut self, table: &FeatureTable) -> Result<FeatureTable> {
        let hash = content_hash(table);
        memoize(
            &mut self.heatmaps,
            &mut self.stats,
            hash,
            |ft| ft == table,
            || table.clone(),
            || reorder_for_heatmap(table),
        )
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached entries across all stages.
    pub fn len(&self) -> usize {
        self.metadata.len()
            + self.features.len()
            + self.reconciled.len()
            + self.levels.len()
            + self.lods.len()
            + self.blanks.len()
            + self.heatmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        debug!("clearing {} cached entries", self.len());
        *self = Self::default();
    }
}
