//! Memoization of projected snapshots
//!
//! The cache is owned by the caller and is only a performance aid. Any change
//! to base population or rate tables must clear it in full.

use crate::population::PopulationSnapshot;
use crate::scenario::{ScenarioKey, ScenarioParameters};
use log::debug;
use std::collections::HashMap;

/// Key for a cached projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub base_year: i32,
    pub target_year: i32,
    pub scenario: ScenarioKey,
}

impl CacheKey {
    pub fn new(base_year: i32, target_year: i32, scenario: &ScenarioParameters) -> Self {
        Self {
            base_year,
            target_year,
            scenario: scenario.key(),
        }
    }
}

/// Projected snapshots by (base year, target year, scenario)
#[derive(Debug, Default)]
pub struct ProjectionCache {
    entries: HashMap<CacheKey, PopulationSnapshot>,

    /// Entry limit; the cache is emptied when an insert would exceed it
    max_entries: Option<usize>,

    /// Statistics
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_entries` snapshots
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&PopulationSnapshot> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, snapshot: PopulationSnapshot) {
        if let Some(limit) = self.max_entries {
            if limit == 0 {
                return;
            }
            if self.entries.len() >= limit && !self.entries.contains_key(&key) {
                debug!("projection cache full ({} entries); clearing", self.entries.len());
                self.entries.clear();
            }
        }
        self.entries.insert(key, snapshot);
    }

    /// Drop every entry and reset statistics
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
