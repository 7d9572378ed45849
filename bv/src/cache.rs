//! Per-session stage cache
//!
//! Holds one slot per pipeline stage. A slot is filed under the tag of the
//! value stored in it, so a result can never land under another stage's key.
//! The cache is plain owned data: its session hands out `&mut` access, and
//! nothing else ever holds it.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::provider::{CompanyProfile, PostCollection};

/// Fixed set of cache slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StageKey {
    CompanyInfo,
    Posts,
    PostsAnalysis,
    ExampleGeneration,
}

impl StageKey {
    pub const ALL: [StageKey; 4] = [
        StageKey::CompanyInfo,
        StageKey::Posts,
        StageKey::PostsAnalysis,
        StageKey::ExampleGeneration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKey::CompanyInfo => "company info",
            StageKey::Posts => "posts",
            StageKey::PostsAnalysis => "posts analysis",
            StageKey::ExampleGeneration => "example post",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Successful output of a pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StageResult {
    CompanyInfo(CompanyProfile),
    Posts(PostCollection),
    PostsAnalysis(String),
    ExampleGeneration(String),
}

impl StageResult {
    /// The slot this result belongs in
    pub fn key(&self) -> StageKey {
        match self {
            StageResult::CompanyInfo(_) => StageKey::CompanyInfo,
            StageResult::Posts(_) => StageKey::Posts,
            StageResult::PostsAnalysis(_) => StageKey::PostsAnalysis,
            StageResult::ExampleGeneration(_) => StageKey::ExampleGeneration,
        }
    }
}

/// A stored result with bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: StageResult,
    /// Fetch generation the result derives from
    pub generation: u64,
    pub stored_at: DateTime<Utc>,
}

/// In-memory stage cache owned by one session
#[derive(Debug, Default)]
pub struct StageCache {
    entries: HashMap<StageKey, CacheEntry>,
    /// Bumped every time a new post collection is stored
    generation: u64,
}

impl StageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a slot
    pub fn get(&self, key: StageKey) -> Option<&StageResult> {
        self.entries.get(&key).map(|e| &e.result)
    }

    /// Look up a slot with its bookkeeping
    pub fn entry(&self, key: StageKey) -> Option<&CacheEntry> {
        self.entries.get(&key)
    }

    /// Store a result, overwriting whatever its slot held
    ///
    /// Posts open a new fetch generation. Analyses inherit the generation of
    /// the posts they were computed from, examples that of their analysis.
    pub fn put(&mut self, result: StageResult) {
        let key = result.key();
        let generation = match key {
            StageKey::Posts => {
                self.generation += 1;
                self.generation
            }
            StageKey::CompanyInfo => self.generation,
            StageKey::PostsAnalysis => self.generation_of(StageKey::Posts),
            StageKey::ExampleGeneration => self.generation_of(StageKey::PostsAnalysis),
        };
        debug!(%key, generation, "StageCache::put: storing");
        self.entries.insert(
            key,
            CacheEntry {
                result,
                generation,
                stored_at: Utc::now(),
            },
        );
    }

    /// Drop every slot
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "StageCache::clear: called");
        self.entries.clear();
        self.generation = 0;
    }

    pub fn contains(&self, key: StageKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Populated slots in stage order
    pub fn populated(&self) -> Vec<StageKey> {
        StageKey::ALL.into_iter().filter(|k| self.contains(*k)).collect()
    }

    /// True when a derived slot was computed from posts that a later fetch replaced
    ///
    /// Refetching never clears downstream slots; this only reports the gap.
    pub fn is_stale(&self, key: StageKey) -> bool {
        match key {
            StageKey::CompanyInfo | StageKey::Posts => false,
            StageKey::PostsAnalysis | StageKey::ExampleGeneration => self
                .entries
                .get(&key)
                .is_some_and(|e| e.generation < self.generation_of(StageKey::Posts)),
        }
    }

    fn generation_of(&self, key: StageKey) -> u64 {
        self.entries.get(&key).map(|e| e.generation).unwrap_or(0)
    }

    pub fn company_info(&self) -> Option<&CompanyProfile> {
        match self.get(StageKey::CompanyInfo) {
            Some(StageResult::CompanyInfo(p)) => Some(p),
            _ => None,
        }
    }

    pub fn posts(&self) -> Option<&PostCollection> {
        match self.get(StageKey::Posts) {
            Some(StageResult::Posts(p)) => Some(p),
            _ => None,
        }
    }

    pub fn posts_analysis(&self) -> Option<&str> {
        match self.get(StageKey::PostsAnalysis) {
            Some(StageResult::PostsAnalysis(s)) => Some(s),
            _ => None,
        }
    }

    pub fn example_post(&self) -> Option<&str> {
        match self.get(StageKey::ExampleGeneration) {
            Some(StageResult::ExampleGeneration(s)) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Post;

    fn posts(texts: &[&str]) -> StageResult {
        StageResult::Posts(PostCollection::new(texts.iter().map(|t| Post::with_text(*t)).collect()))
    }

    #[test]
    fn test_put_files_under_result_key() {
        let mut cache = StageCache::new();
        cache.put(StageResult::PostsAnalysis("style".to_string()));

        assert_eq!(cache.populated(), vec![StageKey::PostsAnalysis]);
        assert_eq!(cache.posts_analysis(), Some("style"));
        assert!(cache.get(StageKey::ExampleGeneration).is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let mut cache = StageCache::new();
        cache.put(StageResult::ExampleGeneration("first".to_string()));
        cache.put(StageResult::ExampleGeneration("second".to_string()));

        assert_eq!(cache.example_post(), Some("second"));
        assert_eq!(cache.populated().len(), 1);
    }

    #[test]
    fn test_entry_records_generation_and_store_time() {
        let mut cache = StageCache::new();
        let before = Utc::now();
        cache.put(posts(&["a"]));
        cache.put(StageResult::PostsAnalysis("x".to_string()));

        let entry = cache.entry(StageKey::PostsAnalysis).unwrap();
        assert_eq!(entry.generation, 1);
        assert!(entry.stored_at >= before);
        let first_stored = entry.stored_at;
        assert!(cache.entry(StageKey::ExampleGeneration).is_none());

        cache.put(StageResult::PostsAnalysis("y".to_string()));
        assert!(cache.entry(StageKey::PostsAnalysis).unwrap().stored_at >= first_stored);
    }

    #[test]
    fn test_clear_empties_every_slot() {
        let mut cache = StageCache::new();
        cache.put(StageResult::CompanyInfo(CompanyProfile::default()));
        cache.put(posts(&["a"]));
        cache.put(StageResult::PostsAnalysis("x".to_string()));

        cache.clear();
        assert!(cache.is_empty());
        for key in StageKey::ALL {
            assert!(cache.get(key).is_none());
        }
    }

    #[test]
    fn test_refetch_marks_downstream_stale_without_clearing() {
        let mut cache = StageCache::new();
        cache.put(posts(&["a"]));
        cache.put(StageResult::PostsAnalysis("analysis of a".to_string()));
        cache.put(StageResult::ExampleGeneration("example".to_string()));
        assert!(!cache.is_stale(StageKey::PostsAnalysis));
        assert!(!cache.is_stale(StageKey::ExampleGeneration));

        cache.put(posts(&["b"]));
        assert_eq!(cache.posts_analysis(), Some("analysis of a"));
        assert!(cache.is_stale(StageKey::PostsAnalysis));
        assert!(cache.is_stale(StageKey::ExampleGeneration));

        cache.put(StageResult::PostsAnalysis("analysis of b".to_string()));
        assert!(!cache.is_stale(StageKey::PostsAnalysis));
        // Example still derives from the superseded analysis
        assert!(cache.is_stale(StageKey::ExampleGeneration));
    }

    #[test]
    fn test_typed_accessors_on_empty_cache() {
        let cache = StageCache::new();
        assert!(cache.company_info().is_none());
        assert!(cache.posts().is_none());
        assert!(cache.posts_analysis().is_none());
        assert!(cache.example_post().is_none());
        assert!(!cache.is_stale(StageKey::PostsAnalysis));
    }
}
