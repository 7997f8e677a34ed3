use serde::{Deserialize, Serialize};

/// Rules governing when full-set reads are cached and when a cached set is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheRetrievalPolicy {
    /// Compare a cached full set against the persisted count before trusting it
    pub validate_count_on_full_read: bool,
    /// Cache an empty full-set result
    pub allow_caching_zero_results: bool,
    /// Largest full set that is still cached
    pub cache_threshold: usize,
}

impl Default for CacheRetrievalPolicy {
    fn default() -> Self {
        CacheRetrievalPolicy {
            validate_count_on_full_read: true,
            allow_caching_zero_results: false,
            cache_threshold: 100,
        }
    }
}

impl CacheRetrievalPolicy {
    pub fn with_count_validation(mut self, validate: bool) -> Self {
        self.validate_count_on_full_read = validate;
        self
    }

    pub fn with_zero_results(mut self, allow: bool) -> Self {
        self.allow_caching_zero_results = allow;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.cache_threshold = threshold;
        self
    }

    /// Whether a freshly fetched full set of `count` items may be cached
    pub fn admits(&self, count: usize) -> bool {
        if count == 0 {
            return self.allow_caching_zero_results;
        }
        count <= self.cache_threshold
    }
}
