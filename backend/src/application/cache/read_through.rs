use super::keys::{CacheId, CacheKeys};
use super::options::CacheRetrievalPolicy;
use super::transport::{CacheTransport, CachedValue, InMemoryCache};
use crate::domain::{DomainResult, Entity};
use std::sync::Arc;
use tracing::debug;

/// Outcome of checking a cached full set against storage
enum CacheValidation {
    Valid,
    Inconsistent { cached: usize, persisted: usize },
}

/// Read-through cache for one entity type, governed by a [`CacheRetrievalPolicy`]
///
/// The full set lives under the bare type prefix and each entity under the
/// prefix plus its id, so [`ReadThroughCache::invalidate`] drops both.
pub struct ReadThroughCache<V> {
    keys: Arc<CacheKeys>,
    policy: CacheRetrievalPolicy,
    transport: Arc<dyn CacheTransport<V>>,
}

impl<V> ReadThroughCache<V>
where
    V: Entity + Clone + Send + Sync + 'static,
    V::Id: CacheId,
{
    pub fn new(
        keys: Arc<CacheKeys>,
        policy: CacheRetrievalPolicy,
        transport: Arc<dyn CacheTransport<V>>,
    ) -> Self {
        ReadThroughCache {
            keys,
            policy,
            transport,
        }
    }

    /// Cache backed by a fresh process-local transport
    pub fn in_memory(keys: Arc<CacheKeys>, policy: CacheRetrievalPolicy) -> Self {
        ReadThroughCache::new(keys, policy, Arc::new(InMemoryCache::new()))
    }

    pub fn policy(&self) -> &CacheRetrievalPolicy {
        &self.policy
    }

    /// Look up one entity, falling back to `fetch` on a miss
    pub fn get<F>(&self, id: &V::Id, fetch: F) -> DomainResult<Option<V>>
    where
        F: FnOnce() -> DomainResult<Option<V>>,
    {
        let key = self.keys.key_for_id::<V, V::Id>(id);
        if key.is_empty() {
            return fetch();
        }

        if let Some(CachedValue::Item(cached)) = self.transport.get(&key) {
            return Ok(Some(cached));
        }

        let fetched = fetch()?;
        if let Some(ref item) = fetched {
            self.transport.put(&key, CachedValue::Item(item.clone()));
        }
        Ok(fetched)
    }

    /// Read the full set, trusting a cached copy only as far as the policy allows
    pub fn get_all<F, C>(&self, fetch_all: F, persisted_count: C) -> DomainResult<Vec<V>>
    where
        F: FnOnce() -> DomainResult<Vec<V>>,
        C: FnOnce() -> DomainResult<usize>,
    {
        let key = self.keys.key_for::<V>();

        if let Some(CachedValue::Collection(cached)) = self.transport.get(&key) {
            match self.validate(&cached, persisted_count)? {
                CacheValidation::Valid => return Ok(cached),
                CacheValidation::Inconsistent { cached, persisted } => {
                    debug!(
                        "Cache inconsistency for {}: {} cached, {} persisted, refreshing",
                        key, cached, persisted
                    );
                    self.transport.clear(&key);
                }
            }
        }

        let fetched = fetch_all()?;
        if self.policy.admits(fetched.len()) {
            self.transport.put(&key, CachedValue::Collection(fetched.clone()));
            for item in &fetched {
                let item_key = self.keys.key_for_id::<V, V::Id>(item.id());
                if !item_key.is_empty() {
                    self.transport.put(&item_key, CachedValue::Item(item.clone()));
                }
            }
        } else {
            debug!(
                "Not caching {} items for {} (threshold {})",
                fetched.len(),
                key,
                self.policy.cache_threshold
            );
        }
        Ok(fetched)
    }

    /// Drop every cached entry of this type
    pub fn invalidate(&self) {
        self.transport.clear(&self.keys.key_for::<V>());
    }

    fn validate<C>(&self, cached: &[V], persisted_count: C) -> DomainResult<CacheValidation>
    where
        C: FnOnce() -> DomainResult<usize>,
    {
        if cached.is_empty() && !self.policy.allow_caching_zero_results {
            return Ok(CacheValidation::Inconsistent {
                cached: 0,
                persisted: persisted_count()?,
            });
        }
        if !self.policy.validate_count_on_full_read {
            return Ok(CacheValidation::Valid);
        }

        let persisted = persisted_count()?;
        if persisted == cached.len() {
            Ok(CacheValidation::Valid)
        } else {
            Ok(CacheValidation::Inconsistent {
                cached: cached.len(),
                persisted,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeId;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: NodeId,
    }

    impl Entity for Widget {
        type Id = NodeId;

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    fn widgets(count: i32) -> Vec<Widget> {
        (1..=count).map(|id| Widget { id: NodeId::new(id) }).collect()
    }

    fn cache(policy: CacheRetrievalPolicy) -> ReadThroughCache<Widget> {
        ReadThroughCache::in_memory(Arc::new(CacheKeys::new()), policy)
    }

    #[test]
    fn test_get_caches_hits() {
        let cache = cache(CacheRetrievalPolicy::default());
        let fetches = Cell::new(0);
        let fetch = || {
            fetches.set(fetches.get() + 1);
            Ok(Some(Widget { id: NodeId::new(3) }))
        };

        cache.get(&NodeId::new(3), fetch).unwrap();
        let again = cache
            .get(&NodeId::new(3), || panic!("should be served from cache"))
            .unwrap();

        assert_eq!(fetches.get(), 1);
        assert_eq!(again, Some(Widget { id: NodeId::new(3) }));
    }

    #[test]
    fn test_get_misses_are_not_cached() {
        let cache = cache(CacheRetrievalPolicy::default());
        let fetches = Cell::new(0);

        for _ in 0..2 {
            let result = cache
                .get(&NodeId::new(9), || {
                    fetches.set(fetches.get() + 1);
                    Ok(None)
                })
                .unwrap();
            assert!(result.is_none());
        }
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn test_full_set_is_cached_below_threshold() {
        let cache = cache(CacheRetrievalPolicy::default().with_count_validation(false));
        let fetches = Cell::new(0);

        for _ in 0..3 {
            let all = cache
                .get_all(
                    || {
                        fetches.set(fetches.get() + 1);
                        Ok(widgets(5))
                    },
                    || Ok(5),
                )
                .unwrap();
            assert_eq!(all.len(), 5);
        }
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn test_full_set_populates_item_entries() {
        let cache = cache(CacheRetrievalPolicy::default());
        cache.get_all(|| Ok(widgets(2)), || Ok(2)).unwrap();

        let item = cache
            .get(&NodeId::new(2), || panic!("should be served from cache"))
            .unwrap();
        assert_eq!(item, Some(Widget { id: NodeId::new(2) }));
    }

    #[test]
    fn test_invalidate_drops_everything() {
        let cache = cache(CacheRetrievalPolicy::default());
        cache.get_all(|| Ok(widgets(2)), || Ok(2)).unwrap();
        cache.invalidate();

        let fetches = Cell::new(0);
        cache
            .get(&NodeId::new(1), || {
                fetches.set(fetches.get() + 1);
                Ok(None)
            })
            .unwrap();
        assert_eq!(fetches.get(), 1);
    }
}
