use dashmap::DashMap;

/// What a cache slot holds: one entity or a whole family's full set
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue<V> {
    Item(V),
    Collection(Vec<V>),
}

/// Backing store for repository caches
///
/// `clear` removes the exact key and every key that starts with it, so
/// clearing a type prefix drops both item entries and the full set.
pub trait CacheTransport<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedValue<V>>;

    fn put(&self, key: &str, value: CachedValue<V>);

    fn clear(&self, key_or_prefix: &str);
}

/// Process-local cache transport
#[derive(Debug)]
pub struct InMemoryCache<V> {
    entries: DashMap<String, CachedValue<V>>,
}

impl<V> InMemoryCache<V> {
    pub fn new() -> Self {
        InMemoryCache {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl<V> Default for InMemoryCache<V> {
    fn default() -> Self {
        InMemoryCache::new()
    }
}

impl<V: Clone + Send + Sync> CacheTransport<V> for InMemoryCache<V> {
    fn get(&self, key: &str) -> Option<CachedValue<V>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &str, value: CachedValue<V>) {
        self.entries.insert(key.to_string(), value);
    }

    fn clear(&self, key_or_prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(key_or_prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = InMemoryCache::new();
        cache.put("uRepo_DocumentType_1", CachedValue::Item("home"));

        assert_eq!(
            cache.get("uRepo_DocumentType_1"),
            Some(CachedValue::Item("home"))
        );
        assert_eq!(cache.get("uRepo_DocumentType_2"), None);
    }

    #[test]
    fn test_clear_prefix() {
        let cache = InMemoryCache::new();
        cache.put("uRepo_DocumentType_", CachedValue::Collection(vec![1, 2]));
        cache.put("uRepo_DocumentType_1", CachedValue::Item(1));
        cache.put("uRepo_MediaType_1", CachedValue::Item(1));

        cache.clear("uRepo_DocumentType_");

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("uRepo_MediaType_1"));
    }
}
