/// Repository cache key namespace
use crate::domain::NodeId;
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use uuid::Uuid;

const KEY_PREFIX: &str = "uRepo_";

/// An id that can be rendered into a cache key
///
/// Default ids never get a key. String ids are upper-cased so lookups ignore
/// case; numeric and GUID ids render as-is.
pub trait CacheId {
    fn is_default(&self) -> bool;

    fn render(&self) -> String;
}

impl CacheId for NodeId {
    fn is_default(&self) -> bool {
        self.value() == 0
    }

    fn render(&self) -> String {
        self.value().to_string()
    }
}

impl CacheId for i32 {
    fn is_default(&self) -> bool {
        *self == 0
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl CacheId for i64 {
    fn is_default(&self) -> bool {
        *self == 0
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl CacheId for Uuid {
    fn is_default(&self) -> bool {
        self.is_nil()
    }

    fn render(&self) -> String {
        self.hyphenated().to_string()
    }
}

impl CacheId for str {
    fn is_default(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> String {
        self.to_uppercase()
    }
}

impl CacheId for String {
    fn is_default(&self) -> bool {
        self.as_str().is_default()
    }

    fn render(&self) -> String {
        self.as_str().render()
    }
}

/// Memoized per-type cache key prefixes of the form `uRepo_{TypeName}_`
///
/// The short type name is used unless another type already claimed it, in
/// which case the fully qualified name keeps the prefixes apart. Prefixes are
/// stable for the life of the process.
#[derive(Debug, Default)]
pub struct CacheKeys {
    prefixes: RwLock<HashMap<TypeId, String>>,
}

impl CacheKeys {
    pub fn new() -> Self {
        CacheKeys::default()
    }

    /// Prefix shared by every key of `T`
    pub fn key_for<T: 'static>(&self) -> String {
        if let Some(prefix) = self.prefixes.read().get(&TypeId::of::<T>()) {
            return prefix.clone();
        }

        let mut prefixes = self.prefixes.write();
        if let Some(prefix) = prefixes.get(&TypeId::of::<T>()) {
            return prefix.clone();
        }

        let short = format!("{}{}_", KEY_PREFIX, short_type_name::<T>());
        let prefix = if prefixes.values().any(|taken| *taken == short) {
            format!("{}{}_", KEY_PREFIX, type_name::<T>())
        } else {
            short
        };
        prefixes.insert(TypeId::of::<T>(), prefix.clone());
        prefix
    }

    /// Key for one entity of `T`, or an empty string for a default id
    pub fn key_for_id<T: 'static, I: CacheId + ?Sized>(&self, id: &I) -> String {
        if id.is_default() {
            return String::new();
        }
        format!("{}{}", self.key_for::<T>(), id.render())
    }

    /// Number of types with a memoized prefix
    pub fn len(&self) -> usize {
        self.prefixes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.read().is_empty()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}
