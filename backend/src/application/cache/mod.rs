pub mod keys;
pub mod options;
pub mod read_through;
pub mod transport;

pub use keys::{CacheId, CacheKeys};
pub use options::CacheRetrievalPolicy;
pub use read_through::ReadThroughCache;
pub use transport::{CacheTransport, CachedValue, InMemoryCache};
