pub mod cache;
pub mod repositories;
pub mod services;

// Re-export key types to avoid naming conflicts
pub use cache::{CacheKeys, CacheRetrievalPolicy, ReadThroughCache};
pub use repositories::{ContentTypeRepository, EntityContainerRepository, NodeStore};
pub use services::{ContentTypeService, ContentTypeServiceError, ContentTypeServiceResult};
