pub mod container_repository;
pub mod content_type_repository;
pub mod node_store;

pub use container_repository::EntityContainerRepository;
pub use content_type_repository::ContentTypeRepository;
pub use node_store::{NodeCommand, NodeQuery, NodeRow, NodeStore};
