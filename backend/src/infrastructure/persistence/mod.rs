mod container_hierarchy;
mod content_type_repository;
mod schema;
mod sqlite_node_store;

pub use container_hierarchy::ContainerHierarchy;
pub use content_type_repository::ContentTypeCompositionRepository;
pub use schema::initialize_database;
pub use sqlite_node_store::SqliteNodeStore;
