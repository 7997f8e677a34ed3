use crate::domain::{DomainResult, EntityContainer, MoveEventInfo, NodeId, NodePath};
use uuid::Uuid;

/// Repository trait for containers of a single object-type partition.
pub trait EntityContainerRepository {
    fn get(&self, id: NodeId) -> DomainResult<Option<EntityContainer>>;

    fn get_by_key(&self, key: Uuid) -> DomainResult<Option<EntityContainer>>;

    fn get_children(&self, parent_id: NodeId) -> DomainResult<Vec<EntityContainer>>;

    fn get_all(&self) -> DomainResult<Vec<EntityContainer>>;

    /// Inserts or updates a container.
    ///
    /// The parent of an existing container cannot change here; use
    /// [`EntityContainerRepository::move_container`].
    fn save(&mut self, container: &mut EntityContainer) -> DomainResult<()>;

    /// Reparents a container, rejecting moves below its own descendants.
    fn move_container(
        &mut self,
        container: &mut EntityContainer,
        new_parent_id: NodeId,
    ) -> DomainResult<Vec<MoveEventInfo>>;

    /// Returns `Ok(true)` if the container was deleted, `Ok(false)` if it was not found.
    fn delete(&mut self, id: NodeId) -> DomainResult<bool>;

    /// Path of the container, derived from its parent chain.
    fn path_of(&self, id: NodeId) -> DomainResult<NodePath>;
}
