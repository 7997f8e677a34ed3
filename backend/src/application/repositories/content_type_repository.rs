use crate::domain::{
    ComposableType, DomainResult, EntityContainer, MoveEventInfo, NodeId,
};
use uuid::Uuid;

/// Repository trait for content type definitions of one family.
///
/// The alias namespace is shared by document, media and member types, so
/// alias lookups and uniqueness checks look across all families even though
/// every other operation is scoped to `Self::Item`.
pub trait ContentTypeRepository {
    type Item: ComposableType;

    /// Finds a content type by its numeric id.
    fn get(&self, id: NodeId) -> DomainResult<Option<Self::Item>>;

    fn get_by_key(&self, key: Uuid) -> DomainResult<Option<Self::Item>>;

    /// Finds a content type by alias, ignoring case.
    fn get_by_alias(&self, alias: &str) -> DomainResult<Option<Self::Item>>;

    /// Returns every content type of the family, ordered by id.
    fn get_all(&self) -> DomainResult<Vec<Self::Item>>;

    /// Returns the content types with the given ids; all of them when `ids` is empty.
    fn get_many(&self, ids: &[NodeId]) -> DomainResult<Vec<Self::Item>>;

    fn exists(&self, id: NodeId) -> DomainResult<bool>;

    /// Content types whose composition set contains `id` directly.
    fn get_types_directly_composed_of(&self, id: NodeId) -> DomainResult<Vec<Self::Item>>;

    /// Returns `candidate` if no content type uses it, otherwise `candidate`
    /// followed by the smallest free positive integer.
    fn get_unique_alias(&self, candidate: &str) -> DomainResult<String>;

    /// Inserts or updates a content type, assigning an id on insert.
    fn save(&mut self, item: &mut Self::Item) -> DomainResult<()>;

    /// Returns `Ok(true)` if the content type was deleted, `Ok(false)` if it was not found.
    fn delete(&mut self, id: NodeId) -> DomainResult<bool>;

    /// Moves a content type into a container, or to the root when `container` is `None`.
    fn move_to(
        &mut self,
        moving: &mut Self::Item,
        container: Option<&EntityContainer>,
    ) -> DomainResult<Vec<MoveEventInfo>>;

    /// True if any node on the serialised path is a list-view content type.
    fn has_container_in_path(&self, path: &str) -> DomainResult<bool>;
}
