/// Domain entities
use super::base::{DomainError, DomainResult, Entity};
use super::value_objects::{NodeId, ObjectType};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A folder-like node grouping type definitions of one object-type partition
///
/// A container knows its parent only; its path is derived by the hierarchy
/// that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityContainer {
    id: NodeId,
    key: Uuid,
    name: String,
    parent_id: NodeId,
    container_object_type: ObjectType,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntityContainer {
    /// Create a new, unsaved container for items of `contained_type`
    pub fn new(
        contained_type: ObjectType,
        name: impl Into<String>,
        parent_id: NodeId,
    ) -> DomainResult<Self> {
        let container_object_type = contained_type.container_type().ok_or_else(|| {
            DomainError::InvalidValue(format!("{} items cannot be organised in containers", contained_type))
        })?;
        let name = validate_name(name.into())?;
        let now = Utc::now();

        Ok(EntityContainer {
            id: NodeId::UNSAVED,
            key: Uuid::new_v4(),
            name,
            parent_id,
            container_object_type,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a container from persisted state
    pub fn restore(
        id: NodeId,
        key: Uuid,
        name: String,
        parent_id: NodeId,
        container_object_type: ObjectType,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        EntityContainer {
            id,
            key,
            name,
            parent_id,
            container_object_type,
            created_at,
            updated_at,
        }
    }

    pub fn with_key(mut self, key: Uuid) -> Self {
        self.key = key;
        self
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        self.name = validate_name(name.into())?;
        self.touch();
        Ok(())
    }

    pub fn parent_id(&self) -> NodeId {
        self.parent_id
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: NodeId) {
        self.parent_id = parent_id;
        self.touch();
    }

    pub fn container_object_type(&self) -> ObjectType {
        self.container_object_type
    }

    /// Object type of the items this container organises
    pub fn contained_object_type(&self) -> Option<ObjectType> {
        self.container_object_type.contained_type()
    }

    pub fn has_identity(&self) -> bool {
        self.id.is_persisted()
    }

    pub(crate) fn assign_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Entity for EntityContainer {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidValue("Container name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_container_is_unsaved() {
        let container =
            EntityContainer::new(ObjectType::DOCUMENT_TYPE, "Pages", NodeId::ROOT).unwrap();

        assert_eq!(*container.id(), NodeId::UNSAVED);
        assert!(!container.has_identity());
        assert_eq!(container.name(), "Pages");
        assert_eq!(container.parent_id(), NodeId::ROOT);
        assert_eq!(
            container.container_object_type(),
            ObjectType::DOCUMENT_TYPE_CONTAINER
        );
        assert_eq!(container.contained_object_type(), Some(ObjectType::DOCUMENT_TYPE));
    }

    #[test]
    fn test_member_types_have_no_containers() {
        let result = EntityContainer::new(ObjectType::MEMBER_TYPE, "Members", NodeId::ROOT);
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn test_container_name_validation() {
        assert!(EntityContainer::new(ObjectType::MEDIA_TYPE, "  ", NodeId::ROOT).is_err());

        let mut container =
            EntityContainer::new(ObjectType::MEDIA_TYPE, " Images ", NodeId::ROOT).unwrap();
        assert_eq!(container.name(), "Images");

        container.rename("Photos").unwrap();
        assert_eq!(container.name(), "Photos");
        assert!(container.rename("").is_err());
        assert_eq!(container.name(), "Photos");
    }
}
