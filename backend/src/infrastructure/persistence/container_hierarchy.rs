use crate::application::cache::ReadThroughCache;
use crate::application::repositories::{
    EntityContainerRepository, NodeCommand, NodeQuery, NodeRow, NodeStore,
};
use crate::domain::{
    DomainError, DomainResult, Entity, EntityContainer, MoveEventInfo, NodeId, NodePath,
    ObjectType,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Containers of one object-type partition, stored as nodes
///
/// Paths are never stored; they are derived from parent pointers on demand,
/// so a move rewrites exactly one parent pointer.
pub struct ContainerHierarchy<S: NodeStore> {
    store: Arc<S>,
    container_object_type: ObjectType,
    cache: ReadThroughCache<EntityContainer>,
}

impl<S: NodeStore> ContainerHierarchy<S> {
    pub fn new(
        store: Arc<S>,
        container_object_type: ObjectType,
        cache: ReadThroughCache<EntityContainer>,
    ) -> DomainResult<Self> {
        if !container_object_type.is_container() {
            return Err(DomainError::InvalidValue(format!(
                "{} is not a container object type",
                container_object_type
            )));
        }

        Ok(ContainerHierarchy {
            store,
            container_object_type,
            cache,
        })
    }

    pub fn container_object_type(&self) -> ObjectType {
        self.container_object_type
    }

    /// True if `ancestor` appears as an id segment of the serialised path
    pub fn path_contains(path: &str, ancestor: NodeId) -> bool {
        path.split(',')
            .filter_map(|segment| segment.trim().parse::<i32>().ok())
            .any(|id| id == ancestor.value())
    }

    pub fn has_children(&self, id: NodeId) -> DomainResult<bool> {
        Ok(self.store.count(&NodeQuery::ChildrenOf(id))? > 0)
    }

    /// Containers along a path, root side first, excluding the leaf
    pub fn ancestors(&self, path: &NodePath) -> DomainResult<Vec<EntityContainer>> {
        let ids = path.ids();
        let mut ancestors = Vec::new();
        for id in ids.iter().take(ids.len().saturating_sub(1)) {
            if id.is_root() {
                continue;
            }
            if let Some(container) = self.get(*id)? {
                ancestors.push(container);
            }
        }
        Ok(ancestors)
    }

    /// Re-read a move destination from storage and check it belongs to this partition
    pub fn resolve_move_target(&self, id: NodeId) -> DomainResult<EntityContainer> {
        let row = self
            .store
            .find_one(&NodeQuery::ById(id))?
            .ok_or_else(|| DomainError::NotFound(format!("Container {} not found", id)))?;
        let actual = row.object_type;
        self.to_container(row)
            .ok_or(DomainError::InvalidMoveTarget { container: id, actual })
    }

    fn to_container(&self, row: NodeRow) -> Option<EntityContainer> {
        if row.object_type != self.container_object_type {
            return None;
        }
        Some(EntityContainer::restore(
            row.id,
            row.key,
            row.name,
            row.parent_id,
            row.object_type,
            row.created_at,
            row.updated_at,
        ))
    }

    fn to_row(container: &EntityContainer) -> NodeRow {
        NodeRow {
            id: *container.id(),
            key: container.key(),
            object_type: container.container_object_type(),
            parent_id: container.parent_id(),
            name: container.name().to_string(),
            alias: None,
            is_container: false,
            composition_ids: Vec::new(),
            extra: Value::Null,
            created_at: container.created_at(),
            updated_at: container.updated_at(),
        }
    }

    fn fetch(&self, query: &NodeQuery) -> DomainResult<Vec<EntityContainer>> {
        Ok(self
            .store
            .find(query)?
            .into_iter()
            .filter_map(|row| self.to_container(row))
            .collect())
    }

    fn ensure_partition(&self, actual: ObjectType) -> DomainResult<()> {
        if actual != self.container_object_type {
            return Err(DomainError::InvalidContainerType {
                expected: self.container_object_type,
                actual,
            });
        }
        Ok(())
    }

    /// A parent must be the root or a container of the same partition
    fn ensure_parent(&self, parent_id: NodeId) -> DomainResult<()> {
        if parent_id.is_root() {
            return Ok(());
        }
        let parent = self
            .store
            .find_one(&NodeQuery::ById(parent_id))?
            .ok_or_else(|| DomainError::NotFound(format!("Parent container {} not found", parent_id)))?;
        self.ensure_partition(parent.object_type)
    }

    fn existing_row(&self, id: NodeId) -> DomainResult<NodeRow> {
        self.store
            .find_one(&NodeQuery::ById(id))?
            .filter(|row| row.object_type == self.container_object_type)
            .ok_or_else(|| DomainError::NotFound(format!("Container {} not found", id)))
    }
}

impl<S: NodeStore> EntityContainerRepository for ContainerHierarchy<S> {
    fn get(&self, id: NodeId) -> DomainResult<Option<EntityContainer>> {
        if !id.is_persisted() {
            return Ok(None);
        }
        self.cache
            .get(&id, || Ok(self.fetch(&NodeQuery::ById(id))?.into_iter().next()))
    }

    fn get_by_key(&self, key: Uuid) -> DomainResult<Option<EntityContainer>> {
        Ok(self.fetch(&NodeQuery::ByKey(key))?.into_iter().next())
    }

    fn get_children(&self, parent_id: NodeId) -> DomainResult<Vec<EntityContainer>> {
        self.fetch(&NodeQuery::ChildrenOf(parent_id))
    }

    fn get_all(&self) -> DomainResult<Vec<EntityContainer>> {
        let query = NodeQuery::OfObjectType(self.container_object_type);
        self.cache
            .get_all(|| self.fetch(&query), || self.store.count(&query))
    }

    fn save(&mut self, container: &mut EntityContainer) -> DomainResult<()> {
        self.ensure_partition(container.container_object_type())?;

        if container.has_identity() {
            let existing = self.existing_row(*container.id())?;
            if existing.parent_id != container.parent_id() {
                return Err(DomainError::InvalidOperation(format!(
                    "Cannot save container {} with a modified parent, move the container instead",
                    container.id()
                )));
            }
            self.store
                .execute(&NodeCommand::Update(Self::to_row(container)))?;
        } else {
            self.ensure_parent(container.parent_id())?;
            let id = self.store.insert(&Self::to_row(container))?;
            container.assign_id(id);
        }

        self.cache.invalidate();
        info!(
            "Saved container {} ({}) under {}",
            container.name(),
            container.id(),
            container.parent_id()
        );
        Ok(())
    }

    fn move_container(
        &mut self,
        container: &mut EntityContainer,
        new_parent_id: NodeId,
    ) -> DomainResult<Vec<MoveEventInfo>> {
        self.ensure_partition(container.container_object_type())?;
        let id = *container.id();
        let existing = self.existing_row(id)?;
        self.ensure_parent(new_parent_id)?;

        // Walk up from the target; meeting the moving container means a cycle
        if new_parent_id == id || self.store.path_of(new_parent_id)?.contains(id) {
            return Err(DomainError::CyclicContainerMove {
                container: id,
                target: new_parent_id,
            });
        }

        if existing.parent_id == new_parent_id {
            container.set_parent_id(new_parent_id);
            return Ok(Vec::new());
        }

        let mut events = vec![MoveEventInfo {
            entity_id: id,
            object_type: existing.object_type,
            original_path: self.store.path_of(id)?,
            new_parent_id,
        }];
        for descendant in self.store.descendants_of(id)? {
            events.push(MoveEventInfo {
                entity_id: descendant.id,
                object_type: descendant.object_type,
                original_path: self.store.path_of(descendant.id)?,
                new_parent_id: descendant.parent_id,
            });
        }

        self.store.execute(&NodeCommand::SetParent {
            id,
            parent_id: new_parent_id,
        })?;
        container.set_parent_id(new_parent_id);
        self.cache.invalidate();

        info!(
            "Moved container {} to {} ({} nodes affected)",
            id,
            new_parent_id,
            events.len()
        );
        Ok(events)
    }

    fn delete(&mut self, id: NodeId) -> DomainResult<bool> {
        if self.get(id)?.is_none() {
            return Ok(false);
        }
        if self.has_children(id)? {
            return Err(DomainError::InvalidOperation(format!(
                "Container {} is not empty",
                id
            )));
        }

        let affected = self.store.execute(&NodeCommand::Delete(id))?;
        self.cache.invalidate();
        info!("Deleted container {}", id);
        Ok(affected > 0)
    }

    fn path_of(&self, id: NodeId) -> DomainResult<NodePath> {
        self.existing_row(id)?;
        self.store.path_of(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::{CacheKeys, CacheRetrievalPolicy};
    use crate::infrastructure::persistence::SqliteNodeStore;

    fn hierarchy(store: Arc<SqliteNodeStore>, object_type: ObjectType) -> ContainerHierarchy<SqliteNodeStore> {
        let cache = ReadThroughCache::in_memory(Arc::new(CacheKeys::new()), CacheRetrievalPolicy::default());
        ContainerHierarchy::new(store, object_type, cache).unwrap()
    }

    fn document_folders() -> ContainerHierarchy<SqliteNodeStore> {
        hierarchy(
            Arc::new(SqliteNodeStore::new_in_memory().unwrap()),
            ObjectType::DOCUMENT_TYPE_CONTAINER,
        )
    }

    fn create(
        containers: &mut ContainerHierarchy<SqliteNodeStore>,
        name: &str,
        parent_id: NodeId,
    ) -> EntityContainer {
        let mut container = EntityContainer::new(ObjectType::DOCUMENT_TYPE, name, parent_id).unwrap();
        containers.save(&mut container).unwrap();
        container
    }

    #[test]
    fn test_new_rejects_non_container_type() {
        let store = Arc::new(SqliteNodeStore::new_in_memory().unwrap());
        let cache = ReadThroughCache::in_memory(Arc::new(CacheKeys::new()), CacheRetrievalPolicy::default());
        assert!(ContainerHierarchy::new(store, ObjectType::DOCUMENT_TYPE, cache).is_err());
    }

    #[test]
    fn test_save_and_get() {
        let mut containers = document_folders();
        let folder = create(&mut containers, "Pages", NodeId::ROOT);

        assert!(folder.has_identity());
        let loaded = containers.get(*folder.id()).unwrap().unwrap();
        assert_eq!(loaded.name(), "Pages");
        assert_eq!(loaded.parent_id(), NodeId::ROOT);
        assert_eq!(containers.get_by_key(folder.key()).unwrap(), Some(loaded));
    }

    #[test]
    fn test_save_rejects_other_partition() {
        let mut containers = document_folders();
        let mut media_folder = EntityContainer::new(ObjectType::MEDIA_TYPE, "Images", NodeId::ROOT).unwrap();

        let result = containers.save(&mut media_folder);
        assert_eq!(
            result,
            Err(DomainError::InvalidContainerType {
                expected: ObjectType::DOCUMENT_TYPE_CONTAINER,
                actual: ObjectType::MEDIA_TYPE_CONTAINER,
            })
        );
    }

    #[test]
    fn test_save_rejects_parent_change() {
        let mut containers = document_folders();
        let a = create(&mut containers, "A", NodeId::ROOT);
        let mut b = create(&mut containers, "B", NodeId::ROOT);

        b.set_parent_id(*a.id());
        assert!(matches!(
            containers.save(&mut b),
            Err(DomainError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_rename_round_trip() {
        let mut containers = document_folders();
        let mut folder = create(&mut containers, "Pages", NodeId::ROOT);
        containers.get_all().unwrap();

        folder.rename("Site Pages").unwrap();
        containers.save(&mut folder).unwrap();

        let all = containers.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name(), "Site Pages");
    }

    #[test]
    fn test_move_reports_descendants() {
        let mut containers = document_folders();
        let a = create(&mut containers, "A", NodeId::ROOT);
        let mut b = create(&mut containers, "B", *a.id());
        let c = create(&mut containers, "C", *b.id());
        let target = create(&mut containers, "Target", NodeId::ROOT);

        let events = containers.move_container(&mut b, *target.id()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].entity_id, *b.id());
        assert_eq!(events[0].new_parent_id, *target.id());
        assert_eq!(events[0].original_path.to_string(), format!("-1,{},{}", a.id(), b.id()));
        assert_eq!(events[1].entity_id, *c.id());
        assert_eq!(events[1].new_parent_id, *b.id());

        assert_eq!(
            containers.path_of(*c.id()).unwrap().to_string(),
            format!("-1,{},{},{}", target.id(), b.id(), c.id())
        );
        assert_eq!(b.parent_id(), *target.id());
    }

    #[test]
    fn test_move_under_own_descendant_is_rejected() {
        let mut containers = document_folders();
        let mut a = create(&mut containers, "A", NodeId::ROOT);
        let b = create(&mut containers, "B", *a.id());
        let c = create(&mut containers, "C", *b.id());

        let result = containers.move_container(&mut a, *c.id());
        assert_eq!(
            result,
            Err(DomainError::CyclicContainerMove {
                container: *a.id(),
                target: *c.id(),
            })
        );

        // Nothing was written
        assert_eq!(containers.get(*a.id()).unwrap().unwrap().parent_id(), NodeId::ROOT);
        assert_eq!(a.parent_id(), NodeId::ROOT);
        assert_eq!(containers.get(*c.id()).unwrap().unwrap().parent_id(), *b.id());
    }

    #[test]
    fn test_move_under_itself_is_rejected() {
        let mut containers = document_folders();
        let mut a = create(&mut containers, "A", NodeId::ROOT);
        let id = *a.id();

        assert!(matches!(
            containers.move_container(&mut a, id),
            Err(DomainError::CyclicContainerMove { .. })
        ));
    }

    #[test]
    fn test_move_to_root() {
        let mut containers = document_folders();
        let a = create(&mut containers, "A", NodeId::ROOT);
        let mut b = create(&mut containers, "B", *a.id());

        let events = containers.move_container(&mut b, NodeId::ROOT).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(containers.path_of(*b.id()).unwrap().to_string(), format!("-1,{}", b.id()));
    }

    #[test]
    fn test_delete_requires_empty_container() {
        let mut containers = document_folders();
        let a = create(&mut containers, "A", NodeId::ROOT);
        let b = create(&mut containers, "B", *a.id());

        assert!(matches!(
            containers.delete(*a.id()),
            Err(DomainError::InvalidOperation(_))
        ));
        assert!(containers.delete(*b.id()).unwrap());
        assert!(containers.delete(*a.id()).unwrap());
        assert!(!containers.delete(*a.id()).unwrap());
    }

    #[test]
    fn test_partitions_do_not_see_each_other() {
        let store = Arc::new(SqliteNodeStore::new_in_memory().unwrap());
        let mut documents = hierarchy(Arc::clone(&store), ObjectType::DOCUMENT_TYPE_CONTAINER);
        let media = hierarchy(store, ObjectType::MEDIA_TYPE_CONTAINER);

        let folder = create(&mut documents, "Pages", NodeId::ROOT);
        assert!(media.get(*folder.id()).unwrap().is_none());
        assert!(media.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_ancestors() {
        let mut containers = document_folders();
        let a = create(&mut containers, "A", NodeId::ROOT);
        let b = create(&mut containers, "B", *a.id());
        let c = create(&mut containers, "C", *b.id());

        let path = containers.path_of(*c.id()).unwrap();
        let names: Vec<_> = containers
            .ancestors(&path)
            .unwrap()
            .iter()
            .map(|container| container.name().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_resolve_move_target() {
        let store = Arc::new(SqliteNodeStore::new_in_memory().unwrap());
        let mut documents = hierarchy(Arc::clone(&store), ObjectType::DOCUMENT_TYPE_CONTAINER);
        let mut media = hierarchy(store, ObjectType::MEDIA_TYPE_CONTAINER);

        let mut pages = EntityContainer::new(ObjectType::DOCUMENT_TYPE, "Pages", NodeId::ROOT).unwrap();
        documents.save(&mut pages).unwrap();
        let mut images = EntityContainer::new(ObjectType::MEDIA_TYPE, "Images", NodeId::ROOT).unwrap();
        media.save(&mut images).unwrap();

        assert_eq!(documents.resolve_move_target(*pages.id()).unwrap().name(), "Pages");
        assert_eq!(
            documents.resolve_move_target(*images.id()),
            Err(DomainError::InvalidMoveTarget {
                container: *images.id(),
                actual: ObjectType::MEDIA_TYPE_CONTAINER,
            })
        );
        assert!(matches!(
            documents.resolve_move_target(NodeId::new(999)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_path_contains() {
        type Hierarchy = ContainerHierarchy<SqliteNodeStore>;
        assert!(Hierarchy::path_contains("-1,12,34", NodeId::new(12)));
        assert!(Hierarchy::path_contains("-1, 12 ,34", NodeId::new(34)));
        assert!(!Hierarchy::path_contains("-1,123,34", NodeId::new(12)));
        assert!(!Hierarchy::path_contains("", NodeId::new(12)));
    }
}
