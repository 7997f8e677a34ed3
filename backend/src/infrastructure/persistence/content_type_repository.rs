use super::container_hierarchy::ContainerHierarchy;
use crate::application::cache::{CacheKeys, CacheRetrievalPolicy, ReadThroughCache};
use crate::application::repositories::{
    ContentTypeRepository, NodeCommand, NodeQuery, NodeRow, NodeStore,
};
use crate::domain::{
    Alias, ComposableType, ContentTypeComposition, DomainError, DomainResult, Entity,
    EntityContainer, MoveEventInfo, NodeId, NodePath, ObjectType,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Persistence for one content type family over a [`NodeStore`]
///
/// Reads go through a [`ReadThroughCache`]; every write clears the family's
/// cache prefix. Families without a container partition (member types) have
/// no [`ContainerHierarchy`].
pub struct ContentTypeCompositionRepository<T: ComposableType, S: NodeStore> {
    store: Arc<S>,
    containers: Option<ContainerHierarchy<S>>,
    cache: ReadThroughCache<T>,
}

impl<T: ComposableType, S: NodeStore> ContentTypeCompositionRepository<T, S> {
    pub fn new(
        store: Arc<S>,
        cache: ReadThroughCache<T>,
        containers: Option<ContainerHierarchy<S>>,
    ) -> DomainResult<Self> {
        if let Some(ref hierarchy) = containers {
            let expected = T::container_object_type().ok_or_else(|| {
                DomainError::InvalidValue(format!(
                    "{} types cannot be organised in containers",
                    T::OBJECT_TYPE
                ))
            })?;
            if hierarchy.container_object_type() != expected {
                return Err(DomainError::InvalidContainerType {
                    expected,
                    actual: hierarchy.container_object_type(),
                });
            }
        }

        Ok(ContentTypeCompositionRepository {
            store,
            containers,
            cache,
        })
    }

    /// Repository with in-memory caches and, where the family has one, its container hierarchy
    pub fn with_policies(
        store: Arc<S>,
        keys: Arc<CacheKeys>,
        policy: CacheRetrievalPolicy,
        container_policy: CacheRetrievalPolicy,
    ) -> DomainResult<Self> {
        let containers = match T::container_object_type() {
            Some(container_type) => Some(ContainerHierarchy::new(
                Arc::clone(&store),
                container_type,
                ReadThroughCache::in_memory(Arc::clone(&keys), container_policy),
            )?),
            None => None,
        };
        let cache = ReadThroughCache::in_memory(keys, policy);
        ContentTypeCompositionRepository::new(store, cache, containers)
    }

    pub fn containers(&self) -> Option<&ContainerHierarchy<S>> {
        self.containers.as_ref()
    }

    pub fn containers_mut(&mut self) -> Option<&mut ContainerHierarchy<S>> {
        self.containers.as_mut()
    }

    /// Path of any node in the family's tree
    pub fn path_of(&self, id: NodeId) -> DomainResult<NodePath> {
        self.store.path_of(id)
    }

    /// Names of every node directly below `parent_id`, of any object type
    pub fn child_names(&self, parent_id: NodeId) -> DomainResult<Vec<String>> {
        Ok(self
            .store
            .find(&NodeQuery::ChildrenOf(parent_id))?
            .into_iter()
            .map(|row| row.name)
            .collect())
    }

    fn to_item(row: NodeRow) -> DomainResult<T> {
        let alias = Alias::new(row.alias.unwrap_or_default())?;
        let composition = ContentTypeComposition::restore(
            row.id,
            row.key,
            alias,
            row.name,
            row.parent_id,
            row.composition_ids.into_iter().collect(),
            row.is_container,
            row.created_at,
            row.updated_at,
        );
        T::from_parts(composition, &row.extra)
    }

    fn to_row(item: &T) -> NodeRow {
        let composition = item.composition();
        NodeRow {
            id: *item.id(),
            key: composition.key(),
            object_type: T::OBJECT_TYPE,
            parent_id: composition.parent_id(),
            name: composition.name().to_string(),
            alias: Some(composition.alias().as_str().to_string()),
            is_container: composition.is_container(),
            composition_ids: composition.composition_ids().iter().copied().collect(),
            extra: item.extra(),
            created_at: composition.created_at(),
            updated_at: composition.updated_at(),
        }
    }

    fn fetch(&self, query: &NodeQuery) -> DomainResult<Vec<T>> {
        self.store
            .find(query)?
            .into_iter()
            .filter(|row| row.object_type == T::OBJECT_TYPE)
            .map(Self::to_item)
            .collect()
    }

    fn fetch_one(&self, query: &NodeQuery) -> DomainResult<Option<T>> {
        Ok(self.fetch(query)?.into_iter().next())
    }

    fn existing_row(&self, id: NodeId) -> DomainResult<NodeRow> {
        self.store
            .find_one(&NodeQuery::ById(id))?
            .filter(|row| row.object_type == T::OBJECT_TYPE)
            .ok_or_else(|| DomainError::NotFound(format!("Content type {} not found", id)))
    }

    /// Aliases are unique across every family, ignoring case
    fn ensure_alias_free(&self, item: &T) -> DomainResult<()> {
        let alias = item.alias();
        let taken = self
            .store
            .find(&NodeQuery::ByAlias(alias.as_str().to_string()))?
            .into_iter()
            .filter(|row| row.id != *item.id())
            .any(|row| row.alias.as_deref().is_some_and(|other| alias.matches(other)));
        if taken {
            return Err(DomainError::AliasCollision(alias.as_str().to_string()));
        }
        Ok(())
    }

    /// A parent is the root, a container of the family's partition, or a type of the same family
    fn ensure_parent(&self, item: &T) -> DomainResult<()> {
        let parent_id = item.parent_id();
        if parent_id.is_root() {
            return Ok(());
        }

        let parent = self
            .store
            .find_one(&NodeQuery::ById(parent_id))?
            .ok_or_else(|| DomainError::NotFound(format!("Parent node {} not found", parent_id)))?;
        if parent.id == *item.id() {
            return Err(DomainError::InvalidOperation(format!(
                "Content type {} cannot be its own parent",
                parent_id
            )));
        }

        let container_type = T::container_object_type();
        if parent.object_type == T::OBJECT_TYPE || Some(parent.object_type) == container_type {
            return Ok(());
        }
        Err(DomainError::InvalidContainerType {
            expected: container_type.unwrap_or(T::OBJECT_TYPE),
            actual: parent.object_type,
        })
    }

    /// Composed types must exist in the same family and must not lead back to `item`
    fn ensure_compositions(&self, item: &T) -> DomainResult<()> {
        let id = *item.id();
        for composed in item.composition().composition_ids() {
            let row = self
                .store
                .find_one(&NodeQuery::ById(*composed))?
                .ok_or_else(|| {
                    DomainError::NotFound(format!("Composed content type {} not found", composed))
                })?;
            if row.object_type != T::OBJECT_TYPE {
                return Err(DomainError::InvalidValue(format!(
                    "Content type {} can only compose {} types, {} is {}",
                    item.alias(),
                    T::OBJECT_TYPE,
                    composed,
                    row.object_type
                )));
            }
            if id.is_persisted() && self.reaches(*composed, id)? {
                return Err(DomainError::CyclicComposition {
                    type_id: id,
                    composed: *composed,
                });
            }
        }
        Ok(())
    }

    /// True if `target` is `start` or is reachable from it through composition edges
    fn reaches(&self, start: NodeId, target: NodeId) -> DomainResult<bool> {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if current == target {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(row) = self.store.find_one(&NodeQuery::ById(current))? {
                stack.extend(row.composition_ids);
            }
        }
        Ok(false)
    }

    fn move_events(
        &self,
        id: NodeId,
        object_type: ObjectType,
        new_parent_id: NodeId,
    ) -> DomainResult<Vec<MoveEventInfo>> {
        let mut events = vec![MoveEventInfo {
            entity_id: id,
            object_type,
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
        Ok(events)
    }
}

impl<T: ComposableType, S: NodeStore> ContentTypeRepository for ContentTypeCompositionRepository<T, S> {
    type Item = T;

    fn get(&self, id: NodeId) -> DomainResult<Option<T>> {
        if !id.is_persisted() {
            return Ok(None);
        }
        self.cache
            .get(&id, || self.fetch_one(&NodeQuery::ById(id)))
    }

    fn get_by_key(&self, key: Uuid) -> DomainResult<Option<T>> {
        self.fetch_one(&NodeQuery::ByKey(key))
    }

    fn get_by_alias(&self, alias: &str) -> DomainResult<Option<T>> {
        Ok(self
            .fetch(&NodeQuery::ByAlias(alias.to_string()))?
            .into_iter()
            .find(|item| item.alias().matches(alias)))
    }

    fn get_all(&self) -> DomainResult<Vec<T>> {
        let query = NodeQuery::OfObjectType(T::OBJECT_TYPE);
        self.cache
            .get_all(|| self.fetch(&query), || self.store.count(&query))
    }

    fn get_many(&self, ids: &[NodeId]) -> DomainResult<Vec<T>> {
        let all = self.get_all()?;
        if ids.is_empty() {
            return Ok(all);
        }
        let wanted: BTreeSet<NodeId> = ids.iter().copied().collect();
        Ok(all
            .into_iter()
            .filter(|item| wanted.contains(item.id()))
            .collect())
    }

    fn exists(&self, id: NodeId) -> DomainResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    fn get_types_directly_composed_of(&self, id: NodeId) -> DomainResult<Vec<T>> {
        self.fetch(&NodeQuery::ComposedOf(id))
    }

    fn get_unique_alias(&self, candidate: &str) -> DomainResult<String> {
        let candidate = Alias::new(candidate.trim())?;
        let candidate = candidate.as_str();

        let taken: HashSet<String> = self
            .store
            .find(&NodeQuery::AliasStartsWith(candidate.to_string()))?
            .into_iter()
            .filter_map(|row| row.alias)
            .map(|alias| Alias::normalize(&alias))
            .collect();

        if !taken.contains(&Alias::normalize(candidate)) {
            return Ok(candidate.to_string());
        }

        let mut index = 1u32;
        loop {
            let attempt = format!("{}{}", candidate, index);
            if !taken.contains(&Alias::normalize(&attempt)) {
                return Ok(attempt);
            }
            index += 1;
        }
    }

    fn save(&mut self, item: &mut T) -> DomainResult<()> {
        self.ensure_alias_free(item)?;
        self.ensure_compositions(item)?;

        if item.composition().has_identity() {
            let existing = self.existing_row(*item.id())?;
            if existing.parent_id != item.parent_id() {
                return Err(DomainError::InvalidOperation(format!(
                    "Cannot save content type {} with a modified parent, move it instead",
                    item.alias()
                )));
            }
            self.store.execute(&NodeCommand::Update(Self::to_row(item)))?;
        } else {
            self.ensure_parent(item)?;
            let id = self.store.insert(&Self::to_row(item))?;
            item.composition_mut().assign_id(id);
        }

        self.cache.invalidate();
        info!("Saved {} {} ({})", T::OBJECT_TYPE, item.alias(), item.id());
        Ok(())
    }

    fn delete(&mut self, id: NodeId) -> DomainResult<bool> {
        let Some(item) = self.get(id)? else {
            return Ok(false);
        };
        if self.store.count(&NodeQuery::ChildrenOf(id))? > 0 {
            return Err(DomainError::InvalidOperation(format!(
                "Content type {} still has child nodes",
                item.alias()
            )));
        }

        let affected = self.store.execute(&NodeCommand::Delete(id))?;
        self.cache.invalidate();
        info!("Deleted {} {} ({})", T::OBJECT_TYPE, item.alias(), id);
        Ok(affected > 0)
    }

    fn move_to(
        &mut self,
        moving: &mut T,
        container: Option<&EntityContainer>,
    ) -> DomainResult<Vec<MoveEventInfo>> {
        let id = *moving.id();
        if !id.is_persisted() {
            return Err(DomainError::NotFound(format!(
                "Content type {} has not been saved",
                moving.alias()
            )));
        }
        self.existing_row(id)?;

        let target = match container {
            None => NodeId::ROOT,
            Some(container) => {
                let container_id = *container.id();
                let hierarchy = self.containers.as_ref().ok_or(DomainError::InvalidMoveTarget {
                    container: container_id,
                    actual: container.container_object_type(),
                })?;
                if !container.has_identity() {
                    return Err(DomainError::NotFound(format!(
                        "Container {} has not been saved",
                        container.name()
                    )));
                }

                // The stored row decides the partition, not the caller's copy
                let stored = hierarchy.resolve_move_target(container_id)?;
                let container_path = self.store.path_of(*stored.id())?.to_string();
                if ContainerHierarchy::<S>::path_contains(&container_path, id) {
                    return Err(DomainError::CyclicMove {
                        moving: id,
                        target: container_id,
                    });
                }
                container_id
            }
        };

        let events = self.move_events(id, T::OBJECT_TYPE, target)?;
        self.store.execute(&NodeCommand::SetParent {
            id,
            parent_id: target,
        })?;
        moving.composition_mut().set_parent_id(target);
        self.cache.invalidate();

        info!(
            "Moved {} {} to {} ({} nodes affected)",
            T::OBJECT_TYPE,
            moving.alias(),
            target,
            events.len()
        );
        Ok(events)
    }

    fn has_container_in_path(&self, path: &str) -> DomainResult<bool> {
        Ok(self
            .store
            .find(&NodeQuery::ListViewTypes)?
            .iter()
            .any(|row| ContainerHierarchy::<S>::path_contains(path, row.id)))
    }
}
