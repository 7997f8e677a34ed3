/// Content type management operations layered over the repositories
use crate::application::repositories::{ContentTypeRepository, EntityContainerRepository, NodeStore};
use crate::domain::{
    compare_similar_names, unique_name, Alias, ComposableType, DomainError, EntityContainer,
    MoveEventInfo, NodeId, ObjectType,
};
use crate::infrastructure::persistence::{ContainerHierarchy, ContentTypeCompositionRepository};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq)]
pub enum ContentTypeServiceError {
    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),

    #[error("Content type {0} not found")]
    TypeNotFound(NodeId),

    #[error("Container {0} not found")]
    ContainerNotFound(NodeId),

    #[error("Container {0} is not empty")]
    ContainerNotEmpty(NodeId),

    #[error("{0} types cannot be organised in containers")]
    ContainersNotSupported(ObjectType),
}

pub type ContentTypeServiceResult<T> = Result<T, ContentTypeServiceError>;

/// Service for managing one content type family and its containers
pub struct ContentTypeService<T: ComposableType, S: NodeStore> {
    repository: ContentTypeCompositionRepository<T, S>,
}

impl<T: ComposableType, S: NodeStore> ContentTypeService<T, S> {
    pub fn new(repository: ContentTypeCompositionRepository<T, S>) -> Self {
        ContentTypeService { repository }
    }

    pub fn repository(&self) -> &ContentTypeCompositionRepository<T, S> {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut ContentTypeCompositionRepository<T, S> {
        &mut self.repository
    }

    fn containers(&self) -> ContentTypeServiceResult<&ContainerHierarchy<S>> {
        self.repository
            .containers()
            .ok_or(ContentTypeServiceError::ContainersNotSupported(T::OBJECT_TYPE))
    }

    fn containers_mut(&mut self) -> ContentTypeServiceResult<&mut ContainerHierarchy<S>> {
        self.repository
            .containers_mut()
            .ok_or(ContentTypeServiceError::ContainersNotSupported(T::OBJECT_TYPE))
    }

    fn require_type(&self, id: NodeId) -> ContentTypeServiceResult<T> {
        self.repository
            .get(id)?
            .ok_or(ContentTypeServiceError::TypeNotFound(id))
    }

    fn require_container(&self, id: NodeId) -> ContentTypeServiceResult<EntityContainer> {
        self.containers()?
            .get(id)?
            .ok_or(ContentTypeServiceError::ContainerNotFound(id))
    }

    /// Copy a content type into a container, or to the root with [`NodeId::ROOT`]
    ///
    /// The copy gets a fresh identity, a unique alias and a unique
    /// `"<name> (copy)"` name. When the original sits below another content
    /// type, the composition with that parent type is not carried over.
    pub fn copy(&mut self, id: NodeId, container_id: NodeId) -> ContentTypeServiceResult<T> {
        if !container_id.is_root() {
            self.require_container(container_id)?;
        }
        let original = self.require_type(id)?;

        let alias = Alias::new(self.repository.get_unique_alias(original.alias().as_str())?)?;
        let siblings = self.repository.child_names(container_id)?;
        let name = unique_name(
            siblings.iter().map(String::as_str),
            &format!("{} (copy)", original.name()),
        );

        let mut copy = original.clone();
        *copy.composition_mut() = original.composition().clone_with_new_identity(alias);

        let original_parent = original.parent_id();
        if original_parent.is_persisted() && self.repository.exists(original_parent)? {
            copy.composition_mut().remove_composition(original_parent);
        }
        copy.composition_mut().set_parent_id(container_id);
        copy.composition_mut().set_name(name);

        self.repository.save(&mut copy)?;
        info!(
            "Copied {} {} to {} as {}",
            T::OBJECT_TYPE,
            original.alias(),
            container_id,
            copy.alias()
        );
        Ok(copy)
    }

    /// Move a content type into a container, or to the root with [`NodeId::ROOT`]
    pub fn move_type(
        &mut self,
        id: NodeId,
        container_id: NodeId,
    ) -> ContentTypeServiceResult<Vec<MoveEventInfo>> {
        let mut moving = self.require_type(id)?;
        if container_id.is_root() {
            return Ok(self.repository.move_to(&mut moving, None)?);
        }

        let container = self.require_container(container_id)?;
        Ok(self.repository.move_to(&mut moving, Some(&container))?)
    }

    /// Content types directly below `parent_id`, ordered by display name
    pub fn list_in(&self, parent_id: NodeId) -> ContentTypeServiceResult<Vec<T>> {
        let mut children: Vec<T> = self
            .repository
            .get_all()?
            .into_iter()
            .filter(|item| item.parent_id() == parent_id)
            .collect();
        children.sort_by(|a, b| compare_similar_names(a.name(), b.name()));
        Ok(children)
    }

    pub fn create_container(
        &mut self,
        parent_id: NodeId,
        name: &str,
        key: Option<Uuid>,
    ) -> ContentTypeServiceResult<EntityContainer> {
        self.containers()?;
        if !parent_id.is_root() {
            self.require_container(parent_id)?;
        }

        let mut container = EntityContainer::new(T::OBJECT_TYPE, name, parent_id)?;
        if let Some(key) = key {
            container = container.with_key(key);
        }
        self.containers_mut()?.save(&mut container)?;
        Ok(container)
    }

    pub fn rename_container(
        &mut self,
        id: NodeId,
        name: &str,
    ) -> ContentTypeServiceResult<EntityContainer> {
        let mut container = self.require_container(id)?;
        container.rename(name)?;
        self.containers_mut()?.save(&mut container)?;
        Ok(container)
    }

    pub fn move_container(
        &mut self,
        id: NodeId,
        new_parent_id: NodeId,
    ) -> ContentTypeServiceResult<Vec<MoveEventInfo>> {
        let mut container = self.require_container(id)?;
        if !new_parent_id.is_root() {
            self.require_container(new_parent_id)?;
        }
        Ok(self
            .containers_mut()?
            .move_container(&mut container, new_parent_id)?)
    }

    /// Returns `Ok(false)` when there is no such container
    pub fn delete_container(&mut self, id: NodeId) -> ContentTypeServiceResult<bool> {
        let containers = self.containers()?;
        if containers.get(id)?.is_none() {
            return Ok(false);
        }
        if containers.has_children(id)? {
            return Err(ContentTypeServiceError::ContainerNotEmpty(id));
        }
        Ok(self.containers_mut()?.delete(id)?)
    }

    /// Containers a content type sits in, outermost first
    pub fn containers_of(&self, id: NodeId) -> ContentTypeServiceResult<Vec<EntityContainer>> {
        self.require_type(id)?;
        let path = self.repository.path_of(id)?;
        Ok(self.containers()?.ancestors(&path)?)
    }
}
