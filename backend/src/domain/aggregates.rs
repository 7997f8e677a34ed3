/// Domain aggregates
use super::base::{DomainError, DomainResult, Entity};
use super::value_objects::{Alias, NodeId, ObjectType};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use uuid::Uuid;

/// The shared state of every content type definition
///
/// Holds the direct compositions only; the composition graph as a whole is
/// validated by the repository when the type is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeComposition {
    id: NodeId,
    key: Uuid,
    alias: Alias,
    name: String,
    parent_id: NodeId,
    composition_ids: BTreeSet<NodeId>,
    is_container: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContentTypeComposition {
    /// Create a new, unsaved definition at the root
    pub fn new(alias: Alias, name: impl Into<String>) -> Self {
        let now = Utc::now();
        ContentTypeComposition {
            id: NodeId::UNSAVED,
            key: Uuid::new_v4(),
            alias,
            name: name.into(),
            parent_id: NodeId::ROOT,
            composition_ids: BTreeSet::new(),
            is_container: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a definition from persisted state
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: NodeId,
        key: Uuid,
        alias: Alias,
        name: String,
        parent_id: NodeId,
        composition_ids: BTreeSet<NodeId>,
        is_container: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        ContentTypeComposition {
            id,
            key,
            alias,
            name,
            parent_id,
            composition_ids,
            is_container,
            created_at,
            updated_at,
        }
    }

    /// Place the definition under a container (or another type) before it is saved
    pub fn in_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: Alias) {
        self.alias = alias;
        self.touch();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn parent_id(&self) -> NodeId {
        self.parent_id
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: NodeId) {
        self.parent_id = parent_id;
        self.touch();
    }

    pub fn composition_ids(&self) -> &BTreeSet<NodeId> {
        &self.composition_ids
    }

    /// True if `id` is a direct composition of this type
    pub fn composes(&self, id: NodeId) -> bool {
        self.composition_ids.contains(&id)
    }

    /// Compose another type into this one
    ///
    /// Returns `false` if the composition was already present. Only the
    /// self-reference is rejected here; transitive cycles need the whole graph
    /// and are rejected on save.
    pub fn add_composition(&mut self, id: NodeId) -> DomainResult<bool> {
        if !id.is_persisted() {
            return Err(DomainError::InvalidValue(format!(
                "Cannot compose an unsaved content type ({})",
                id
            )));
        }
        if id == self.id {
            return Err(DomainError::CyclicComposition {
                type_id: self.id,
                composed: id,
            });
        }
        let added = self.composition_ids.insert(id);
        if added {
            self.touch();
        }
        Ok(added)
    }

    pub fn remove_composition(&mut self, id: NodeId) -> bool {
        let removed = self.composition_ids.remove(&id);
        if removed {
            self.touch();
        }
        removed
    }

    /// List-view flag: content below a type with this flag is shown as a list
    pub fn is_container(&self) -> bool {
        self.is_container
    }

    pub fn set_is_container(&mut self, is_container: bool) {
        self.is_container = is_container;
        self.touch();
    }

    pub fn has_identity(&self) -> bool {
        self.id.is_persisted()
    }

    pub(crate) fn assign_id(&mut self, id: NodeId) {
        self.id = id;
    }

    /// Copy of this definition with a fresh identity and the given alias
    pub fn clone_with_new_identity(&self, alias: Alias) -> Self {
        let now = Utc::now();
        ContentTypeComposition {
            id: NodeId::UNSAVED,
            key: Uuid::new_v4(),
            alias,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
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

impl Entity for ContentTypeComposition {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Capability set shared by document, media and member types
///
/// Everything the repository engine needs: the shared composition state, the
/// family's object type, and the mapping of family-specific attributes to and
/// from the storage `extra` document.
pub trait ComposableType: Entity<Id = NodeId> + Clone + Send + Sync + 'static {
    const OBJECT_TYPE: ObjectType;

    fn composition(&self) -> &ContentTypeComposition;

    fn composition_mut(&mut self) -> &mut ContentTypeComposition;

    /// Family-specific attributes as stored alongside the shared columns
    fn extra(&self) -> Value;

    fn from_parts(composition: ContentTypeComposition, extra: &Value) -> DomainResult<Self>;

    fn alias(&self) -> &Alias {
        self.composition().alias()
    }

    fn name(&self) -> &str {
        self.composition().name()
    }

    fn parent_id(&self) -> NodeId {
        self.composition().parent_id()
    }

    /// Container partition this family's types may live in
    fn container_object_type() -> Option<ObjectType> {
        Self::OBJECT_TYPE.container_type()
    }
}

fn parse_extra<T: for<'de> Deserialize<'de> + Default>(extra: &Value) -> DomainResult<T> {
    if extra.is_null() {
        return Ok(T::default());
    }
    T::deserialize(extra)
        .map_err(|e| DomainError::InvalidValue(format!("Malformed content type attributes: {}", e)))
}

/// A document type: defines the shape of content pages
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentType {
    composition: ContentTypeComposition,
    is_element: bool,
    default_template_id: Option<NodeId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DocumentTypeExtra {
    is_element: bool,
    default_template_id: Option<i32>,
}

impl DocumentType {
    pub fn new(alias: Alias, name: impl Into<String>) -> Self {
        DocumentType {
            composition: ContentTypeComposition::new(alias, name),
            is_element: false,
            default_template_id: None,
        }
    }

    pub fn is_element(&self) -> bool {
        self.is_element
    }

    pub fn set_is_element(&mut self, is_element: bool) {
        self.is_element = is_element;
    }

    pub fn default_template_id(&self) -> Option<NodeId> {
        self.default_template_id
    }

    pub fn set_default_template_id(&mut self, template_id: Option<NodeId>) {
        self.default_template_id = template_id;
    }
}

impl Entity for DocumentType {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        self.composition.id()
    }
}

impl ComposableType for DocumentType {
    const OBJECT_TYPE: ObjectType = ObjectType::DOCUMENT_TYPE;

    fn composition(&self) -> &ContentTypeComposition {
        &self.composition
    }

    fn composition_mut(&mut self) -> &mut ContentTypeComposition {
        &mut self.composition
    }

    fn extra(&self) -> Value {
        json!({
            "isElement": self.is_element,
            "defaultTemplateId": self.default_template_id.map(|id| id.value()),
        })
    }

    fn from_parts(composition: ContentTypeComposition, extra: &Value) -> DomainResult<Self> {
        let extra: DocumentTypeExtra = parse_extra(extra)?;
        Ok(DocumentType {
            composition,
            is_element: extra.is_element,
            default_template_id: extra.default_template_id.map(NodeId::new),
        })
    }
}

/// A media type: defines the shape of media items
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    composition: ContentTypeComposition,
}

impl MediaType {
    pub fn new(alias: Alias, name: impl Into<String>) -> Self {
        MediaType {
            composition: ContentTypeComposition::new(alias, name),
        }
    }
}

impl Entity for MediaType {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        self.composition.id()
    }
}

impl ComposableType for MediaType {
    const OBJECT_TYPE: ObjectType = ObjectType::MEDIA_TYPE;

    fn composition(&self) -> &ContentTypeComposition {
        &self.composition
    }

    fn composition_mut(&mut self) -> &mut ContentTypeComposition {
        &mut self.composition
    }

    fn extra(&self) -> Value {
        Value::Null
    }

    fn from_parts(composition: ContentTypeComposition, _extra: &Value) -> DomainResult<Self> {
        Ok(MediaType { composition })
    }
}

/// A member type: defines the shape of member profiles
#[derive(Debug, Clone, PartialEq)]
pub struct MemberType {
    composition: ContentTypeComposition,
    member_can_edit: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MemberTypeExtra {
    member_can_edit: BTreeSet<String>,
}

impl MemberType {
    pub fn new(alias: Alias, name: impl Into<String>) -> Self {
        MemberType {
            composition: ContentTypeComposition::new(alias, name),
            member_can_edit: BTreeSet::new(),
        }
    }

    /// Property aliases a member may edit on their own profile
    pub fn member_can_edit(&self) -> &BTreeSet<String> {
        &self.member_can_edit
    }

    pub fn set_member_can_edit(&mut self, property_alias: impl Into<String>, can_edit: bool) {
        let property_alias = property_alias.into();
        if can_edit {
            self.member_can_edit.insert(property_alias);
        } else {
            self.member_can_edit.remove(&property_alias);
        }
    }
}

impl Entity for MemberType {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        self.composition.id()
    }
}

impl ComposableType for MemberType {
    const OBJECT_TYPE: ObjectType = ObjectType::MEMBER_TYPE;

    fn composition(&self) -> &ContentTypeComposition {
        &self.composition
    }

    fn composition_mut(&mut self) -> &mut ContentTypeComposition {
        &mut self.composition
    }

    fn extra(&self) -> Value {
        json!({ "memberCanEdit": self.member_can_edit })
    }

    fn from_parts(composition: ContentTypeComposition, extra: &Value) -> DomainResult<Self> {
        let extra: MemberTypeExtra = parse_extra(extra)?;
        Ok(MemberType {
            composition,
            member_can_edit: extra.member_can_edit,
        })
    }
}
