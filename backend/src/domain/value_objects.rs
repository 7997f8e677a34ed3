/// Value objects for the domain layer
use super::base::{DomainError, DomainResult, ValueObject};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Numeric identity of a node (content type or container)
///
/// `0` marks an entity that has not been persisted yet, `-1` is the tree root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(i32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(-1);
    pub const UNSAVED: NodeId = NodeId(0);

    pub fn new(id: i32) -> Self {
        NodeId(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    pub fn is_persisted(&self) -> bool {
        self.0 > 0
    }
}

impl ValueObject for NodeId {}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-assigned identifier of a content type, unique across all type families
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias(String);

impl Alias {
    pub fn new(alias: impl Into<String>) -> DomainResult<Self> {
        let alias = alias.into();
        if alias.trim().is_empty() {
            return Err(DomainError::InvalidValue("Alias cannot be empty".to_string()));
        }
        if alias.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidValue(format!(
                "Alias cannot contain whitespace: {:?}",
                alias
            )));
        }
        Ok(Alias(alias))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for every alias comparison and the storage lookup key
    pub fn normalize(alias: &str) -> String {
        alias.to_lowercase()
    }

    pub fn key(&self) -> String {
        Alias::normalize(&self.0)
    }

    /// Aliases compare case-insensitively everywhere they are looked up
    pub fn matches(&self, other: &str) -> bool {
        self.key() == Alias::normalize(other)
    }
}

impl ValueObject for Alias {}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator of an object-type partition (document types, media type containers, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectType(Uuid);

impl ObjectType {
    pub const DOCUMENT_TYPE: ObjectType =
        ObjectType(Uuid::from_u128(0xA2CB7800_F571_4787_9638_BC48539A0EFB));
    pub const MEDIA_TYPE: ObjectType =
        ObjectType(Uuid::from_u128(0x4EA4382B_2F5A_4C2B_9587_AE9B3CF3602E));
    pub const MEMBER_TYPE: ObjectType =
        ObjectType(Uuid::from_u128(0x9B5416FB_E72F_45A9_A07B_5A9A2709CE43));
    pub const DATA_TYPE: ObjectType =
        ObjectType(Uuid::from_u128(0x30A2A501_1978_4DDB_A57B_F7EFED43BA3C));
    pub const DOCUMENT_BLUEPRINT: ObjectType =
        ObjectType(Uuid::from_u128(0x6EBEF410_03AA_48CF_A792_E1C1CB087ACA));

    pub const DOCUMENT_TYPE_CONTAINER: ObjectType =
        ObjectType(Uuid::from_u128(0x2F7A2769_6B0B_4468_90DD_AF42D64F7F16));
    pub const MEDIA_TYPE_CONTAINER: ObjectType =
        ObjectType(Uuid::from_u128(0x42AEF799_B288_4744_9B10_BE144B73CDC4));
    pub const DATA_TYPE_CONTAINER: ObjectType =
        ObjectType(Uuid::from_u128(0x521231E3_8B37_469C_9F9D_51AFC91FEB7B));
    pub const DOCUMENT_BLUEPRINT_CONTAINER: ObjectType =
        ObjectType(Uuid::from_u128(0xA7EFF71B_FA69_4552_93FC_038F7DEEE453));

    pub fn from_uuid(uuid: Uuid) -> Self {
        ObjectType(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// The container partition that organises items of this object type
    pub fn container_type(&self) -> Option<ObjectType> {
        CONTAINER_PARTITIONS
            .iter()
            .find(|(item, _)| item == self)
            .map(|(_, container)| *container)
    }

    /// The object type held by a container partition
    pub fn contained_type(&self) -> Option<ObjectType> {
        CONTAINER_PARTITIONS
            .iter()
            .find(|(_, container)| container == self)
            .map(|(item, _)| *item)
    }

    pub fn is_container(&self) -> bool {
        self.contained_type().is_some()
    }

    fn name(&self) -> Option<&'static str> {
        OBJECT_TYPE_NAMES
            .iter()
            .find(|(object_type, _)| object_type == self)
            .map(|(_, name)| *name)
    }
}

const CONTAINER_PARTITIONS: [(ObjectType, ObjectType); 4] = [
    (ObjectType::DOCUMENT_TYPE, ObjectType::DOCUMENT_TYPE_CONTAINER),
    (ObjectType::MEDIA_TYPE, ObjectType::MEDIA_TYPE_CONTAINER),
    (ObjectType::DATA_TYPE, ObjectType::DATA_TYPE_CONTAINER),
    (ObjectType::DOCUMENT_BLUEPRINT, ObjectType::DOCUMENT_BLUEPRINT_CONTAINER),
];

const OBJECT_TYPE_NAMES: [(ObjectType, &str); 9] = [
    (ObjectType::DOCUMENT_TYPE, "document-type"),
    (ObjectType::MEDIA_TYPE, "media-type"),
    (ObjectType::MEMBER_TYPE, "member-type"),
    (ObjectType::DATA_TYPE, "data-type"),
    (ObjectType::DOCUMENT_BLUEPRINT, "document-blueprint"),
    (ObjectType::DOCUMENT_TYPE_CONTAINER, "document-type-container"),
    (ObjectType::MEDIA_TYPE_CONTAINER, "media-type-container"),
    (ObjectType::DATA_TYPE_CONTAINER, "data-type-container"),
    (ObjectType::DOCUMENT_BLUEPRINT_CONTAINER, "document-blueprint-container"),
];

impl ValueObject for ObjectType {}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Ordered root-to-node chain of ids, serialised as `-1,12,34`
///
/// Always derived from parent pointers; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath(Vec<NodeId>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(vec![NodeId::ROOT])
    }

    pub fn parse(path: &str) -> DomainResult<Self> {
        let ids = path
            .split(',')
            .map(|segment| {
                segment.trim().parse::<i32>().map(NodeId::new).map_err(|_| {
                    DomainError::InvalidValue(format!("Invalid path segment {:?} in {:?}", segment, path))
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        if ids.first() != Some(&NodeId::ROOT) {
            return Err(DomainError::InvalidValue(format!(
                "Path must start at the root: {:?}",
                path
            )));
        }
        Ok(NodePath(ids))
    }

    /// Path of a direct child of the node this path points at
    pub fn child(&self, id: NodeId) -> Self {
        let mut ids = self.0.clone();
        ids.push(id);
        NodePath(ids)
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    /// Number of hops below the root
    pub fn level(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn leaf(&self) -> NodeId {
        self.0.last().copied().unwrap_or(NodeId::ROOT)
    }
}

impl ValueObject for NodePath {}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_markers() {
        assert!(NodeId::ROOT.is_root());
        assert!(!NodeId::UNSAVED.is_persisted());
        assert!(NodeId::new(12).is_persisted());
        assert_eq!(NodeId::new(12).to_string(), "12");
    }

    #[test]
    fn test_alias_creation() {
        let alias = Alias::new("textPage").unwrap();
        assert_eq!(alias.as_str(), "textPage");
        assert!(alias.matches("TEXTPAGE"));
        assert!(!alias.matches("textPage1"));

        assert!(Alias::new("").is_err());
        assert!(Alias::new("   ").is_err());
        assert!(Alias::new("text page").is_err());
    }

    #[test]
    fn test_alias_folds_non_ascii_case() {
        let alias = Alias::new("Ärger").unwrap();
        assert!(alias.matches("ärger"));
        assert!(alias.matches("ÄRGER"));
        assert_eq!(alias.key(), "ärger");
        assert_eq!(Alias::normalize("ÉcolePage"), "écolepage");
    }

    #[test]
    fn test_container_partitions_pair_up() {
        assert_eq!(
            ObjectType::DOCUMENT_TYPE.container_type(),
            Some(ObjectType::DOCUMENT_TYPE_CONTAINER)
        );
        assert_eq!(
            ObjectType::MEDIA_TYPE_CONTAINER.contained_type(),
            Some(ObjectType::MEDIA_TYPE)
        );
        assert_eq!(ObjectType::MEMBER_TYPE.container_type(), None);
        assert!(ObjectType::DATA_TYPE_CONTAINER.is_container());
        assert!(!ObjectType::DOCUMENT_TYPE.is_container());
        assert_eq!(ObjectType::DOCUMENT_TYPE.to_string(), "document-type");
    }

    #[test]
    fn test_node_path_parse_and_display() {
        let path = NodePath::parse("-1,12,34").unwrap();
        assert_eq!(path.ids(), &[NodeId::ROOT, NodeId::new(12), NodeId::new(34)]);
        assert_eq!(path.level(), 2);
        assert_eq!(path.leaf(), NodeId::new(34));
        assert!(path.contains(NodeId::new(12)));
        assert_eq!(path.to_string(), "-1,12,34");

        assert!(NodePath::parse("12,34").is_err());
        assert!(NodePath::parse("-1,abc").is_err());
    }

    #[test]
    fn test_node_path_child() {
        let root = NodePath::root();
        assert_eq!(root.level(), 0);

        let child = root.child(NodeId::new(5));
        assert_eq!(child.to_string(), "-1,5");
        assert_eq!(child.level(), 1);
    }
}
