use crate::domain::{DomainError, DomainResult, NodeId, NodePath, ObjectType};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// Storage shape shared by every node: content types and containers alike
///
/// Content types and containers live in one id space, so a path can run
/// through both.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id: NodeId,
    pub key: Uuid,
    pub object_type: ObjectType,
    pub parent_id: NodeId,
    pub name: String,
    pub alias: Option<String>,
    pub is_container: bool,
    pub composition_ids: Vec<NodeId>,
    pub extra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Predicates the core builds for the storage collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum NodeQuery {
    ById(NodeId),
    ByKey(Uuid),
    /// Case-insensitive exact alias match, across every object type
    ByAlias(String),
    OfObjectType(ObjectType),
    ChildrenOf(NodeId),
    /// Nodes whose direct compositions include the id
    ComposedOf(NodeId),
    /// Case-insensitive alias prefix match, across every object type
    AliasStartsWith(String),
    /// Content types carrying the list-view flag
    ListViewTypes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeCommand {
    /// Replace a node's columns and its composition set
    Update(NodeRow),
    SetParent { id: NodeId, parent_id: NodeId },
    /// Remove a node; composition relations referencing it go with it
    Delete(NodeId),
}

/// Storage collaborator consumed by the container and content type repositories
///
/// Rows come back ordered by id. Implementations own their transaction
/// discipline; every call is one unit of work.
pub trait NodeStore: Send + Sync {
    fn find(&self, query: &NodeQuery) -> DomainResult<Vec<NodeRow>>;

    fn count(&self, query: &NodeQuery) -> DomainResult<usize>;

    /// Insert a new node and return its assigned id
    fn insert(&self, row: &NodeRow) -> DomainResult<NodeId>;

    /// Apply a command and return the number of affected nodes
    fn execute(&self, command: &NodeCommand) -> DomainResult<usize>;

    fn find_one(&self, query: &NodeQuery) -> DomainResult<Option<NodeRow>> {
        Ok(self.find(query)?.into_iter().next())
    }

    /// Derive the root-to-node path by following parent pointers
    fn path_of(&self, id: NodeId) -> DomainResult<NodePath> {
        if id.is_root() {
            return Ok(NodePath::root());
        }

        let mut chain = vec![id];
        let mut current = id;
        loop {
            let row = self
                .find_one(&NodeQuery::ById(current))?
                .ok_or_else(|| DomainError::NotFound(format!("Node {} not found", current)))?;

            if row.parent_id.is_root() {
                break;
            }
            if chain.contains(&row.parent_id) {
                return Err(DomainError::InvalidOperation(format!(
                    "Parent chain of node {} loops through {}",
                    id, row.parent_id
                )));
            }
            chain.push(row.parent_id);
            current = row.parent_id;
        }

        let mut path = NodePath::root();
        for ancestor in chain.into_iter().rev() {
            path = path.child(ancestor);
        }
        Ok(path)
    }

    /// Every node below `id`, shallowest first
    fn descendants_of(&self, id: NodeId) -> DomainResult<Vec<NodeRow>> {
        let mut descendants = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(parent) = queue.pop_front() {
            for child in self.find(&NodeQuery::ChildrenOf(parent))? {
                if visited.insert(child.id) {
                    queue.push_back(child.id);
                    descendants.push(child);
                }
            }
        }

        Ok(descendants)
    }
}
