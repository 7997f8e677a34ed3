/// Domain events
use super::base::DomainEvent;
use super::value_objects::{NodeId, NodePath, ObjectType};

/// Event recorded for every node whose effective path changed during a move
///
/// `original_path` is the path before the move. For the moved node itself
/// `new_parent_id` is the destination; descendants keep their own parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEventInfo {
    pub entity_id: NodeId,
    pub object_type: ObjectType,
    pub original_path: NodePath,
    pub new_parent_id: NodeId,
}

impl DomainEvent for MoveEventInfo {
    fn event_type(&self) -> &'static str {
        "Moved"
    }

    fn aggregate_id(&self) -> String {
        self.entity_id.to_string()
    }
}
