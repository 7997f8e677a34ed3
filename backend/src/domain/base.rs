/// Base DDD abstractions for the domain layer
use std::fmt::Debug;
use thiserror::Error;

use super::value_objects::{NodeId, ObjectType};

/// Trait for value objects - immutable objects defined by their attributes
/// Value objects are equal if all their attributes are equal
pub trait ValueObject: Clone + PartialEq + Eq + Debug {}

/// Trait for entities - objects with identity that can change over time
/// Entities are equal if their IDs are equal, regardless of other attributes
pub trait Entity: Debug {
    type Id: ValueObject;

    fn id(&self) -> &Self::Id;
}

/// Trait for domain events - things that have happened in the domain
pub trait DomainEvent: Debug + Clone {
    /// The name/type of the event
    fn event_type(&self) -> &'static str;

    fn aggregate_id(&self) -> String;
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value provided
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another content type already owns the alias
    #[error("Alias collision: an item with the alias {0} already exists")]
    AliasCollision(String),

    #[error("Cyclic container move: container {container} cannot move under its own descendant {target}")]
    CyclicContainerMove { container: NodeId, target: NodeId },

    #[error("Cyclic move: content type {moving} cannot move into container {target} below it")]
    CyclicMove { moving: NodeId, target: NodeId },

    #[error("Cyclic composition: content type {type_id} cannot compose {composed}")]
    CyclicComposition { type_id: NodeId, composed: NodeId },

    /// Container partition does not match the hierarchy it is saved into
    #[error("Invalid container type: expected {expected}, got {actual}")]
    InvalidContainerType {
        expected: ObjectType,
        actual: ObjectType,
    },

    /// Destination container belongs to another type family
    #[error("Invalid move target: container {container} of type {actual} cannot hold this type")]
    InvalidMoveTarget { container: NodeId, actual: ObjectType },

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Failure reported by the storage collaborator
    #[error("Storage failure: {0}")]
    Storage(String),
}
