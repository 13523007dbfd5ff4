//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the tree and value invariants.
/// These are independent of type resolution and construction concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid path text: {0:?}")]
    InvalidPath(String),

    #[error("builtin '{builtin}' is already bound to another node")]
    AlreadyBound { builtin: String },

    #[error("node '{parent}' already has a child named '{name}'")]
    DuplicateChild { parent: String, name: String },

    #[error("cannot move '{0}' below one of its own descendants")]
    CyclicParent(String),

    #[error("invalid node name: {0:?}")]
    InvalidName(String),

    #[error("node not found in tree: {0}")]
    NodeNotFound(String),

    #[error("member '{member}' not found on '{type_name}'")]
    MemberNotFound { member: String, type_name: String },

    #[error("member '{member}' of '{type_name}' is read-only")]
    ReadOnlyMember { member: String, type_name: String },

    #[error("cannot convert {value:?} to {target}")]
    Conversion { value: String, target: String },
}

impl DomainError {
    /// Create a missing-member error for the given component type.
    pub fn member_not_found(member: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::MemberNotFound {
            member: member.into(),
            type_name: type_name.into(),
        }
    }

    pub(crate) fn conversion(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Conversion {
            value: value.into(),
            target: target.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
