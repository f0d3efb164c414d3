//! Error types raised by the stack engine.
//!
//! Most stack operations cannot fail: an empty split is an absent result and
//! unknown settings make a stack inert. The variants here cover the
//! collaborator failures that a caller can actually act on.

use thiserror::Error;

use crate::types::{CreatureId, EntityKind};

/// Errors surfaced by stack operations.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("failed to capture a snapshot of {kind} {creature}: {reason}")]
    Capture {
        kind: EntityKind,
        creature: CreatureId,
        reason: String,
    },

    #[error("failed to materialize a {kind} from its snapshot: {reason}")]
    Materialize { kind: EntityKind, reason: String },

    #[error("{operation} on a {kind} stack must run on the designated thread")]
    RequiresDesignatedThread {
        operation: &'static str,
        kind: EntityKind,
    },
}

pub type Result<T> = std::result::Result<T, StackError>;
