pub use anyhow::{Error, Result};

use thiserror::Error;

/// Errors raised while building, querying or resolving a story structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("section {section_id} is not part of this story structure")]
    NotFound { section_id: String },

    #[error("section {section_id} is its own ancestor; section relations must not form a cycle")]
    Cycle { section_id: String },

    #[error("relation {parent} -> {child} refers to unknown section {missing}")]
    UnknownSection {
        parent: String,
        child: String,
        missing: String,
    },

    #[error("section id {section_id} is used by more than one section")]
    DuplicateSection { section_id: String },

    #[error("unknown structure type: {0}")]
    UnknownStructureType(String),

    #[error("structure type {0} is already registered")]
    DuplicateStructureType(String),
}
