use thiserror::Error;

use crate::records::EntityKind;

/// Conditions that abort a whole batch. Everything else is recovered where it happens.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{kind} listing document is empty")]
    EmptyDocument { kind: EntityKind },

    #[error("base batch is not a list of records: {0}")]
    InvalidBatch(#[from] serde_json::Error),
}
