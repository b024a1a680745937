//! Domain error shared by every IKD crate.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A score cell has no uploaded evidence, so it cannot be edited.
    #[error("No evidence uploaded for lecturer {lecturer_id} on activity {activity_id}")]
    NoEvidence {
        lecturer_id: DbId,
        activity_id: DbId,
    },

    /// Form or configuration input was rejected before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
