use thiserror::Error;

/// Failures at the persistence and mutation boundaries.
///
/// Geometry and binding operations never fail; they degrade to no-ops.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connector '{id}' needs at least two path points")]
    DegeneratePath { id: String },

    #[error("shape '{id}' already exists")]
    DuplicateId { id: String },
}
