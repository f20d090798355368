use thiserror::Error;

/// Fatal conditions of multi-source integration. These are the only
/// errors the core raises itself: per-cell problems degrade to markers
/// and validation findings instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    /// The shared join key disagrees between two sources; integration is
    /// all-or-nothing, so no partial result is produced.
    #[error("conflicting project ids across sources: '{first}' vs '{second}'")]
    ProjectIdMismatch { first: String, second: String },

    /// No source carries a recognizable project-id column.
    #[error("no project id found in any source")]
    MissingProjectId,
}
