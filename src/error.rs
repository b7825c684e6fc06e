use thiserror::Error;

/// Typed failure surface of the attendance store. Every operation is an
/// idempotent upsert or a keyed read, so callers may retry any variant
/// with the same arguments.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("attendance query failed")]
    Fetch(#[source] sqlx::Error),

    #[error("attendance write failed")]
    Write(#[source] sqlx::Error),

    #[error("attendance record not found")]
    NotFound,
}
