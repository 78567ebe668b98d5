//! Error types for the repository layer.

use felt_token::{DieKey, RoomKey};

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The room key does not resolve. Callers that hold a slug rather
    /// than a key should go through `get_or_create`, which self-heals
    /// instead of ever producing this.
    #[error("room {0} not found")]
    RoomNotFound(RoomKey),

    /// The die key does not resolve in its parent room. Fatal to the
    /// single operation; the die may have been deleted by another
    /// player between poll and click.
    #[error("die {0} not found")]
    DieNotFound(DieKey),

    /// The operation kept losing the commit race and retries are
    /// exhausted. Ordinary contention never surfaces this; something
    /// is hammering the room.
    #[error("room {room}: transaction conflict after {attempts} attempts")]
    Conflict { room: RoomKey, attempts: u32 },
}
