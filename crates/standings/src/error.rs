use storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ScoringError>;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Configuration error: the event has neither an override scale nor a
    /// default scale for its format.
    #[error("no point scale resolvable for event {event_id}")]
    ScaleNotFound { event_id: Uuid },

    #[error("result {result_id} has no class")]
    MissingClass { result_id: Uuid },

    #[error("result {result_id} is finished but has no placement in any run")]
    UnscorablePlacement { result_id: Uuid },

    #[error("result {result_id} has a non-positive position: {position}")]
    InvalidPosition { result_id: Uuid, position: i32 },

    #[error("recalculation already complete")]
    AlreadyComplete,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ScoringError {
    /// Infrastructure failures abort the running stage; everything else is
    /// recorded against the offending item and iteration continues.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            ScoringError::Storage(e) => e.is_connectivity(),
            _ => false,
        }
    }
}
