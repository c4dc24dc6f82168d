use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    pub rider_id: Uuid,
    pub name: String,
    /// Riders without a club still score for themselves but contribute to
    /// no club standings.
    pub club_id: Option<Uuid>,
}
