use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, year-scoped grouping of events. Only active series take part
/// in recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub series_id: Uuid,
    pub name: String,
    pub year: i32,
    pub active: bool,
}
