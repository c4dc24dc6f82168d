use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::EventFormat;

/// Read model for the ranking aggregation: one scored event in a rider's
/// history, with the context the weighting policy needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiderEventScore {
    pub event_id: Uuid,
    pub event_date: NaiveDate,
    pub format: EventFormat,
    pub points: Decimal,
    /// Number of results recorded for the event, regardless of status.
    pub field_size: u32,
}
