use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One club's point contribution from one event within a series.
/// Disposable intermediate; the standings cache sums these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubEventPoints {
    pub event_id: Uuid,
    pub series_id: Uuid,
    pub club_id: Uuid,
    pub points: Decimal,
}

/// One rider's counted contribution to their club within a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubRiderPoints {
    pub rider_id: Uuid,
    pub series_id: Uuid,
    pub club_id: Uuid,
    pub points: Decimal,
}
