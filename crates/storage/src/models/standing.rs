use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Materialized leaderboard row, exactly one per (club, series).
/// Fully rebuildable from [`super::ClubEventPoints`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubStanding {
    pub club_id: Uuid,
    pub series_id: Uuid,
    pub total_points: Decimal,
    pub rank: i32,
}
