use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The ranking buckets cumulative points are tracked under. Standard
/// events feed cross-country, the downhill formats feed downhill, and
/// every event feeds the overall bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    CrossCountry,
    Downhill,
    Overall,
}

impl Discipline {
    pub const ALL: [Discipline; 3] = [
        Discipline::CrossCountry,
        Discipline::Downhill,
        Discipline::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::CrossCountry => "cross_country",
            Discipline::Downhill => "downhill",
            Discipline::Overall => "overall",
        }
    }
}

impl std::str::FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cross_country" => Ok(Discipline::CrossCountry),
            "downhill" => Ok(Discipline::Downhill),
            "overall" => Ok(Discipline::Overall),
            other => Err(format!("unknown discipline: {other}")),
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rider's cumulative ranking points in one discipline. Fully derived,
/// replaced on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderRanking {
    pub rider_id: Uuid,
    pub discipline: Discipline,
    pub points: Decimal,
    pub event_count: i32,
}

/// Club-level ranking rollup, updated in the same pass as rider rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubRanking {
    pub club_id: Uuid,
    pub discipline: Discipline,
    pub points: Decimal,
    pub rider_count: i32,
}
