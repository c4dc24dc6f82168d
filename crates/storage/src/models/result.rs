use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Finished,
    Dnf,
    Dns,
    Dsq,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Finished => "finished",
            ResultStatus::Dnf => "dnf",
            ResultStatus::Dns => "dns",
            ResultStatus::Dsq => "dsq",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ResultStatus::Finished)
    }
}

impl std::str::FromStr for ResultStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(ResultStatus::Finished),
            "dnf" => Ok(ResultStatus::Dnf),
            "dns" => Ok(ResultStatus::Dns),
            "dsq" => Ok(ResultStatus::Dsq),
            other => Err(format!("unknown result status: {other}")),
        }
    }
}

/// One rider's outcome in one event.
///
/// `points` is derived state: always a pure function of the resolved scale,
/// the placement and the status. It is rewritten on every recompute and
/// never hand-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub result_id: Uuid,
    pub event_id: Uuid,
    pub rider_id: Uuid,
    pub class_id: Option<Uuid>,
    /// Final-run placement. None for non-finishers.
    pub position: Option<i32>,
    /// Qualification-run placement, used by the downhill formats.
    pub seeding_position: Option<i32>,
    pub status: ResultStatus,
    /// Finish time in seconds.
    pub finish_time: Option<Decimal>,
    pub points: Decimal,
}
