use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ranking::Discipline;

/// How an event is scored. Stored as TEXT in the database; the closed set
/// here is the single place format dispatch happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFormat {
    Standard,
    DownhillStandard,
    DownhillSeasonVariant,
}

impl EventFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventFormat::Standard => "standard",
            EventFormat::DownhillStandard => "downhill_standard",
            EventFormat::DownhillSeasonVariant => "downhill_season_variant",
        }
    }

    pub fn is_downhill(&self) -> bool {
        matches!(
            self,
            EventFormat::DownhillStandard | EventFormat::DownhillSeasonVariant
        )
    }

    pub fn is_season_variant(&self) -> bool {
        matches!(self, EventFormat::DownhillSeasonVariant)
    }

    /// The primary ranking bucket this format feeds. Every format also
    /// feeds [`Discipline::Overall`].
    pub fn discipline(&self) -> Discipline {
        match self {
            EventFormat::Standard => Discipline::CrossCountry,
            EventFormat::DownhillStandard | EventFormat::DownhillSeasonVariant => {
                Discipline::Downhill
            }
        }
    }
}

impl std::str::FromStr for EventFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(EventFormat::Standard),
            "downhill_standard" => Ok(EventFormat::DownhillStandard),
            "downhill_season_variant" => Ok(EventFormat::DownhillSeasonVariant),
            other => Err(format!("unknown event format: {other}")),
        }
    }
}

impl std::fmt::Display for EventFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub format: EventFormat,
    /// Explicit point-scale override. When absent the format's default
    /// scale applies.
    pub scale_id: Option<Uuid>,
    /// Directly owning series. Events can also belong to series through
    /// the `series_events` join table.
    pub series_id: Option<Uuid>,
}
