use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::EventFormat;

/// An ordered mapping from finishing position to awarded points.
///
/// Scales are identified independently of any one event so several events
/// can share one. Positions beyond the defined range, and non-finishers,
/// resolve to the trailing value (zero unless configured otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointScale {
    pub scale_id: Uuid,
    pub name: String,
    /// Points per position, index 0 holding position 1.
    pub values: Vec<Decimal>,
    pub trailing: Decimal,
    /// When set, this scale is the default for events of that format that
    /// carry no explicit override.
    pub default_for_format: Option<EventFormat>,
}

impl PointScale {
    pub fn points_for(&self, position: u32) -> Decimal {
        if position == 0 {
            return self.trailing;
        }
        self.values
            .get(position as usize - 1)
            .copied()
            .unwrap_or(self.trailing)
    }
}
