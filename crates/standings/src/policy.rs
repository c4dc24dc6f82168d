//! Injectable scoring policies.
//!
//! The federation has not confirmed the real weighting coefficients, the
//! competition tie-break rule, or the downhill run-combination rule, so all
//! three live behind versioned traits and every coefficient is supplied by
//! the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Turns one event score into ranking points for the cumulative rankings.
pub trait RankingWeight: Send + Sync {
    fn version(&self) -> &str;

    fn ranking_points(
        &self,
        event_points: Decimal,
        field_size: u32,
        event_date: NaiveDate,
        as_of: NaiveDate,
    ) -> Decimal;
}

/// Identity weighting: ranking points equal summed event points.
/// The placeholder until real coefficients are confirmed.
pub struct FlatWeight;

impl RankingWeight for FlatWeight {
    fn version(&self) -> &str {
        "flat-v0"
    }

    fn ranking_points(
        &self,
        event_points: Decimal,
        _field_size: u32,
        _event_date: NaiveDate,
        _as_of: NaiveDate,
    ) -> Decimal {
        event_points
    }
}

/// Field-size and recency weighting with caller-supplied coefficients:
/// points are scaled by `1 + field_coefficient * field_size`, then by
/// `stale_multiplier` once the event is older than the recency window.
pub struct FieldRecencyWeight {
    version: String,
    field_coefficient: Decimal,
    recency_window_days: i64,
    stale_multiplier: Decimal,
}

impl FieldRecencyWeight {
    pub fn new(
        version: impl Into<String>,
        field_coefficient: Decimal,
        recency_window_days: i64,
        stale_multiplier: Decimal,
    ) -> Self {
        Self {
            version: version.into(),
            field_coefficient,
            recency_window_days,
            stale_multiplier,
        }
    }
}

impl RankingWeight for FieldRecencyWeight {
    fn version(&self) -> &str {
        &self.version
    }

    fn ranking_points(
        &self,
        event_points: Decimal,
        field_size: u32,
        event_date: NaiveDate,
        as_of: NaiveDate,
    ) -> Decimal {
        let field_factor = Decimal::ONE + self.field_coefficient * Decimal::from(field_size);
        let mut points = event_points * field_factor;

        let age_days = (as_of - event_date).num_days();
        if age_days > self.recency_window_days {
            points *= self.stale_multiplier;
        }

        points.round_dp(2)
    }
}

/// Selects which member results count toward a club's points at one event.
pub trait ClubSelection: Send + Sync {
    fn version(&self) -> &str;

    fn club_event_points(&self, member_points: &[Decimal]) -> Decimal;
}

/// Sums the best N member results per club; `None` counts them all.
pub struct TopNSelection {
    counted: Option<usize>,
}

impl TopNSelection {
    pub fn all() -> Self {
        Self { counted: None }
    }

    pub fn top(counted: usize) -> Self {
        Self {
            counted: Some(counted),
        }
    }
}

impl ClubSelection for TopNSelection {
    fn version(&self) -> &str {
        "top-n-v1"
    }

    fn club_event_points(&self, member_points: &[Decimal]) -> Decimal {
        let mut points = member_points.to_vec();
        points.sort_by(|a, b| b.cmp(a));
        let counted = self.counted.unwrap_or(points.len());
        points.into_iter().take(counted).sum()
    }
}

/// Combines the final-run and qualification-run placements of a downhill
/// result into the one position the scale is applied to.
pub trait RunCombiner: Send + Sync {
    fn version(&self) -> &str;

    fn scored_position(
        &self,
        final_position: Option<i32>,
        seeding_position: Option<i32>,
    ) -> Option<i32>;
}

/// Final-run placement when there is one, otherwise the seeding run.
pub struct FinalsPriorityCombiner;

impl RunCombiner for FinalsPriorityCombiner {
    fn version(&self) -> &str {
        "finals-priority-v1"
    }

    fn scored_position(
        &self,
        final_position: Option<i32>,
        seeding_position: Option<i32>,
    ) -> Option<i32> {
        final_position.or(seeding_position)
    }
}

/// The policy set one recalculation runs with.
#[derive(Clone)]
pub struct ScoringPolicies {
    pub weight: Arc<dyn RankingWeight>,
    pub selection: Arc<dyn ClubSelection>,
    pub combiner: Arc<dyn RunCombiner>,
}

impl Default for ScoringPolicies {
    fn default() -> Self {
        Self {
            weight: Arc::new(FlatWeight),
            selection: Arc::new(TopNSelection::all()),
            combiner: Arc::new(FinalsPriorityCombiner),
        }
    }
}
