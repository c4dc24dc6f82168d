//! Rebuild of the materialized per-series leaderboard from the aggregated
//! club event points. Delete-then-insert, so a rebuild can never leave two
//! rows for the same (club, series) pair.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use storage::models::{ClubEventPoints, ClubStanding, Series};
use storage::store::StandingsStore;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

pub struct StandingsCacheBuilder {
    store: Arc<dyn StandingsStore>,
}

impl StandingsCacheBuilder {
    pub fn new(store: Arc<dyn StandingsStore>) -> Self {
        Self { store }
    }

    /// Replaces the series' standings with one row per contributing club
    /// and returns the number of rows written. Ranks are strict: ties on
    /// total points break by club name, then id, so rebuilds are
    /// reproducible.
    pub async fn rebuild(&self, series: &Series, dry_run: bool) -> Result<u64> {
        let event_points = self
            .store
            .event_points_for_series(series.series_id)
            .await?;
        self.rebuild_with(series, &event_points, dry_run).await
    }

    /// Same rebuild over rows the caller already holds. A dry run ranks
    /// the rows it just computed; the stored intermediates may not have
    /// been written yet.
    pub async fn rebuild_with(
        &self,
        series: &Series,
        event_points: &[ClubEventPoints],
        dry_run: bool,
    ) -> Result<u64> {
        let club_names: BTreeMap<Uuid, String> = self
            .store
            .list_clubs()
            .await?
            .into_iter()
            .map(|c| (c.club_id, c.name))
            .collect();

        let mut totals: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for row in event_points {
            *totals.entry(row.club_id).or_insert(Decimal::ZERO) += row.points;
        }

        let mut ordered: Vec<(Uuid, Decimal)> = totals.into_iter().collect();
        ordered.sort_by(|(a_id, a_total), (b_id, b_total)| {
            b_total
                .cmp(a_total)
                .then_with(|| {
                    let a_name = club_names.get(a_id).map(String::as_str).unwrap_or("");
                    let b_name = club_names.get(b_id).map(String::as_str).unwrap_or("");
                    a_name.cmp(b_name)
                })
                .then(a_id.cmp(b_id))
        });

        let standings: Vec<ClubStanding> = ordered
            .into_iter()
            .enumerate()
            .map(|(index, (club_id, total_points))| ClubStanding {
                club_id,
                series_id: series.series_id,
                total_points,
                rank: index as i32 + 1,
            })
            .collect();

        let written = if dry_run {
            standings.len() as u64
        } else {
            self.store
                .replace_standings(series.series_id, standings)
                .await?
        };

        debug!(series = %series.series_id, rows = written, dry_run, "standings cache rebuilt");
        Ok(written)
    }
}
