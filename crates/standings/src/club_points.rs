//! Club point aggregation: each club's contribution from its members'
//! results, per (event, series) pair, with per-rider intermediate rows so
//! the standings cache never re-scans raw results.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use storage::models::{ClubEventPoints, ClubRiderPoints, Event, Series};
use storage::store::StandingsStore;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::policy::ClubSelection;
use crate::report::{ItemError, ItemKind};

/// Outcome of aggregating one (event, series) pair.
#[derive(Debug)]
pub struct EventClubOutcome {
    pub event_points: Vec<ClubEventPoints>,
    /// Raw per-rider contributions, before the series-level summation.
    pub rider_points: Vec<ClubRiderPoints>,
    pub errors: Vec<ItemError>,
}

/// Outcome of aggregating a whole series.
#[derive(Debug)]
pub struct SeriesClubUpdate {
    pub events_processed: u64,
    pub clubs: u64,
    /// Every club event row as computed this run, whether or not it was
    /// persisted. Dry runs rank these instead of re-reading the store.
    pub event_points: Vec<ClubEventPoints>,
    pub errors: Vec<ItemError>,
}

pub struct ClubPointsAggregator {
    store: Arc<dyn StandingsStore>,
    selection: Arc<dyn ClubSelection>,
}

impl ClubPointsAggregator {
    pub fn new(store: Arc<dyn StandingsStore>, selection: Arc<dyn ClubSelection>) -> Self {
        Self { store, selection }
    }

    /// Aggregates one event's results into club points for the series.
    /// Re-running for the same pair fully replaces the prior rows.
    pub async fn recalculate_event(
        &self,
        event: &Event,
        series_id: Uuid,
        dry_run: bool,
    ) -> Result<EventClubOutcome> {
        let results = self.store.results_for_event(event.event_id).await?;
        let membership: BTreeMap<Uuid, Option<Uuid>> = self
            .store
            .list_riders()
            .await?
            .into_iter()
            .map(|r| (r.rider_id, r.club_id))
            .collect();

        let mut errors = Vec::new();
        let mut member_points: BTreeMap<Uuid, Vec<Decimal>> = BTreeMap::new();
        let mut rider_totals: BTreeMap<(Uuid, Uuid), Decimal> = BTreeMap::new();

        for result in &results {
            match membership.get(&result.rider_id) {
                Some(Some(club_id)) => {
                    member_points.entry(*club_id).or_default().push(result.points);
                    *rider_totals
                        .entry((result.rider_id, *club_id))
                        .or_insert(Decimal::ZERO) += result.points;
                }
                // Riders without a club score for themselves only.
                Some(None) => {}
                None => errors.push(ItemError::new(
                    ItemKind::Result,
                    result.result_id,
                    format!("references unknown rider {}", result.rider_id),
                )),
            }
        }

        let event_points: Vec<ClubEventPoints> = member_points
            .iter()
            .map(|(&club_id, points)| ClubEventPoints {
                event_id: event.event_id,
                series_id,
                club_id,
                points: self.selection.club_event_points(points),
            })
            .collect();

        let rider_points: Vec<ClubRiderPoints> = rider_totals
            .iter()
            .map(|(&(rider_id, club_id), &points)| ClubRiderPoints {
                rider_id,
                series_id,
                club_id,
                points,
            })
            .collect();

        if !dry_run {
            self.store
                .replace_event_club_points(event.event_id, series_id, event_points.clone())
                .await?;
        }

        debug!(
            event = %event.event_id,
            series = %series_id,
            clubs = event_points.len(),
            errors = errors.len(),
            dry_run,
            "club event points recomputed"
        );

        Ok(EventClubOutcome {
            event_points,
            rider_points,
            errors,
        })
    }

    /// Aggregates every event of the series, then replaces the per-rider
    /// contribution rows in one go. One failing event is recorded and the
    /// rest of the series still aggregates.
    pub async fn recalculate_series(
        &self,
        series: &Series,
        dry_run: bool,
    ) -> Result<SeriesClubUpdate> {
        let events = self.store.events_for_series(series.series_id).await?;

        let mut errors = Vec::new();
        let mut clubs: BTreeSet<Uuid> = BTreeSet::new();
        let mut event_points: Vec<ClubEventPoints> = Vec::new();
        let mut rider_totals: BTreeMap<(Uuid, Uuid), Decimal> = BTreeMap::new();
        let mut events_processed = 0u64;

        for event in &events {
            events_processed += 1;
            match self
                .recalculate_event(event, series.series_id, dry_run)
                .await
            {
                Ok(outcome) => {
                    clubs.extend(outcome.event_points.iter().map(|row| row.club_id));
                    event_points.extend(outcome.event_points);
                    for row in outcome.rider_points {
                        *rider_totals
                            .entry((row.rider_id, row.club_id))
                            .or_insert(Decimal::ZERO) += row.points;
                    }
                    errors.extend(outcome.errors);
                }
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(e) => {
                    errors.push(ItemError::new(ItemKind::Event, event.event_id, e.to_string()));
                }
            }
        }

        let rider_rows: Vec<ClubRiderPoints> = rider_totals
            .iter()
            .map(|(&(rider_id, club_id), &points)| ClubRiderPoints {
                rider_id,
                series_id: series.series_id,
                club_id,
                points,
            })
            .collect();

        if !dry_run {
            self.store
                .replace_rider_club_points(series.series_id, rider_rows)
                .await?;
        }

        Ok(SeriesClubUpdate {
            events_processed,
            clubs: clubs.len() as u64,
            event_points,
            errors,
        })
    }
}
