//! In-memory implementation of the store traits.
//!
//! Behaviorally equivalent to the Postgres repositories for everything the
//! pipeline does; used as the test double and as a scratchpad store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::RiderEventScore;
use crate::error::{Result, StorageError};
use crate::models::{
    Club, ClubEventPoints, ClubRanking, ClubRiderPoints, ClubStanding, Event, EventFormat,
    PointScale, RaceResult, Rider, RiderRanking, Series,
};
use crate::store::{ClubPointsStore, EventStore, RiderStore, SeriesStore};

#[derive(Debug, Default, Clone, PartialEq)]
struct Inner {
    events: Vec<Event>,
    scales: Vec<PointScale>,
    results: Vec<RaceResult>,
    series: Vec<Series>,
    series_events: Vec<(Uuid, Uuid)>,
    clubs: Vec<Club>,
    riders: Vec<Rider>,
    rider_rankings: Vec<RiderRanking>,
    club_rankings: Vec<ClubRanking>,
    club_event_points: Vec<ClubEventPoints>,
    club_rider_points: Vec<ClubRiderPoints>,
    standings: Vec<ClubStanding>,
}

/// Opaque copy of the full store contents. Two snapshots compare equal
/// exactly when every table's content is identical, which is what the
/// dry-run purity and idempotence checks need.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Inner);

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    pub fn insert_event(&self, event: Event) {
        self.lock().events.push(event);
    }

    pub fn insert_scale(&self, scale: PointScale) {
        self.lock().scales.push(scale);
    }

    pub fn insert_result(&self, result: RaceResult) {
        self.lock().results.push(result);
    }

    pub fn insert_series(&self, series: Series) {
        self.lock().series.push(series);
    }

    /// Joins an event to a series through the membership relation.
    pub fn link_series_event(&self, series_id: Uuid, event_id: Uuid) {
        self.lock().series_events.push((series_id, event_id));
    }

    pub fn insert_club(&self, club: Club) {
        self.lock().clubs.push(club);
    }

    pub fn insert_rider(&self, rider: Rider) {
        self.lock().riders.push(rider);
    }

    pub fn result(&self, result_id: Uuid) -> Option<RaceResult> {
        self.lock()
            .results
            .iter()
            .find(|r| r.result_id == result_id)
            .cloned()
    }

    pub fn rider_rankings(&self, rider_id: Uuid) -> Vec<RiderRanking> {
        let mut rankings: Vec<_> = self
            .lock()
            .rider_rankings
            .iter()
            .filter(|r| r.rider_id == rider_id)
            .cloned()
            .collect();
        rankings.sort_by_key(|r| r.discipline);
        rankings
    }

    pub fn club_rankings(&self, club_id: Uuid) -> Vec<ClubRanking> {
        let mut rankings: Vec<_> = self
            .lock()
            .club_rankings
            .iter()
            .filter(|r| r.club_id == club_id)
            .cloned()
            .collect();
        rankings.sort_by_key(|r| r.discipline);
        rankings
    }

    pub fn rider_club_points(&self, series_id: Uuid) -> Vec<ClubRiderPoints> {
        self.lock()
            .club_rider_points
            .iter()
            .filter(|r| r.series_id == series_id)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.lock().clone())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events = self.lock().events.clone();
        events.sort_by(|a, b| (a.date, a.event_id).cmp(&(b.date, b.event_id)));
        Ok(events)
    }

    async fn results_for_event(&self, event_id: Uuid) -> Result<Vec<RaceResult>> {
        let mut results: Vec<_> = self
            .lock()
            .results
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        results.sort_by_key(|r| r.result_id);
        Ok(results)
    }

    async fn set_result_points(&self, result_id: Uuid, points: Decimal) -> Result<()> {
        let mut inner = self.lock();
        let result = inner
            .results
            .iter_mut()
            .find(|r| r.result_id == result_id)
            .ok_or(StorageError::NotFound)?;
        result.points = points;
        Ok(())
    }

    async fn find_scale(&self, scale_id: Uuid) -> Result<Option<PointScale>> {
        Ok(self
            .lock()
            .scales
            .iter()
            .find(|s| s.scale_id == scale_id)
            .cloned())
    }

    async fn default_scale_for_format(&self, format: EventFormat) -> Result<Option<PointScale>> {
        Ok(self
            .lock()
            .scales
            .iter()
            .find(|s| s.default_for_format == Some(format))
            .cloned())
    }
}

#[async_trait]
impl RiderStore for MemoryStore {
    async fn list_riders(&self) -> Result<Vec<Rider>> {
        let mut riders = self.lock().riders.clone();
        riders.sort_by_key(|r| r.rider_id);
        Ok(riders)
    }

    async fn event_scores_for_rider(&self, rider_id: Uuid) -> Result<Vec<RiderEventScore>> {
        let inner = self.lock();
        let mut scores = Vec::new();
        for result in inner.results.iter().filter(|r| r.rider_id == rider_id) {
            let Some(event) = inner.events.iter().find(|e| e.event_id == result.event_id) else {
                return Err(StorageError::Decode(format!(
                    "result {} references unknown event {}",
                    result.result_id, result.event_id
                )));
            };
            let field_size = inner
                .results
                .iter()
                .filter(|r| r.event_id == event.event_id)
                .count() as u32;
            scores.push(RiderEventScore {
                event_id: event.event_id,
                event_date: event.date,
                format: event.format,
                points: result.points,
                field_size,
            });
        }
        scores.sort_by(|a, b| (a.event_date, a.event_id).cmp(&(b.event_date, b.event_id)));
        Ok(scores)
    }

    async fn replace_rider_rankings(
        &self,
        rider_id: Uuid,
        rankings: Vec<RiderRanking>,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner.rider_rankings.retain(|r| r.rider_id != rider_id);
        inner.rider_rankings.extend(rankings);
        Ok(())
    }

    async fn replace_club_rankings(&self, rankings: Vec<ClubRanking>) -> Result<()> {
        self.lock().club_rankings = rankings;
        Ok(())
    }
}

#[async_trait]
impl SeriesStore for MemoryStore {
    async fn list_series(&self, only_active: bool) -> Result<Vec<Series>> {
        let mut series: Vec<_> = self
            .lock()
            .series
            .iter()
            .filter(|s| !only_active || s.active)
            .cloned()
            .collect();
        series.sort_by_key(|s| s.series_id);
        Ok(series)
    }

    async fn find_series(&self, series_id: Uuid) -> Result<Series> {
        self.lock()
            .series
            .iter()
            .find(|s| s.series_id == series_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn events_for_series(&self, series_id: Uuid) -> Result<Vec<Event>> {
        let inner = self.lock();
        let mut events: Vec<_> = inner
            .events
            .iter()
            .filter(|e| {
                e.series_id == Some(series_id)
                    || inner
                        .series_events
                        .iter()
                        .any(|(s, ev)| *s == series_id && *ev == e.event_id)
            })
            .cloned()
            .collect();
        events.sort_by(|a, b| (a.date, a.event_id).cmp(&(b.date, b.event_id)));
        Ok(events)
    }

    async fn list_clubs(&self) -> Result<Vec<Club>> {
        let mut clubs = self.lock().clubs.clone();
        clubs.sort_by_key(|c| c.club_id);
        Ok(clubs)
    }
}

#[async_trait]
impl ClubPointsStore for MemoryStore {
    async fn replace_event_club_points(
        &self,
        event_id: Uuid,
        series_id: Uuid,
        rows: Vec<ClubEventPoints>,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner
            .club_event_points
            .retain(|r| !(r.event_id == event_id && r.series_id == series_id));
        inner.club_event_points.extend(rows);
        Ok(())
    }

    async fn replace_rider_club_points(
        &self,
        series_id: Uuid,
        rows: Vec<ClubRiderPoints>,
    ) -> Result<()> {
        let mut inner = self.lock();
        inner.club_rider_points.retain(|r| r.series_id != series_id);
        inner.club_rider_points.extend(rows);
        Ok(())
    }

    async fn event_points_for_series(&self, series_id: Uuid) -> Result<Vec<ClubEventPoints>> {
        let mut rows: Vec<_> = self
            .lock()
            .club_event_points
            .iter()
            .filter(|r| r.series_id == series_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.event_id, r.club_id));
        Ok(rows)
    }

    async fn replace_standings(&self, series_id: Uuid, rows: Vec<ClubStanding>) -> Result<u64> {
        let mut inner = self.lock();
        inner.standings.retain(|r| r.series_id != series_id);
        let written = rows.len() as u64;
        inner.standings.extend(rows);
        Ok(written)
    }

    async fn standings_for_series(&self, series_id: Uuid) -> Result<Vec<ClubStanding>> {
        let mut rows: Vec<_> = self
            .lock()
            .standings
            .iter()
            .filter(|r| r.series_id == series_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.rank);
        Ok(rows)
    }
}
