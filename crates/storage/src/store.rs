//! Repository traits the standings pipeline runs against.
//!
//! Components hold `dyn` stores instead of a shared pool handle, so the
//! Postgres repositories and the in-memory fake are interchangeable.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::RiderEventScore;
use crate::error::Result;
use crate::models::{
    Club, ClubEventPoints, ClubRanking, ClubRiderPoints, ClubStanding, Event, EventFormat,
    PointScale, RaceResult, Rider, RiderRanking, Series,
};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn results_for_event(&self, event_id: Uuid) -> Result<Vec<RaceResult>>;

    /// Writes the derived `points` value. Position and status are never
    /// touched by the pipeline.
    async fn set_result_points(&self, result_id: Uuid, points: Decimal) -> Result<()>;

    async fn find_scale(&self, scale_id: Uuid) -> Result<Option<PointScale>>;

    async fn default_scale_for_format(&self, format: EventFormat) -> Result<Option<PointScale>>;
}

#[async_trait]
pub trait RiderStore: Send + Sync {
    async fn list_riders(&self) -> Result<Vec<Rider>>;

    /// A rider's complete scored history, ordered by event date.
    async fn event_scores_for_rider(&self, rider_id: Uuid) -> Result<Vec<RiderEventScore>>;

    /// Replaces all ranking rows for the rider with the given set.
    async fn replace_rider_rankings(
        &self,
        rider_id: Uuid,
        rankings: Vec<RiderRanking>,
    ) -> Result<()>;

    /// Replaces the full club ranking rollup table.
    async fn replace_club_rankings(&self, rankings: Vec<ClubRanking>) -> Result<()>;
}

#[async_trait]
pub trait SeriesStore: Send + Sync {
    async fn list_series(&self, only_active: bool) -> Result<Vec<Series>>;

    async fn find_series(&self, series_id: Uuid) -> Result<Series>;

    /// Events owned directly by the series plus events joined through the
    /// membership table, ordered by date.
    async fn events_for_series(&self, series_id: Uuid) -> Result<Vec<Event>>;

    async fn list_clubs(&self) -> Result<Vec<Club>>;
}

#[async_trait]
pub trait ClubPointsStore: Send + Sync {
    /// Replaces the club point rows for one (event, series) pair.
    async fn replace_event_club_points(
        &self,
        event_id: Uuid,
        series_id: Uuid,
        rows: Vec<ClubEventPoints>,
    ) -> Result<()>;

    /// Replaces the per-rider contribution rows for one series.
    async fn replace_rider_club_points(
        &self,
        series_id: Uuid,
        rows: Vec<ClubRiderPoints>,
    ) -> Result<()>;

    async fn event_points_for_series(&self, series_id: Uuid) -> Result<Vec<ClubEventPoints>>;

    /// Replaces the standings cache for the series, returning the number
    /// of rows written.
    async fn replace_standings(&self, series_id: Uuid, rows: Vec<ClubStanding>) -> Result<u64>;

    async fn standings_for_series(&self, series_id: Uuid) -> Result<Vec<ClubStanding>>;
}

/// Everything the recalculation orchestrator needs, as one object-safe
/// bound. Blanket-implemented for any type carrying the four stores.
pub trait StandingsStore: EventStore + RiderStore + SeriesStore + ClubPointsStore {}

impl<T: EventStore + RiderStore + SeriesStore + ClubPointsStore> StandingsStore for T {}
