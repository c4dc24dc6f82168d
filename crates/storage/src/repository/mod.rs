mod club_points;
mod event;
mod ranking;
mod rider;
mod scale;
mod series;
mod standings;

pub use club_points::ClubPointsRepository;
pub use event::EventRepository;
pub use ranking::RankingRepository;
pub use rider::RiderRepository;
pub use scale::ScaleRepository;
pub use series::SeriesRepository;
pub use standings::StandingsRepository;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::RiderEventScore;
use crate::error::Result;
use crate::models::{
    Club, ClubEventPoints, ClubRanking, ClubRiderPoints, ClubStanding, Event, EventFormat,
    PointScale, RaceResult, Rider, RiderRanking, Series,
};
use crate::store::{ClubPointsStore, EventStore, RiderStore, SeriesStore};

/// Postgres-backed implementation of the store traits, delegating to the
/// per-concern repositories.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn list_events(&self) -> Result<Vec<Event>> {
        EventRepository::new(&self.pool).list().await
    }

    async fn results_for_event(&self, event_id: Uuid) -> Result<Vec<RaceResult>> {
        EventRepository::new(&self.pool)
            .results_for_event(event_id)
            .await
    }

    async fn set_result_points(&self, result_id: Uuid, points: Decimal) -> Result<()> {
        EventRepository::new(&self.pool)
            .set_result_points(result_id, points)
            .await
    }

    async fn find_scale(&self, scale_id: Uuid) -> Result<Option<PointScale>> {
        ScaleRepository::new(&self.pool).find_by_id(scale_id).await
    }

    async fn default_scale_for_format(&self, format: EventFormat) -> Result<Option<PointScale>> {
        ScaleRepository::new(&self.pool)
            .default_for_format(format)
            .await
    }
}

#[async_trait]
impl RiderStore for PgStore {
    async fn list_riders(&self) -> Result<Vec<Rider>> {
        RiderRepository::new(&self.pool).list().await
    }

    async fn event_scores_for_rider(&self, rider_id: Uuid) -> Result<Vec<RiderEventScore>> {
        RiderRepository::new(&self.pool)
            .event_scores(rider_id)
            .await
    }

    async fn replace_rider_rankings(
        &self,
        rider_id: Uuid,
        rankings: Vec<RiderRanking>,
    ) -> Result<()> {
        RankingRepository::new(&self.pool)
            .replace_rider_rankings(rider_id, rankings)
            .await
    }

    async fn replace_club_rankings(&self, rankings: Vec<ClubRanking>) -> Result<()> {
        RankingRepository::new(&self.pool)
            .replace_club_rankings(rankings)
            .await
    }
}

#[async_trait]
impl SeriesStore for PgStore {
    async fn list_series(&self, only_active: bool) -> Result<Vec<Series>> {
        SeriesRepository::new(&self.pool).list(only_active).await
    }

    async fn find_series(&self, series_id: Uuid) -> Result<Series> {
        SeriesRepository::new(&self.pool).find_by_id(series_id).await
    }

    async fn events_for_series(&self, series_id: Uuid) -> Result<Vec<Event>> {
        SeriesRepository::new(&self.pool)
            .events_for_series(series_id)
            .await
    }

    async fn list_clubs(&self) -> Result<Vec<Club>> {
        SeriesRepository::new(&self.pool).list_clubs().await
    }
}

#[async_trait]
impl ClubPointsStore for PgStore {
    async fn replace_event_club_points(
        &self,
        event_id: Uuid,
        series_id: Uuid,
        rows: Vec<ClubEventPoints>,
    ) -> Result<()> {
        ClubPointsRepository::new(&self.pool)
            .replace_event_points(event_id, series_id, rows)
            .await
    }

    async fn replace_rider_club_points(
        &self,
        series_id: Uuid,
        rows: Vec<ClubRiderPoints>,
    ) -> Result<()> {
        ClubPointsRepository::new(&self.pool)
            .replace_rider_points(series_id, rows)
            .await
    }

    async fn event_points_for_series(&self, series_id: Uuid) -> Result<Vec<ClubEventPoints>> {
        ClubPointsRepository::new(&self.pool)
            .event_points_for_series(series_id)
            .await
    }

    async fn replace_standings(&self, series_id: Uuid, rows: Vec<ClubStanding>) -> Result<u64> {
        StandingsRepository::new(&self.pool)
            .replace(series_id, rows)
            .await
    }

    async fn standings_for_series(&self, series_id: Uuid) -> Result<Vec<ClubStanding>> {
        StandingsRepository::new(&self.pool)
            .list_for_series(series_id)
            .await
    }
}
