use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::event::EventRow;
use crate::error::{Result, StorageError};
use crate::models::{Club, Event, Series};

#[derive(FromRow)]
struct SeriesRow {
    series_id: Uuid,
    name: String,
    year: i32,
    active: bool,
}

impl From<SeriesRow> for Series {
    fn from(row: SeriesRow) -> Self {
        Series {
            series_id: row.series_id,
            name: row.name,
            year: row.year,
            active: row.active,
        }
    }
}

#[derive(FromRow)]
struct ClubRow {
    club_id: Uuid,
    name: String,
}

/// Repository for series, their event membership, and clubs.
pub struct SeriesRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SeriesRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, only_active: bool) -> Result<Vec<Series>> {
        let rows: Vec<SeriesRow> = if only_active {
            sqlx::query_as(
                r#"
                SELECT series_id, name, year, active
                FROM series
                WHERE active
                ORDER BY year, series_id
                "#,
            )
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as(
                r#"
                SELECT series_id, name, year, active
                FROM series
                ORDER BY year, series_id
                "#,
            )
            .fetch_all(self.pool)
            .await?
        };

        Ok(rows.into_iter().map(Series::from).collect())
    }

    pub async fn find_by_id(&self, series_id: Uuid) -> Result<Series> {
        let row: Option<SeriesRow> = sqlx::query_as(
            r#"
            SELECT series_id, name, year, active
            FROM series
            WHERE series_id = $1
            "#,
        )
        .bind(series_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Series::from).ok_or(StorageError::NotFound)
    }

    /// Events owned directly plus events joined through `series_events`.
    pub async fn events_for_series(&self, series_id: Uuid) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT e.event_id, e.name, e.date, e.format, e.scale_id, e.series_id
            FROM events e
            WHERE e.series_id = $1
            UNION
            SELECT e.event_id, e.name, e.date, e.format, e.scale_id, e.series_id
            FROM events e
            INNER JOIN series_events se ON se.event_id = e.event_id
            WHERE se.series_id = $1
            ORDER BY date, event_id
            "#,
        )
        .bind(series_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    pub async fn list_clubs(&self) -> Result<Vec<Club>> {
        let rows: Vec<ClubRow> = sqlx::query_as(
            r#"
            SELECT club_id, name
            FROM clubs
            ORDER BY club_id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Club {
                club_id: row.club_id,
                name: row.name,
            })
            .collect())
    }
}
