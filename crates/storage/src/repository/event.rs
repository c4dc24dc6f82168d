use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Event, RaceResult};

#[derive(FromRow)]
pub(super) struct EventRow {
    pub event_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub format: String,
    pub scale_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
}

impl EventRow {
    pub(super) fn into_event(self) -> Result<Event> {
        Ok(Event {
            event_id: self.event_id,
            name: self.name,
            date: self.date,
            format: self.format.parse().map_err(StorageError::Decode)?,
            scale_id: self.scale_id,
            series_id: self.series_id,
        })
    }
}

#[derive(FromRow)]
struct ResultRow {
    result_id: Uuid,
    event_id: Uuid,
    rider_id: Uuid,
    class_id: Option<Uuid>,
    position: Option<i32>,
    seeding_position: Option<i32>,
    status: String,
    finish_time: Option<Decimal>,
    points: Decimal,
}

impl ResultRow {
    fn into_result(self) -> Result<RaceResult> {
        Ok(RaceResult {
            result_id: self.result_id,
            event_id: self.event_id,
            rider_id: self.rider_id,
            class_id: self.class_id,
            position: self.position,
            seeding_position: self.seeding_position,
            status: self.status.parse().map_err(StorageError::Decode)?,
            finish_time: self.finish_time,
            points: self.points,
        })
    }
}

/// Repository for events and their results.
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT event_id, name, date, format, scale_id, series_id
            FROM events
            ORDER BY date, event_id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    pub async fn results_for_event(&self, event_id: Uuid) -> Result<Vec<RaceResult>> {
        let rows: Vec<ResultRow> = sqlx::query_as(
            r#"
            SELECT result_id, event_id, rider_id, class_id, position,
                   seeding_position, status, finish_time, points
            FROM results
            WHERE event_id = $1
            ORDER BY result_id
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ResultRow::into_result).collect()
    }

    pub async fn set_result_points(&self, result_id: Uuid, points: Decimal) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE results
            SET points = $2
            WHERE result_id = $1
            "#,
        )
        .bind(result_id)
        .bind(points)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
