use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::RiderEventScore;
use crate::error::{Result, StorageError};
use crate::models::Rider;

#[derive(FromRow)]
struct RiderRow {
    rider_id: Uuid,
    name: String,
    club_id: Option<Uuid>,
}

#[derive(FromRow)]
struct EventScoreRow {
    event_id: Uuid,
    event_date: NaiveDate,
    format: String,
    points: Decimal,
    field_size: i64,
}

/// Repository for riders and their scored event history.
pub struct RiderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RiderRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Rider>> {
        let rows: Vec<RiderRow> = sqlx::query_as(
            r#"
            SELECT rider_id, name, club_id
            FROM riders
            ORDER BY rider_id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Rider {
                rider_id: row.rider_id,
                name: row.name,
                club_id: row.club_id,
            })
            .collect())
    }

    /// The rider's full scored history with the field size of each event,
    /// ordered by event date.
    pub async fn event_scores(&self, rider_id: Uuid) -> Result<Vec<RiderEventScore>> {
        let rows: Vec<EventScoreRow> = sqlx::query_as(
            r#"
            SELECT r.event_id,
                   e.date AS event_date,
                   e.format,
                   r.points,
                   (SELECT COUNT(*) FROM results r2 WHERE r2.event_id = r.event_id) AS field_size
            FROM results r
            INNER JOIN events e ON e.event_id = r.event_id
            WHERE r.rider_id = $1
            ORDER BY e.date, r.event_id
            "#,
        )
        .bind(rider_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RiderEventScore {
                    event_id: row.event_id,
                    event_date: row.event_date,
                    format: row.format.parse().map_err(StorageError::Decode)?,
                    points: row.points,
                    field_size: row.field_size.max(0) as u32,
                })
            })
            .collect()
    }
}
