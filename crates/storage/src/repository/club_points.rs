use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ClubEventPoints, ClubRiderPoints};

#[derive(FromRow)]
struct EventPointsRow {
    event_id: Uuid,
    series_id: Uuid,
    club_id: Uuid,
    points: Decimal,
}

/// Repository for the intermediate club point tables.
pub struct ClubPointsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClubPointsRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn replace_event_points(
        &self,
        event_id: Uuid,
        series_id: Uuid,
        rows: Vec<ClubEventPoints>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM club_event_points
            WHERE event_id = $1 AND series_id = $2
            "#,
        )
        .bind(event_id)
        .bind(series_id)
        .execute(&mut *tx)
        .await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO club_event_points (event_id, series_id, club_id, points)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.event_id)
            .bind(row.series_id)
            .bind(row.club_id)
            .bind(row.points)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn replace_rider_points(
        &self,
        series_id: Uuid,
        rows: Vec<ClubRiderPoints>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM club_rider_points WHERE series_id = $1")
            .bind(series_id)
            .execute(&mut *tx)
            .await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO club_rider_points (rider_id, series_id, club_id, points)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.rider_id)
            .bind(row.series_id)
            .bind(row.club_id)
            .bind(row.points)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn event_points_for_series(&self, series_id: Uuid) -> Result<Vec<ClubEventPoints>> {
        let rows: Vec<EventPointsRow> = sqlx::query_as(
            r#"
            SELECT event_id, series_id, club_id, points
            FROM club_event_points
            WHERE series_id = $1
            ORDER BY event_id, club_id
            "#,
        )
        .bind(series_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ClubEventPoints {
                event_id: row.event_id,
                series_id: row.series_id,
                club_id: row.club_id,
                points: row.points,
            })
            .collect())
    }
}
