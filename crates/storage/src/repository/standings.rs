use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::ClubStanding;

#[derive(FromRow)]
struct StandingRow {
    club_id: Uuid,
    series_id: Uuid,
    total_points: Decimal,
    rank: i32,
}

/// Repository for the materialized standings cache.
pub struct StandingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StandingsRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Full replace for one series. The unique (club_id, series_id) index
    /// backs the one-row-per-pair guarantee.
    pub async fn replace(&self, series_id: Uuid, rows: Vec<ClubStanding>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM club_standings WHERE series_id = $1")
            .bind(series_id)
            .execute(&mut *tx)
            .await?;

        let mut written = 0u64;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO club_standings (club_id, series_id, total_points, rank)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.club_id)
            .bind(row.series_id)
            .bind(row.total_points)
            .bind(row.rank)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }

    pub async fn list_for_series(&self, series_id: Uuid) -> Result<Vec<ClubStanding>> {
        let rows: Vec<StandingRow> = sqlx::query_as(
            r#"
            SELECT club_id, series_id, total_points, rank
            FROM club_standings
            WHERE series_id = $1
            ORDER BY rank
            "#,
        )
        .bind(series_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ClubStanding {
                club_id: row.club_id,
                series_id: row.series_id,
                total_points: row.total_points,
                rank: row.rank,
            })
            .collect())
    }
}
