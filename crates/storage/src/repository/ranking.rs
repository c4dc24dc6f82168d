use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ClubRanking, RiderRanking};

/// Repository for the derived ranking tables. Writes are delete-then-insert
/// inside one transaction so a recompute can never leave duplicates.
pub struct RankingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RankingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn replace_rider_rankings(
        &self,
        rider_id: Uuid,
        rankings: Vec<RiderRanking>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM rider_rankings WHERE rider_id = $1")
            .bind(rider_id)
            .execute(&mut *tx)
            .await?;

        for ranking in rankings {
            sqlx::query(
                r#"
                INSERT INTO rider_rankings (rider_id, discipline, points, event_count)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(ranking.rider_id)
            .bind(ranking.discipline.as_str())
            .bind(ranking.points)
            .bind(ranking.event_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn replace_club_rankings(&self, rankings: Vec<ClubRanking>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM club_rankings").execute(&mut *tx).await?;

        for ranking in rankings {
            sqlx::query(
                r#"
                INSERT INTO club_rankings (club_id, discipline, points, rider_count)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(ranking.club_id)
            .bind(ranking.discipline.as_str())
            .bind(ranking.points)
            .bind(ranking.rider_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
