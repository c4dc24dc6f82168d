use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{EventFormat, PointScale};

#[derive(FromRow)]
struct ScaleRow {
    scale_id: Uuid,
    name: String,
    trailing_points: Decimal,
    default_for_format: Option<String>,
}

#[derive(FromRow)]
struct ScaleValueRow {
    position: i32,
    points: Decimal,
}

/// Repository for point scales. A scale is stored as a header row plus one
/// value row per position; this layer reassembles them.
pub struct ScaleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ScaleRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, scale_id: Uuid) -> Result<Option<PointScale>> {
        let row: Option<ScaleRow> = sqlx::query_as(
            r#"
            SELECT scale_id, name, trailing_points, default_for_format
            FROM point_scales
            WHERE scale_id = $1
            "#,
        )
        .bind(scale_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn default_for_format(&self, format: EventFormat) -> Result<Option<PointScale>> {
        let row: Option<ScaleRow> = sqlx::query_as(
            r#"
            SELECT scale_id, name, trailing_points, default_for_format
            FROM point_scales
            WHERE default_for_format = $1
            ORDER BY scale_id
            LIMIT 1
            "#,
        )
        .bind(format.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn assemble(&self, row: ScaleRow) -> Result<PointScale> {
        let value_rows: Vec<ScaleValueRow> = sqlx::query_as(
            r#"
            SELECT position, points
            FROM point_scale_values
            WHERE scale_id = $1
            ORDER BY position
            "#,
        )
        .bind(row.scale_id)
        .fetch_all(self.pool)
        .await?;

        // Positions are 1..N and contiguous per the schema; gaps would
        // shift every later position, so reject them outright.
        let mut values = Vec::with_capacity(value_rows.len());
        for (index, value) in value_rows.iter().enumerate() {
            if value.position != index as i32 + 1 {
                return Err(StorageError::Decode(format!(
                    "scale {} has a gap at position {}",
                    row.scale_id, value.position
                )));
            }
            values.push(value.points);
        }

        let default_for_format = match row.default_for_format {
            Some(s) => Some(s.parse().map_err(StorageError::Decode)?),
            None => None,
        };

        Ok(PointScale {
            scale_id: row.scale_id,
            name: row.name,
            values,
            trailing: row.trailing_points,
            default_for_format,
        })
    }
}
