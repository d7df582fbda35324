use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::entities::EntityKind;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOutcome {
    pub item_id: String,
    pub item_type: EntityKind,
    pub is_featured: bool,
}

/// Only turning an unfeatured item on can exceed the cap.
pub fn exceeds_featured_cap(currently: bool, requested: bool, featured_count: i64, cap: i64) -> bool {
    requested && !currently && featured_count >= cap
}

/// Sets `is_featured` on one entity. Toggles of the same kind serialize on an
/// advisory lock so two concurrent requests cannot both take the last slot.
pub async fn set_featured(
    pool: &PgPool,
    kind: EntityKind,
    item_id: i64,
    is_featured: bool,
    cap: i64,
) -> Result<FeatureOutcome, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("featured:{}", kind.as_str()))
        .execute(&mut *tx)
        .await?;

    let current: Option<bool> = sqlx::query_scalar(&format!(
        "SELECT is_featured FROM {} WHERE id = $1 FOR UPDATE",
        kind.table()
    ))
    .bind(item_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(current) = current else {
        return Err(kind.not_found(item_id));
    };

    if is_featured && !current {
        let featured_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE is_featured",
            kind.table()
        ))
        .fetch_one(&mut *tx)
        .await?;
        if exceeds_featured_cap(current, is_featured, featured_count, cap) {
            return Err(AppError::FeaturedLimit {
                kind: kind.as_str(),
                cap,
            });
        }
    }

    if current != is_featured {
        sqlx::query(&format!(
            "UPDATE {} SET is_featured = $2, updated_at = now() WHERE id = $1",
            kind.table()
        ))
        .bind(item_id)
        .bind(is_featured)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(kind = kind.as_str(), item_id, is_featured, "Feature flag set");

    Ok(FeatureOutcome {
        item_id: item_id.to_string(),
        item_type: kind,
        is_featured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_blocks_only_new_features() {
        assert!(exceeds_featured_cap(false, true, 6, 6));
        assert!(!exceeds_featured_cap(false, true, 5, 6));
        // Already featured, or unfeaturing: never blocked.
        assert!(!exceeds_featured_cap(true, true, 6, 6));
        assert!(!exceeds_featured_cap(true, false, 9, 6));
        assert!(!exceeds_featured_cap(false, false, 9, 6));
    }
}
