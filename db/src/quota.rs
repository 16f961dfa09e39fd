use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{FREE_PLAN_NAME, models::plan::PlanLimitsRow};

/// Ceilings of the user's active plan, or of the Free plan when the user has
/// no active subscription, together with the live category count.
pub async fn get_user_plan_limits<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<PlanLimitsRow> {
    sqlx::query_as::<_, PlanLimitsRow>(
        r#"
        SELECT
            p.name AS plan_name,
            p.max_categories,
            p.max_videos_per_category,
            p.max_screenshots_per_user,
            p.storage_quota_mb,
            p.ai_summary_enabled,
            (SELECT COUNT(*) FROM categories c WHERE c.user_id = $1) AS current_categories
        FROM plans p
        WHERE p.id = COALESCE(
            (SELECT s.plan_id FROM user_subscriptions s
             WHERE s.user_id = $1 AND s.status = 'active'
             LIMIT 1),
            (SELECT f.id FROM plans f WHERE f.name = $2 LIMIT 1)
        )
        "#,
    )
    .bind(user_id)
    .bind(FREE_PLAN_NAME)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No plan configured for user {}", user_id)))
}

pub async fn count_videos_in_category<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    category_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE user_id = $1 AND category_id = $2")
        .bind(user_id)
        .bind(category_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_screenshots<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM screenshots WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_storage_used_bytes<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM screenshots WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
