use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::plan::Plan;

pub async fn get_plan_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_id: Uuid,
) -> Res<Option<Plan>> {
    sqlx::query_as::<_, Plan>(
        r#"
        SELECT id, name, max_categories, max_videos_per_category, max_screenshots_per_user,
               storage_quota_mb, ai_summary_enabled, enabled, price_monthly, price_yearly,
               created_at, updated_at
        FROM plans WHERE id = $1
        "#,
    )
    .bind(plan_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_enabled_plans<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<Vec<Plan>> {
    sqlx::query_as::<_, Plan>(
        r#"
        SELECT id, name, max_categories, max_videos_per_category, max_screenshots_per_user,
               storage_quota_mb, ai_summary_enabled, enabled, price_monthly, price_yearly,
               created_at, updated_at
        FROM plans WHERE enabled = TRUE
        ORDER BY price_monthly ASC
        "#,
    )
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}
