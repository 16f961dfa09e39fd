use common::error::{AppError, Res};
use db::models::{plan::Plan, subscription::SubscriptionStatus};
use limiter::cache::LimitsCache;
use log::info;
use sqlx::PgPool;
use uuid::Uuid;

/// Moves a user onto `plan_id`, replacing whatever subscription they had.
pub async fn change_user_plan(
    pool: &PgPool,
    cache: &LimitsCache,
    user_id: Uuid,
    plan_id: Uuid,
) -> Res<Plan> {
    let plan = db::plan::get_plan_by_id(pool, plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan {} does not exist", plan_id)))?;

    if !plan.enabled {
        return Err(AppError::BadRequest(format!(
            "{} is not available for assignment",
            plan.name
        )));
    }

    db::subscription::upsert_user_plan(pool, user_id, plan.id).await?;
    cache.invalidate(&user_id);

    info!("Moved user {} to {}", user_id, plan.name);
    Ok(plan)
}

pub async fn suspend_user(pool: &PgPool, cache: &LimitsCache, user_id: Uuid) -> Res<()> {
    set_status(pool, cache, user_id, SubscriptionStatus::Suspended).await
}

pub async fn reactivate_user(pool: &PgPool, cache: &LimitsCache, user_id: Uuid) -> Res<()> {
    set_status(pool, cache, user_id, SubscriptionStatus::Active).await
}

async fn set_status(
    pool: &PgPool,
    cache: &LimitsCache,
    user_id: Uuid,
    status: SubscriptionStatus,
) -> Res<()> {
    if !db::subscription::set_user_status(pool, user_id, status).await? {
        return Err(AppError::NotFound(format!(
            "User {} has no subscription",
            user_id
        )));
    }
    cache.invalidate(&user_id);

    info!("Set subscription of user {} to {}", user_id, status);
    Ok(())
}

pub fn clear_user_cache(cache: &LimitsCache, user_id: Uuid) {
    cache.invalidate(&user_id);
    info!("Cleared cached limits for user {}", user_id);
}

pub fn clear_all_caches(cache: &LimitsCache) -> usize {
    let dropped = cache.len();
    cache.invalidate_all();
    info!("Cleared cached limits for {} users", dropped);
    dropped
}
