use std::sync::Arc;

use actix_web::{
    Responder, post, put,
    web::{self},
};
use common::{error::Res, http::Success};
use limiter::cache::LimitsCache;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::admin::{ChangePlanRequest, ChangePlanResponse, ClearCacheResponse},
    services,
};

/// Puts a user on the requested plan, replacing their current subscription.
#[put("/users/{user_id}/plan")]
pub async fn put_user_plan(
    pool: web::Data<Arc<PgPool>>,
    cache: web::Data<LimitsCache>,
    path: web::Path<Uuid>,
    req: web::Json<ChangePlanRequest>,
) -> Res<impl Responder> {
    let user_id = path.into_inner();
    let plan = services::admin::change_user_plan(&pool, &cache, user_id, req.plan_id).await?;
    Success::ok(ChangePlanResponse {
        user_id,
        plan_id: plan.id,
        plan: plan.name,
    })
}

#[post("/users/{user_id}/suspend")]
pub async fn post_suspend(
    pool: web::Data<Arc<PgPool>>,
    cache: web::Data<LimitsCache>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    services::admin::suspend_user(&pool, &cache, path.into_inner()).await?;
    Success::no_content()
}

#[post("/users/{user_id}/reactivate")]
pub async fn post_reactivate(
    pool: web::Data<Arc<PgPool>>,
    cache: web::Data<LimitsCache>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    services::admin::reactivate_user(&pool, &cache, path.into_inner()).await?;
    Success::no_content()
}

#[post("/users/{user_id}/cache/clear")]
pub async fn post_clear_user_cache(
    cache: web::Data<LimitsCache>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    services::admin::clear_user_cache(&cache, path.into_inner());
    Success::no_content()
}

#[post("/cache/clear")]
pub async fn post_clear_cache(cache: web::Data<LimitsCache>) -> Res<impl Responder> {
    let cleared = services::admin::clear_all_caches(&cache);
    Success::ok(ClearCacheResponse { cleared })
}
