use actix_web::{
    Responder,
    web::{self},
};
use common::{
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
};
use limiter::{evaluator::LimitEvaluator, source::QuotaSource};

use crate::dtos::limits::CheckQuery;

/// Returns the caller's plan ceilings and current category count.
pub async fn get_limits<S: QuotaSource + 'static>(
    claims: web::ReqData<JwtClaims>,
    evaluator: web::Data<LimitEvaluator<S>>,
) -> Res<impl Responder> {
    let limits = evaluator.user_limits(claims.user_id).await?;
    Success::ok(limits)
}

/// Answers whether the caller may perform the action behind `feature`.
///
/// Responds `200` for any verdict; a denial is carried in the body.
pub async fn get_check<S: QuotaSource + 'static>(
    claims: web::ReqData<JwtClaims>,
    evaluator: web::Data<LimitEvaluator<S>>,
    path: web::Path<String>,
    query: web::Query<CheckQuery>,
) -> Res<impl Responder> {
    let feature = path.into_inner();
    let check = match (feature.as_str(), query.bytes) {
        (_, Some(bytes)) if bytes < 0 => {
            return Err(AppError::BadRequest(
                "bytes must not be negative".to_string(),
            ));
        }
        ("storage", Some(bytes)) => evaluator.check_storage(claims.user_id, bytes).await,
        _ => {
            evaluator
                .check_feature_access(claims.user_id, &feature, query.category_id)
                .await
        }
    };
    log::debug!(
        "Limit check {} for user {}: allowed={}",
        feature,
        claims.user_id,
        check.allowed
    );
    Success::ok(check)
}

pub async fn get_storage<S: QuotaSource + 'static>(
    claims: web::ReqData<JwtClaims>,
    evaluator: web::Data<LimitEvaluator<S>>,
) -> Res<impl Responder> {
    let quota = evaluator.storage_quota(claims.user_id).await?;
    Success::ok(quota)
}

/// Drops the caller's cached limits so the next check reads fresh data.
pub async fn post_refresh<S: QuotaSource + 'static>(
    claims: web::ReqData<JwtClaims>,
    evaluator: web::Data<LimitEvaluator<S>>,
) -> Res<impl Responder> {
    evaluator.cache().invalidate(&claims.user_id);
    Success::no_content()
}
