use std::sync::Arc;

use actix_web::{
    Responder,
    web::{self},
};
use common::{error::Res, http::Success, jwt::JwtClaims};
use sqlx::PgPool;

use crate::{
    dtos::sub::{PlanResponse, PlansResponse},
    services::{
        billing::BillingProvider,
        status::{SubscriptionReconciler, SubscriptionStatusReport},
    },
    store::SubscriptionStore,
};

/// Reconciles and returns the caller's subscription.
///
/// Never fails: if the check cannot complete, the caller is reported on the
/// Free Plan with the error attached.
pub async fn get_status<S, P>(
    claims: web::ReqData<JwtClaims>,
    reconciler: web::Data<SubscriptionReconciler<S, P>>,
) -> Res<impl Responder>
where
    S: SubscriptionStore + 'static,
    P: BillingProvider + 'static,
{
    let report = match reconciler.reconcile(claims.user_id).await {
        Ok(report) => report,
        Err(e) => {
            log::error!("Subscription check failed for user {}: {}", claims.user_id, e);
            SubscriptionStatusReport::free_with_error(e.to_string())
        }
    };
    Success::ok(report)
}

/// Cancels the caller's active subscription.
pub async fn post_cancel<S, P>(
    claims: web::ReqData<JwtClaims>,
    reconciler: web::Data<SubscriptionReconciler<S, P>>,
) -> Res<impl Responder>
where
    S: SubscriptionStore + 'static,
    P: BillingProvider + 'static,
{
    let outcome = reconciler.cancel(claims.user_id).await?;
    Success::ok(outcome)
}

/// Lists the plans a user can be on.
pub async fn get_plans(pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let plans = db::plan::get_enabled_plans(&***pool)
        .await?
        .into_iter()
        .map(PlanResponse::from)
        .collect();
    Success::ok(PlansResponse { plans })
}
