use db::models::plan::Plan;
use limiter::limits::Limit;
use serde::Serialize;
use uuid::Uuid;

/// A plan as shown in the catalogue, with every ceiling normalized.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: Uuid,
    pub name: String,
    pub max_categories: Limit,
    pub max_videos_per_category: Limit,
    pub max_screenshots_per_user: Limit,
    pub storage_quota_bytes: Limit,
    pub ai_summary_enabled: bool,
    pub price_monthly: i64,
    pub price_yearly: i64,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            max_categories: Limit::from_sentinel(plan.max_categories.into()),
            max_videos_per_category: Limit::from_sentinel(plan.max_videos_per_category.into()),
            max_screenshots_per_user: Limit::from_nullable(
                plan.max_screenshots_per_user.map(i64::from),
            ),
            storage_quota_bytes: Limit::from_megabytes(plan.storage_quota_mb),
            ai_summary_enabled: plan.ai_summary_enabled,
            price_monthly: plan.price_monthly,
            price_yearly: plan.price_yearly,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PlanResponse>,
}
