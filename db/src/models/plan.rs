use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub max_categories: i32,
    pub max_videos_per_category: i32,
    pub max_screenshots_per_user: Option<i32>,
    pub storage_quota_mb: Option<i64>,
    pub ai_summary_enabled: bool,
    pub enabled: bool,
    pub price_monthly: i64,
    pub price_yearly: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw plan ceilings for one user, exactly as stored.
/// `-1` and `NULL` both still mean "no ceiling" at this layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanLimitsRow {
    pub plan_name: String,
    pub max_categories: i32,
    pub max_videos_per_category: i32,
    pub max_screenshots_per_user: Option<i32>,
    pub storage_quota_mb: Option<i64>,
    pub ai_summary_enabled: bool,
    pub current_categories: i64,
}
