use std::{future::Future, sync::Arc};

use common::error::Res;
use sqlx::PgPool;
use uuid::Uuid;

use crate::limits::UserPlanLimits;

/// Where the evaluator reads plan ceilings and live usage counters from.
pub trait QuotaSource {
    /// Plan ceilings for the user, including the live category count.
    fn plan_limits(&self, user_id: Uuid) -> impl Future<Output = Res<UserPlanLimits>> + Send;

    fn count_videos_in_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> impl Future<Output = Res<i64>> + Send;

    fn count_screenshots(&self, user_id: Uuid) -> impl Future<Output = Res<i64>> + Send;

    fn storage_used_bytes(&self, user_id: Uuid) -> impl Future<Output = Res<i64>> + Send;
}

/// Reads quota data straight from Postgres.
#[derive(Clone)]
pub struct PgQuotaSource {
    pool: Arc<PgPool>,
}

impl PgQuotaSource {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl QuotaSource for PgQuotaSource {
    async fn plan_limits(&self, user_id: Uuid) -> Res<UserPlanLimits> {
        db::quota::get_user_plan_limits(&*self.pool, user_id)
            .await
            .map(UserPlanLimits::from)
    }

    async fn count_videos_in_category(&self, user_id: Uuid, category_id: Uuid) -> Res<i64> {
        db::quota::count_videos_in_category(&*self.pool, user_id, category_id).await
    }

    async fn count_screenshots(&self, user_id: Uuid) -> Res<i64> {
        db::quota::count_screenshots(&*self.pool, user_id).await
    }

    async fn storage_used_bytes(&self, user_id: Uuid) -> Res<i64> {
        db::quota::get_storage_used_bytes(&*self.pool, user_id).await
    }
}
