use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use common::error::Res;
use db::models::subscription::{ActiveSubscription, SubscriptionStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Local record of users' subscriptions.
pub trait SubscriptionStore {
    fn active_subscription(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Res<Option<ActiveSubscription>>> + Send;

    fn mark_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
    ) -> impl Future<Output = Res<()>> + Send;

    fn set_end_date(
        &self,
        user_id: Uuid,
        end_date: DateTime<Utc>,
    ) -> impl Future<Output = Res<()>> + Send;
}

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: Arc<PgPool>,
}

impl PgSubscriptionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl SubscriptionStore for PgSubscriptionStore {
    async fn active_subscription(&self, user_id: Uuid) -> Res<Option<ActiveSubscription>> {
        db::subscription::get_active_subscription(&*self.pool, user_id).await
    }

    async fn mark_status(&self, user_id: Uuid, status: SubscriptionStatus) -> Res<()> {
        if !db::subscription::update_subscription_status(&*self.pool, user_id, status).await? {
            log::warn!(
                "No active subscription row to mark {} for user {}",
                status,
                user_id
            );
        }
        Ok(())
    }

    async fn set_end_date(&self, user_id: Uuid, end_date: DateTime<Utc>) -> Res<()> {
        db::subscription::update_subscription_end_date(&*self.pool, user_id, end_date).await?;
        Ok(())
    }
}
