use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::models::subscription::{ActiveSubscription, SubscriptionStatus};
use limiter::limits::{Limit, UserPlanLimits};
use uuid::Uuid;

use crate::{
    services::billing::{BillingProvider, ProviderStatus, ProviderSubscription},
    store::SubscriptionStore,
};

pub(crate) fn subscription(
    end_date: Option<DateTime<Utc>>,
    stripe_subscription_id: Option<&str>,
) -> ActiveSubscription {
    ActiveSubscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        plan_name: "Premium Plan".to_string(),
        status: "active".to_string(),
        billing_interval: Some("monthly".to_string()),
        start_date: Utc::now(),
        end_date,
        stripe_customer_id: stripe_subscription_id.map(|_| "cus_123".to_string()),
        stripe_subscription_id: stripe_subscription_id.map(str::to_string),
    }
}

pub(crate) fn cached_limits() -> UserPlanLimits {
    UserPlanLimits {
        plan_name: "Premium Plan".to_string(),
        max_categories: Limit::Limited(25),
        max_videos_per_category: Limit::Limited(100),
        max_screenshots_per_user: Limit::Limited(100),
        storage_quota_bytes: Limit::Limited(1024 * 1024 * 1024),
        ai_summary_enabled: false,
        current_categories: 4,
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    subscription: Mutex<Option<ActiveSubscription>>,
    statuses: Mutex<Vec<SubscriptionStatus>>,
    end_dates: Mutex<Vec<DateTime<Utc>>>,
    failing_reads: AtomicBool,
    failing_writes: AtomicBool,
}

impl FakeStore {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with(sub: ActiveSubscription) -> Self {
        let store = Self::default();
        *store.subscription.lock().unwrap() = Some(sub);
        store
    }

    pub(crate) fn fail_reads(&self) {
        self.failing_reads.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self) {
        self.failing_writes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn written(&self) -> Vec<SubscriptionStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub(crate) fn end_dates(&self) -> Vec<DateTime<Utc>> {
        self.end_dates.lock().unwrap().clone()
    }

    fn check_write(&self) -> Res<()> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("write failed".to_string()));
        }
        Ok(())
    }
}

impl SubscriptionStore for FakeStore {
    async fn active_subscription(&self, _user_id: Uuid) -> Res<Option<ActiveSubscription>> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("read failed".to_string()));
        }
        Ok(self.subscription.lock().unwrap().clone())
    }

    async fn mark_status(&self, _user_id: Uuid, status: SubscriptionStatus) -> Res<()> {
        self.check_write()?;
        self.statuses.lock().unwrap().push(status);
        Ok(())
    }

    async fn set_end_date(&self, _user_id: Uuid, end_date: DateTime<Utc>) -> Res<()> {
        self.check_write()?;
        self.end_dates.lock().unwrap().push(end_date);
        Ok(())
    }
}

pub(crate) struct FakeBilling {
    reply: Option<ProviderSubscription>,
    calls: AtomicUsize,
    canceled: Mutex<Vec<String>>,
}

impl FakeBilling {
    pub(crate) fn replying(status: ProviderStatus) -> Self {
        Self::with_period_end(status, None)
    }

    pub(crate) fn with_period_end(
        status: ProviderStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            reply: Some(ProviderSubscription {
                status,
                current_period_end,
            }),
            calls: AtomicUsize::new(0),
            canceled: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            canceled: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn canceled(&self) -> Vec<String> {
        self.canceled.lock().unwrap().clone()
    }

    fn respond(&self) -> Res<ProviderSubscription> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| AppError::BillingUnavailable("connection refused".to_string()))
    }
}

impl BillingProvider for FakeBilling {
    async fn subscription_status(&self, _subscription_ref: &str) -> Res<ProviderSubscription> {
        self.respond()
    }

    async fn cancel_at_period_end(&self, subscription_ref: &str) -> Res<ProviderSubscription> {
        let reply = self.respond()?;
        self.canceled
            .lock()
            .unwrap()
            .push(subscription_ref.to_string());
        Ok(reply)
    }
}
