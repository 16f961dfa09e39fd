use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::models::subscription::SubscriptionStatus;
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    services::{billing::BillingProvider, status::SubscriptionReconciler},
    store::SubscriptionStore,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Billing stops at the end of the paid period; access continues until then.
    ScheduledAtPeriodEnd { access_until: DateTime<Utc> },
    Canceled,
}

impl<S, P> SubscriptionReconciler<S, P>
where
    S: SubscriptionStore,
    P: BillingProvider,
{
    /// Cancels the user's active subscription.
    ///
    /// Stripe-backed subscriptions are canceled at period end and keep their
    /// status; `reconcile` expires them once the stored end date passes.
    /// Local-only subscriptions are canceled immediately.
    pub async fn cancel(&self, user_id: Uuid) -> Res<CancelOutcome> {
        let sub = self
            .store
            .active_subscription(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

        let outcome = match sub.stripe_subscription_id.as_deref() {
            Some(subscription_ref) => {
                let provider = self.provider.as_ref().ok_or_else(|| {
                    AppError::BillingUnavailable("Stripe is not configured".to_string())
                })?;

                let remote = provider.cancel_at_period_end(subscription_ref).await?;
                let access_until = remote.current_period_end.unwrap_or_else(Utc::now);
                self.store.set_end_date(user_id, access_until).await?;

                info!(
                    "Stripe subscription {} for user {} cancels at {}",
                    subscription_ref, user_id, access_until
                );
                CancelOutcome::ScheduledAtPeriodEnd { access_until }
            }
            None => {
                self.store
                    .mark_status(user_id, SubscriptionStatus::Canceled)
                    .await?;

                info!("Canceled local subscription {} for user {}", sub.id, user_id);
                CancelOutcome::Canceled
            }
        };

        self.cache.invalidate(&user_id);
        Ok(outcome)
    }
}
