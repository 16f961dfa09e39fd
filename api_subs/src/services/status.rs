use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::error::Res;
use db::{
    FREE_PLAN_NAME,
    models::subscription::{ActiveSubscription, SubscriptionStatus},
};
use limiter::cache::LimitsCache;
use log::{error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::{services::billing::BillingProvider, store::SubscriptionStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionStatusReport {
    pub subscribed: bool,
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubscriptionStatusReport {
    pub fn free() -> Self {
        Self {
            subscribed: false,
            plan: FREE_PLAN_NAME.to_string(),
            billing_interval: None,
            end_date: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            error: None,
        }
    }

    /// Free Plan report carrying the reason the check could not complete.
    pub fn free_with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::free()
        }
    }

    fn active(sub: ActiveSubscription) -> Self {
        Self {
            subscribed: true,
            plan: sub.plan_name,
            billing_interval: sub.billing_interval,
            end_date: sub.end_date,
            stripe_customer_id: sub.stripe_customer_id,
            stripe_subscription_id: sub.stripe_subscription_id,
            error: None,
        }
    }
}

/// Brings the local subscription record in line with the billing provider
/// and the subscription's own end date.
///
/// Provider failures fail open: the local record stays authoritative.
/// A passed end date always downgrades, whatever the provider says.
pub struct SubscriptionReconciler<S, P> {
    pub(crate) store: S,
    pub(crate) provider: Option<P>,
    pub(crate) cache: Arc<LimitsCache>,
}

impl<S, P> SubscriptionReconciler<S, P>
where
    S: SubscriptionStore,
    P: BillingProvider,
{
    pub fn new(store: S, provider: Option<P>, cache: Arc<LimitsCache>) -> Self {
        Self {
            store,
            provider,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<LimitsCache> {
        &self.cache
    }

    pub async fn reconcile(&self, user_id: Uuid) -> Res<SubscriptionStatusReport> {
        info!("Checking subscription for user {}", user_id);

        let Some(sub) = self.store.active_subscription(user_id).await? else {
            info!("No active subscription for user {}, on {}", user_id, FREE_PLAN_NAME);
            return Ok(SubscriptionStatusReport::free());
        };

        if let (Some(subscription_ref), Some(provider)) =
            (sub.stripe_subscription_id.as_deref(), self.provider.as_ref())
        {
            match provider.subscription_status(subscription_ref).await {
                Ok(remote) if remote.status.is_active() => {
                    info!("Stripe subscription {} is active", subscription_ref);
                }
                Ok(remote) => {
                    info!(
                        "Stripe subscription {} is no longer active ({:?}), canceling for user {}",
                        subscription_ref, remote.status, user_id
                    );
                    self.downgrade(user_id, SubscriptionStatus::Canceled).await;
                    return Ok(SubscriptionStatusReport::free());
                }
                Err(e) => {
                    warn!(
                        "Could not reach Stripe for subscription {}, keeping local status: {}",
                        subscription_ref, e
                    );
                }
            }
        }

        if sub.is_expired_at(Utc::now()) {
            info!(
                "Subscription {} for user {} ended at {:?}, marking expired",
                sub.id, user_id, sub.end_date
            );
            self.downgrade(user_id, SubscriptionStatus::Expired).await;
            return Ok(SubscriptionStatusReport::free());
        }

        info!("User {} is subscribed to {}", user_id, sub.plan_name);
        Ok(SubscriptionStatusReport::active(sub))
    }

    async fn downgrade(&self, user_id: Uuid, status: SubscriptionStatus) {
        if let Err(e) = self.store.mark_status(user_id, status).await {
            error!(
                "Failed to mark subscription {} for user {}: {}",
                status, user_id, e
            );
        }
        self.cache.invalidate(&user_id);
    }
}
