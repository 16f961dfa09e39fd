use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use stripe::{Client, StripeError, Subscription, SubscriptionId, UpdateSubscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Active,
    /// Any other provider-side state, e.g. `canceled` or `past_due`.
    Inactive(String),
    NotFound,
}

impl ProviderStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ProviderStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    pub status: ProviderStatus,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl ProviderSubscription {
    pub fn not_found() -> Self {
        Self {
            status: ProviderStatus::NotFound,
            current_period_end: None,
        }
    }
}

/// External billing system holding the authoritative subscription state.
pub trait BillingProvider {
    fn subscription_status(
        &self,
        subscription_ref: &str,
    ) -> impl Future<Output = Res<ProviderSubscription>> + Send;

    fn cancel_at_period_end(
        &self,
        subscription_ref: &str,
    ) -> impl Future<Output = Res<ProviderSubscription>> + Send;
}

/// Stripe-backed provider. Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct StripeBilling {
    client: Client,
    timeout: Duration,
}

impl StripeBilling {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StripeError>>,
    ) -> Res<Result<T, StripeError>> {
        tokio::time::timeout(self.timeout, call).await.map_err(|_| {
            AppError::BillingUnavailable(format!(
                "Stripe did not respond within {}s",
                self.timeout.as_secs()
            ))
        })
    }
}

fn parse_subscription_id(subscription_ref: &str) -> Res<SubscriptionId> {
    subscription_ref
        .parse::<SubscriptionId>()
        .map_err(|e| AppError::Internal(format!("Invalid subscription ID: {}", e)))
}

fn is_missing(err: &StripeError) -> bool {
    matches!(err, StripeError::Stripe(req) if req.http_status == 404)
}

fn from_stripe(sub: &Subscription) -> ProviderSubscription {
    let status = match &sub.status {
        stripe::SubscriptionStatus::Active => ProviderStatus::Active,
        other => ProviderStatus::Inactive(other.to_string()),
    };

    ProviderSubscription {
        status,
        current_period_end: DateTime::from_timestamp(sub.current_period_end, 0),
    }
}

impl BillingProvider for StripeBilling {
    async fn subscription_status(&self, subscription_ref: &str) -> Res<ProviderSubscription> {
        let id = parse_subscription_id(subscription_ref)?;

        match self
            .bounded(Subscription::retrieve(&self.client, &id, &[]))
            .await?
        {
            Ok(sub) => Ok(from_stripe(&sub)),
            Err(e) if is_missing(&e) => Ok(ProviderSubscription::not_found()),
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn cancel_at_period_end(&self, subscription_ref: &str) -> Res<ProviderSubscription> {
        let id = parse_subscription_id(subscription_ref)?;
        let params = UpdateSubscription {
            cancel_at_period_end: Some(true),
            ..Default::default()
        };

        let sub = self
            .bounded(Subscription::update(&self.client, &id, params))
            .await?
            .map_err(AppError::from)?;

        Ok(from_stripe(&sub))
    }
}
