use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Suspended,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's active subscription row joined with its plan name.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ActiveSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub status: String,
    pub billing_interval: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
}

impl ActiveSubscription {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| now > end)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn subscription(end_date: Option<DateTime<Utc>>) -> ActiveSubscription {
        ActiveSubscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            plan_name: "Premium Plan".to_string(),
            status: "active".to_string(),
            billing_interval: Some("monthly".to_string()),
            start_date: Utc::now() - Duration::days(30),
            end_date,
            stripe_customer_id: None,
            stripe_subscription_id: None,
        }
    }

    #[test]
    fn status_names_match_stored_values() {
        let names: Vec<&str> = [
            SubscriptionStatus::Active,
            SubscriptionStatus::Suspended,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Expired,
        ]
        .iter()
        .map(SubscriptionStatus::as_str)
        .collect();
        assert_eq!(names, ["active", "suspended", "canceled", "expired"]);
    }

    #[test]
    fn open_ended_subscription_never_expires() {
        let now = Utc::now();
        assert!(!subscription(None).is_expired_at(now));
        assert!(subscription(Some(now - Duration::seconds(1))).is_expired_at(now));
        assert!(!subscription(Some(now + Duration::days(1))).is_expired_at(now));
    }
}
