use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::subscription::{ActiveSubscription, SubscriptionStatus};

pub async fn get_active_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<ActiveSubscription>> {
    sqlx::query_as::<_, ActiveSubscription>(
        r#"
        SELECT s.id, s.user_id, s.plan_id, p.name AS plan_name, s.status, s.billing_interval,
               s.start_date, s.end_date, s.stripe_customer_id, s.stripe_subscription_id
        FROM user_subscriptions s
        JOIN plans p ON p.id = s.plan_id
        WHERE s.user_id = $1 AND s.status = 'active'
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Moves the user's active subscription to `status`.
/// Returns false when there was no active row to update.
pub async fn update_subscription_status<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    status: SubscriptionStatus,
) -> Res<bool> {
    let result = sqlx::query(
        r#"
        UPDATE user_subscriptions
        SET status = $2, updated_at = NOW()
        WHERE user_id = $1 AND status = 'active'
        "#,
    )
    .bind(user_id)
    .bind(status.as_str())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_subscription_end_date<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    end_date: DateTime<Utc>,
) -> Res<bool> {
    let result = sqlx::query(
        r#"
        UPDATE user_subscriptions
        SET end_date = $2, updated_at = NOW()
        WHERE user_id = $1 AND status = 'active'
        "#,
    )
    .bind(user_id)
    .bind(end_date)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Sets the status of the user's subscription row whatever its current state.
/// Used by admin suspend / reactivate.
pub async fn set_user_status<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    status: SubscriptionStatus,
) -> Res<bool> {
    let result = sqlx::query(
        "UPDATE user_subscriptions SET status = $2, updated_at = NOW() WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(status.as_str())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Puts the user on `plan_id`. The unique `user_id` key keeps a single row
/// per user, so the previous subscription is replaced rather than duplicated.
pub async fn upsert_user_plan<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    plan_id: Uuid,
) -> Res<()> {
    sqlx::query(
        r#"
        INSERT INTO user_subscriptions (user_id, plan_id, status, start_date)
        VALUES ($1, $2, 'active', NOW())
        ON CONFLICT (user_id) DO UPDATE
        SET plan_id = EXCLUDED.plan_id,
            status = 'active',
            start_date = EXCLUDED.start_date,
            end_date = NULL,
            billing_interval = NULL,
            stripe_subscription_id = NULL,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(plan_id)
    .execute(executor)
    .await?;
    Ok(())
}
