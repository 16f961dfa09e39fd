use std::{str::FromStr, sync::Arc};

use common::error::Res;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    cache::LimitsCache,
    limits::{StorageQuota, UserPlanLimits},
    source::QuotaSource,
};

const LIMITS_UNAVAILABLE: &str = "Unable to verify your plan limits";

/// Verdict for a proposed create operation.
/// Denials carry enough detail for the client to render an upgrade prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_usage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl SubscriptionCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            current_usage: None,
            limit: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            current_usage: None,
            limit: None,
        }
    }

    pub fn over_limit(reason: impl Into<String>, current_usage: i64, limit: i64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            current_usage: Some(current_usage),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Categories,
    Videos,
    AiSummary,
    Screenshots,
    Storage,
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "categories" => Ok(Feature::Categories),
            "videos" => Ok(Feature::Videos),
            "ai_summary" => Ok(Feature::AiSummary),
            "screenshots" => Ok(Feature::Screenshots),
            "storage" => Ok(Feature::Storage),
            other => Err(format!("Unknown feature: {}", other)),
        }
    }
}

/// Decides whether a user's plan permits an action.
///
/// Every `check_*` method fails closed: when the underlying data cannot be
/// read the verdict is a denial, never an error.
pub struct LimitEvaluator<S> {
    source: S,
    cache: Arc<LimitsCache>,
}

impl<S: QuotaSource> LimitEvaluator<S> {
    pub fn new(source: S, cache: Arc<LimitsCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<LimitsCache> {
        &self.cache
    }

    /// Plan limits for the user, served from the cache when fresh.
    pub async fn user_limits(&self, user_id: Uuid) -> Res<UserPlanLimits> {
        self.cache
            .get_or_fetch(user_id, || self.source.plan_limits(user_id))
            .await
    }

    pub async fn storage_quota(&self, user_id: Uuid) -> Res<StorageQuota> {
        let limits = self.user_limits(user_id).await?;
        let used = self.source.storage_used_bytes(user_id).await?;
        Ok(StorageQuota::new(limits.storage_quota_bytes, used))
    }

    pub async fn check_category_creation(&self, user_id: Uuid) -> SubscriptionCheck {
        fail_closed(
            "check_category_creation",
            user_id,
            self.category_verdict(user_id).await,
        )
    }

    pub async fn check_video_addition(&self, user_id: Uuid, category_id: Uuid) -> SubscriptionCheck {
        fail_closed(
            "check_video_addition",
            user_id,
            self.video_verdict(user_id, category_id).await,
        )
    }

    pub async fn check_ai_summary_access(&self, user_id: Uuid) -> SubscriptionCheck {
        fail_closed(
            "check_ai_summary_access",
            user_id,
            self.ai_summary_verdict(user_id).await,
        )
    }

    pub async fn check_screenshot_upload(&self, user_id: Uuid) -> SubscriptionCheck {
        fail_closed(
            "check_screenshot_upload",
            user_id,
            self.screenshot_verdict(user_id).await,
        )
    }

    /// Whether `additional_bytes` more can be stored. With nothing left the
    /// answer is no even for a zero-byte probe.
    pub async fn check_storage(&self, user_id: Uuid, additional_bytes: i64) -> SubscriptionCheck {
        fail_closed(
            "check_storage",
            user_id,
            self.storage_verdict(user_id, additional_bytes).await,
        )
    }

    /// Dispatches a check by feature tag.
    pub async fn check_feature_access(
        &self,
        user_id: Uuid,
        feature: &str,
        category_id: Option<Uuid>,
    ) -> SubscriptionCheck {
        let feature = match feature.parse::<Feature>() {
            Ok(feature) => feature,
            Err(reason) => return SubscriptionCheck::denied(reason),
        };

        match feature {
            Feature::Categories => self.check_category_creation(user_id).await,
            Feature::Videos => match category_id {
                Some(category_id) => self.check_video_addition(user_id, category_id).await,
                None => {
                    SubscriptionCheck::denied("Category ID required for video addition check")
                }
            },
            Feature::AiSummary => self.check_ai_summary_access(user_id).await,
            Feature::Screenshots => self.check_screenshot_upload(user_id).await,
            Feature::Storage => self.check_storage(user_id, 0).await,
        }
    }

    async fn category_verdict(&self, user_id: Uuid) -> Res<SubscriptionCheck> {
        let limits = self.user_limits(user_id).await?;
        let current = limits.current_categories;
        Ok(match limits.max_categories.value() {
            Some(max) if current >= max => SubscriptionCheck::over_limit(
                format!("You've reached your plan limit of {} categories", max),
                current,
                max,
            ),
            _ => SubscriptionCheck::allowed(),
        })
    }

    async fn video_verdict(&self, user_id: Uuid, category_id: Uuid) -> Res<SubscriptionCheck> {
        let limits = self.user_limits(user_id).await?;
        let Some(max) = limits.max_videos_per_category.value() else {
            return Ok(SubscriptionCheck::allowed());
        };
        let current = self
            .source
            .count_videos_in_category(user_id, category_id)
            .await?;
        Ok(if current < max {
            SubscriptionCheck::allowed()
        } else {
            SubscriptionCheck::over_limit(
                format!("You've reached your plan limit of {} videos per category", max),
                current,
                max,
            )
        })
    }

    async fn ai_summary_verdict(&self, user_id: Uuid) -> Res<SubscriptionCheck> {
        let limits = self.user_limits(user_id).await?;
        Ok(if limits.ai_summary_enabled {
            SubscriptionCheck::allowed()
        } else {
            SubscriptionCheck::denied(format!(
                "AI Summary is not included in the {}. Upgrade to unlock this feature.",
                limits.plan_name
            ))
        })
    }

    async fn screenshot_verdict(&self, user_id: Uuid) -> Res<SubscriptionCheck> {
        let limits = self.user_limits(user_id).await?;
        let Some(max) = limits.max_screenshots_per_user.value() else {
            return Ok(SubscriptionCheck::allowed());
        };
        let current = self.source.count_screenshots(user_id).await?;
        Ok(if current < max {
            SubscriptionCheck::allowed()
        } else {
            SubscriptionCheck::over_limit(
                format!(
                    "You've reached your screenshot limit of {}. Upgrade your plan to add more screenshots.",
                    max
                ),
                current,
                max,
            )
        })
    }

    async fn storage_verdict(&self, user_id: Uuid, additional_bytes: i64) -> Res<SubscriptionCheck> {
        let quota = self.storage_quota(user_id).await?;
        let (Some(limit), Some(remaining)) = (quota.quota_bytes, quota.remaining_bytes) else {
            return Ok(SubscriptionCheck::allowed());
        };
        Ok(if remaining > 0 && additional_bytes <= remaining {
            SubscriptionCheck::allowed()
        } else {
            SubscriptionCheck::over_limit(
                "You've reached your storage limit. Delete older screenshots or upgrade your plan.",
                quota.used_bytes,
                limit,
            )
        })
    }
}

fn fail_closed(check: &str, user_id: Uuid, verdict: Res<SubscriptionCheck>) -> SubscriptionCheck {
    verdict.unwrap_or_else(|e| {
        log::error!("Error in {} for user {}: {}", check, user_id, e);
        SubscriptionCheck::denied(LIMITS_UNAVAILABLE)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use common::error::AppError;

    use super::*;
    use crate::limits::Limit;

    struct FakeSource {
        limits: Mutex<UserPlanLimits>,
        videos: i64,
        screenshots: i64,
        storage_used: i64,
        failing: AtomicBool,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn new(limits: UserPlanLimits) -> Self {
            Self {
                limits: Mutex::new(limits),
                videos: 0,
                screenshots: 0,
                storage_used: 0,
                failing: AtomicBool::new(false),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fail(&self) -> Res<()> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(AppError::Internal("database unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl QuotaSource for Arc<FakeSource> {
        async fn plan_limits(&self, _user_id: Uuid) -> Res<UserPlanLimits> {
            self.fail()?;
            Ok(self.limits.lock().unwrap().clone())
        }

        async fn count_videos_in_category(&self, _user_id: Uuid, _category_id: Uuid) -> Res<i64> {
            self.fail()?;
            Ok(self.videos)
        }

        async fn count_screenshots(&self, _user_id: Uuid) -> Res<i64> {
            self.fail()?;
            Ok(self.screenshots)
        }

        async fn storage_used_bytes(&self, _user_id: Uuid) -> Res<i64> {
            self.fail()?;
            Ok(self.storage_used)
        }
    }

    fn free_plan(current_categories: i64) -> UserPlanLimits {
        UserPlanLimits {
            plan_name: "Free Plan".to_string(),
            max_categories: Limit::Limited(3),
            max_videos_per_category: Limit::Limited(10),
            max_screenshots_per_user: Limit::Limited(5),
            storage_quota_bytes: Limit::Limited(1_000),
            ai_summary_enabled: false,
            current_categories,
        }
    }

    fn gold_plan(current_categories: i64) -> UserPlanLimits {
        UserPlanLimits {
            plan_name: "Gold Plan".to_string(),
            max_categories: Limit::Unlimited,
            max_videos_per_category: Limit::Unlimited,
            max_screenshots_per_user: Limit::Unlimited,
            storage_quota_bytes: Limit::Unlimited,
            ai_summary_enabled: true,
            current_categories,
        }
    }

    fn build(source: FakeSource) -> (LimitEvaluator<Arc<FakeSource>>, Arc<FakeSource>) {
        let source = Arc::new(source);
        (
            LimitEvaluator::new(source.clone(), Arc::new(LimitsCache::default())),
            source,
        )
    }

    #[tokio::test]
    async fn unlimited_categories_always_allowed() {
        for current in [0, 3, 10_000] {
            let (evaluator, _) = build(FakeSource::new(gold_plan(current)));
            let check = evaluator.check_category_creation(Uuid::new_v4()).await;
            assert!(check.allowed, "current = {}", current);
        }
    }

    #[tokio::test]
    async fn limited_categories_allowed_only_below_ceiling() {
        for current in 0..6 {
            let (evaluator, _) = build(FakeSource::new(free_plan(current)));
            let check = evaluator.check_category_creation(Uuid::new_v4()).await;
            if current < 3 {
                assert_eq!(check, SubscriptionCheck::allowed());
            } else {
                assert!(!check.allowed);
                assert_eq!(check.limit, Some(3));
                assert_eq!(check.current_usage, Some(current));
            }
        }
    }

    #[tokio::test]
    async fn free_plan_at_ceiling_recovers_after_delete_and_invalidate() {
        let user_id = Uuid::new_v4();
        let (evaluator, source) = build(FakeSource::new(free_plan(3)));

        let denied = evaluator.check_category_creation(user_id).await;
        assert_eq!(
            denied,
            SubscriptionCheck::over_limit("You've reached your plan limit of 3 categories", 3, 3)
        );

        // one category deleted
        *source.limits.lock().unwrap() = free_plan(2);
        assert!(!evaluator.check_category_creation(user_id).await.allowed);

        evaluator.cache().invalidate(&user_id);
        assert!(evaluator.check_category_creation(user_id).await.allowed);
    }

    #[tokio::test]
    async fn video_check_counts_the_category_not_the_user() {
        let mut source = FakeSource::new(free_plan(0));
        source.videos = 10;
        let (evaluator, _) = build(source);

        let check = evaluator
            .check_video_addition(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(!check.allowed);
        assert_eq!(check.current_usage, Some(10));
        assert_eq!(check.limit, Some(10));
        assert!(check.reason.unwrap().contains("videos per category"));
    }

    #[tokio::test]
    async fn unlimited_videos_skip_the_count() {
        let (evaluator, source) = build(FakeSource::new(gold_plan(0)));
        let check = evaluator
            .check_video_addition(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(check.allowed);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ai_summary_follows_plan_flag() {
        let (evaluator, _) = build(FakeSource::new(gold_plan(0)));
        assert!(evaluator.check_ai_summary_access(Uuid::new_v4()).await.allowed);

        let (evaluator, _) = build(FakeSource::new(free_plan(0)));
        let check = evaluator.check_ai_summary_access(Uuid::new_v4()).await;
        assert!(!check.allowed);
        assert_eq!(check.current_usage, None);
        assert_eq!(check.limit, None);
    }

    #[tokio::test]
    async fn videos_without_category_denied_without_fetch() {
        let (evaluator, source) = build(FakeSource::new(free_plan(0)));
        let check = evaluator
            .check_feature_access(Uuid::new_v4(), "videos", None)
            .await;

        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("Category ID required"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_feature_is_denied() {
        let (evaluator, source) = build(FakeSource::new(gold_plan(0)));
        let check = evaluator
            .check_feature_access(Uuid::new_v4(), "teleport", None)
            .await;

        assert_eq!(check, SubscriptionCheck::denied("Unknown feature: teleport"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn feature_access_dispatches_by_tag() {
        let (evaluator, _) = build(FakeSource::new(free_plan(3)));
        let user_id = Uuid::new_v4();

        assert!(!evaluator.check_feature_access(user_id, "categories", None).await.allowed);
        assert!(!evaluator.check_feature_access(user_id, "ai_summary", None).await.allowed);
        assert!(
            evaluator
                .check_feature_access(user_id, "videos", Some(Uuid::new_v4()))
                .await
                .allowed
        );
        assert!(evaluator.check_feature_access(user_id, "screenshots", None).await.allowed);
        assert!(evaluator.check_feature_access(user_id, "storage", None).await.allowed);
    }

    #[tokio::test]
    async fn fetch_failure_fails_closed() {
        let source = FakeSource::new(gold_plan(0));
        source.failing.store(true, Ordering::SeqCst);
        let (evaluator, _) = build(source);
        let user_id = Uuid::new_v4();

        for check in [
            evaluator.check_category_creation(user_id).await,
            evaluator.check_video_addition(user_id, Uuid::new_v4()).await,
            evaluator.check_ai_summary_access(user_id).await,
            evaluator.check_screenshot_upload(user_id).await,
            evaluator.check_storage(user_id, 1).await,
        ] {
            assert_eq!(check, SubscriptionCheck::denied(LIMITS_UNAVAILABLE));
        }
        assert!(evaluator.cache().is_empty());
    }

    #[tokio::test]
    async fn screenshot_ceiling_is_enforced() {
        let mut source = FakeSource::new(free_plan(0));
        source.screenshots = 5;
        let (evaluator, _) = build(source);

        let check = evaluator.check_screenshot_upload(Uuid::new_v4()).await;
        assert!(!check.allowed);
        assert_eq!((check.current_usage, check.limit), (Some(5), Some(5)));
    }

    #[tokio::test]
    async fn storage_check_respects_remaining_bytes() {
        let mut source = FakeSource::new(free_plan(0));
        source.storage_used = 900;
        let (evaluator, _) = build(source);
        let user_id = Uuid::new_v4();

        assert!(evaluator.check_storage(user_id, 100).await.allowed);
        let check = evaluator.check_storage(user_id, 101).await;
        assert!(!check.allowed);
        assert_eq!((check.current_usage, check.limit), (Some(900), Some(1_000)));

        let mut full = FakeSource::new(free_plan(0));
        full.storage_used = 1_000;
        let (evaluator, _) = build(full);
        assert!(!evaluator.check_storage(user_id, 0).await.allowed);
    }

    #[tokio::test]
    async fn repeated_checks_reuse_cached_limits() {
        let (evaluator, source) = build(FakeSource::new(free_plan(1)));
        let user_id = Uuid::new_v4();

        evaluator.check_category_creation(user_id).await;
        evaluator.check_ai_summary_access(user_id).await;
        evaluator.check_category_creation(user_id).await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denial_serializes_camel_case_and_omits_empty_fields() {
        let json = serde_json::to_value(SubscriptionCheck::over_limit("full", 3, 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "allowed": false, "reason": "full", "currentUsage": 3, "limit": 3 })
        );
        let json = serde_json::to_value(SubscriptionCheck::allowed()).unwrap();
        assert_eq!(json, serde_json::json!({ "allowed": true }));
    }
}
