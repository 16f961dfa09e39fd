use db::models::plan::PlanLimitsRow;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const BYTES_PER_MB: i64 = 1024 * 1024;

/// A plan ceiling. The database uses `-1` for some columns and `NULL` for
/// others to mean "no ceiling"; both are folded into `Unlimited` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    Limited(i64),
}

impl Limit {
    /// Negative values are the unlimited sentinel.
    pub fn from_sentinel(value: i64) -> Self {
        if value < 0 {
            Limit::Unlimited
        } else {
            Limit::Limited(value)
        }
    }

    pub fn from_nullable(value: Option<i64>) -> Self {
        value.map_or(Limit::Unlimited, Limit::from_sentinel)
    }

    /// Storage quotas are stored in MB; the rest of the crate counts bytes.
    pub fn from_megabytes(value: Option<i64>) -> Self {
        match Limit::from_nullable(value) {
            Limit::Limited(mb) => Limit::Limited(mb.saturating_mul(BYTES_PER_MB)),
            Limit::Unlimited => Limit::Unlimited,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            Limit::Unlimited => None,
            Limit::Limited(max) => Some(*max),
        }
    }

    /// Whether one more item fits on top of `current`.
    pub fn allows(&self, current: i64) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Limited(max) => current < *max,
        }
    }

    /// What is left before the ceiling, never negative.
    pub fn remaining(&self, current: i64) -> Option<i64> {
        self.value().map(|max| (max - current).max(0))
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Unlimited => serializer.serialize_none(),
            Limit::Limited(max) => serializer.serialize_i64(*max),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<i64>::deserialize(deserializer).map(Limit::from_nullable)
    }
}

/// Plan ceilings of one user plus the usage snapshot taken with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPlanLimits {
    pub plan_name: String,
    pub max_categories: Limit,
    pub max_videos_per_category: Limit,
    pub max_screenshots_per_user: Limit,
    pub storage_quota_bytes: Limit,
    pub ai_summary_enabled: bool,
    pub current_categories: i64,
}

impl From<PlanLimitsRow> for UserPlanLimits {
    fn from(row: PlanLimitsRow) -> Self {
        Self {
            plan_name: row.plan_name,
            max_categories: Limit::from_sentinel(row.max_categories.into()),
            max_videos_per_category: Limit::from_sentinel(row.max_videos_per_category.into()),
            max_screenshots_per_user: Limit::from_nullable(
                row.max_screenshots_per_user.map(i64::from),
            ),
            storage_quota_bytes: Limit::from_megabytes(row.storage_quota_mb),
            ai_summary_enabled: row.ai_summary_enabled,
            current_categories: row.current_categories,
        }
    }
}

/// Storage usage against the plan quota, in the shape the clients render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageQuota {
    pub quota_bytes: Option<i64>,
    pub used_bytes: i64,
    pub remaining_bytes: Option<i64>,
    pub quota_mb: Option<i64>,
    pub used_mb: i64,
    pub remaining_mb: Option<i64>,
    pub percentage: Option<f64>,
    pub is_unlimited: bool,
}

impl StorageQuota {
    pub fn new(quota: Limit, used_bytes: i64) -> Self {
        let quota_bytes = quota.value();
        let remaining_bytes = quota.remaining(used_bytes);
        Self {
            quota_bytes,
            used_bytes,
            remaining_bytes,
            quota_mb: quota_bytes.map(to_mb),
            used_mb: to_mb(used_bytes),
            remaining_mb: remaining_bytes.map(to_mb),
            percentage: quota_bytes.map(|q| {
                if q == 0 {
                    100.0
                } else {
                    used_bytes as f64 / q as f64 * 100.0
                }
            }),
            is_unlimited: quota.is_unlimited(),
        }
    }
}

fn to_mb(bytes: i64) -> i64 {
    (bytes as f64 / BYTES_PER_MB as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_fold_into_unlimited() {
        assert_eq!(Limit::from_sentinel(-1), Limit::Unlimited);
        assert_eq!(Limit::from_sentinel(0), Limit::Limited(0));
        assert_eq!(Limit::from_nullable(None), Limit::Unlimited);
        assert_eq!(Limit::from_nullable(Some(-1)), Limit::Unlimited);
        assert_eq!(Limit::from_nullable(Some(5)), Limit::Limited(5));
    }

    #[test]
    fn limited_allows_strictly_below_ceiling() {
        let limit = Limit::Limited(3);
        assert!(limit.allows(2));
        assert!(!limit.allows(3));
        assert!(!limit.allows(4));
        assert!(Limit::Unlimited.allows(i64::MAX));
    }

    #[test]
    fn unlimited_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Limit::Unlimited).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Limit::Limited(10)).unwrap(), "10");
        let parsed: Limit = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Limit::Unlimited);
    }

    #[test]
    fn row_conversion_handles_both_unlimited_conventions() {
        let limits = UserPlanLimits::from(PlanLimitsRow {
            plan_name: "Gold Plan".to_string(),
            max_categories: -1,
            max_videos_per_category: -1,
            max_screenshots_per_user: None,
            storage_quota_mb: None,
            ai_summary_enabled: true,
            current_categories: 42,
        });
        assert!(limits.max_categories.is_unlimited());
        assert!(limits.max_videos_per_category.is_unlimited());
        assert!(limits.max_screenshots_per_user.is_unlimited());
        assert!(limits.storage_quota_bytes.is_unlimited());

        let limits = UserPlanLimits::from(PlanLimitsRow {
            plan_name: "Free Plan".to_string(),
            max_categories: 3,
            max_videos_per_category: 10,
            max_screenshots_per_user: Some(5),
            storage_quota_mb: Some(100),
            ai_summary_enabled: false,
            current_categories: 1,
        });
        assert_eq!(limits.storage_quota_bytes, Limit::Limited(100 * BYTES_PER_MB));
        assert_eq!(limits.max_screenshots_per_user, Limit::Limited(5));
    }

    #[test]
    fn storage_quota_reports_remaining_and_percentage() {
        let quota = StorageQuota::new(Limit::Limited(100 * BYTES_PER_MB), 25 * BYTES_PER_MB);
        assert_eq!(quota.quota_mb, Some(100));
        assert_eq!(quota.used_mb, 25);
        assert_eq!(quota.remaining_mb, Some(75));
        assert_eq!(quota.percentage, Some(25.0));
        assert!(!quota.is_unlimited);

        let over = StorageQuota::new(Limit::Limited(BYTES_PER_MB), 2 * BYTES_PER_MB);
        assert_eq!(over.remaining_bytes, Some(0));

        let unlimited = StorageQuota::new(Limit::Unlimited, 10);
        assert!(unlimited.is_unlimited);
        assert_eq!(unlimited.percentage, None);
        assert_eq!(unlimited.remaining_bytes, None);
    }
}
