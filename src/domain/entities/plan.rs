//! Subscription plan policy and link owners.
//!
//! Plan bookkeeping (billing, upgrades) lives outside this service; callers
//! state the owner's current plan and this module turns it into quotas and
//! expiration dates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier of a link owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Monthly,
    Yearly,
    Lifetime,
}

impl SubscriptionPlan {
    /// Maximum number of links the owner may hold; `None` means unlimited.
    pub fn link_limit(self) -> Option<i64> {
        match self {
            Self::Free => Some(10),
            Self::Monthly => Some(1_000),
            Self::Yearly => Some(10_000),
            Self::Lifetime => None,
        }
    }

    /// How long links created under this plan stay resolvable.
    pub fn retention(self) -> Option<Duration> {
        match self {
            Self::Free => Some(Duration::days(30)),
            Self::Monthly => Some(Duration::days(365)),
            Self::Yearly | Self::Lifetime => None,
        }
    }

    /// Expiration timestamp for a link created at `created_at`.
    pub fn expiration_from(self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.retention().map(|r| created_at + r)
    }

    /// Custom short codes are an upgraded-plan feature.
    pub fn allows_custom_codes(self) -> bool {
        self != Self::Free
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Lifetime => "lifetime",
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown subscription plan '{0}'")]
pub struct UnknownPlan(pub String);

impl FromStr for SubscriptionPlan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "lifetime" => Ok(Self::Lifetime),
            _ => Err(UnknownPlan(s.to_string())),
        }
    }
}

/// The account a link is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub id: i64,
    pub plan: SubscriptionPlan,
}

impl Owner {
    pub fn new(id: i64, plan: SubscriptionPlan) -> Self {
        Self { id, plan }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_plan_policy() {
        let plan = SubscriptionPlan::Free;

        assert_eq!(plan.link_limit(), Some(10));
        assert_eq!(plan.retention(), Some(Duration::days(30)));
        assert!(!plan.allows_custom_codes());
    }

    #[test]
    fn test_unlimited_retention_plans() {
        let now = Utc::now();

        assert!(SubscriptionPlan::Yearly.expiration_from(now).is_none());
        assert!(SubscriptionPlan::Lifetime.expiration_from(now).is_none());
        assert_eq!(
            SubscriptionPlan::Monthly.expiration_from(now),
            Some(now + Duration::days(365))
        );
    }

    #[test]
    fn test_lifetime_has_no_link_limit() {
        assert!(SubscriptionPlan::Lifetime.link_limit().is_none());
        assert!(SubscriptionPlan::Lifetime.allows_custom_codes());
    }

    #[test]
    fn test_parse_plan() {
        assert_eq!(
            "Monthly".parse::<SubscriptionPlan>().unwrap(),
            SubscriptionPlan::Monthly
        );
        assert_eq!(
            " lifetime ".parse::<SubscriptionPlan>().unwrap(),
            SubscriptionPlan::Lifetime
        );
        assert!("gold".parse::<SubscriptionPlan>().is_err());
    }

    #[test]
    fn test_plan_display_round_trips() {
        for plan in [
            SubscriptionPlan::Free,
            SubscriptionPlan::Monthly,
            SubscriptionPlan::Yearly,
            SubscriptionPlan::Lifetime,
        ] {
            assert_eq!(plan.to_string().parse::<SubscriptionPlan>().unwrap(), plan);
        }
    }
}
