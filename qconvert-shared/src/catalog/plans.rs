/// Subscription plan catalog
///
/// | tier       | price/month | conversions | files | workflows | storage MB |
/// |------------|-------------|-------------|-------|-----------|------------|
/// | free       | $0          | 10          | 5     | 3         | 100        |
/// | pro        | $29         | 500         | 100   | 50        | 5000       |
/// | enterprise | $99         | unlimited   | unl.  | unl.      | unl.       |
///
/// Limits are reported to clients, never enforced.

use serde::Serialize;

use crate::models::subscription::SubscriptionTier;

/// Sentinel for "no limit"
pub const UNLIMITED: i64 = -1;

/// Per-tier resource limits (`-1` = unlimited)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub conversions: i64,
    pub files: i64,
    pub workflows: i64,
    pub storage_mb: i64,
}

/// One purchasable plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: SubscriptionTier,
    pub name: &'static str,
    /// Monthly price in whole US dollars
    pub price: i64,
    pub currency: &'static str,
    pub interval: &'static str,
    pub limits: PlanLimits,
    pub features: Vec<&'static str>,
}

impl Plan {
    pub fn price_cents(&self) -> i64 {
        self.price * 100
    }

    pub fn is_paid(&self) -> bool {
        self.price > 0
    }
}

/// The immutable plan table
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn builtin() -> Self {
        let plans = vec![
            Plan {
                id: SubscriptionTier::Free,
                name: "Free",
                price: 0,
                currency: "USD",
                interval: "month",
                limits: PlanLimits {
                    conversions: 10,
                    files: 5,
                    workflows: 3,
                    storage_mb: 100,
                },
                features: vec![
                    "10 code conversions per month",
                    "5 data files",
                    "3 workflows",
                    "Community support",
                ],
            },
            Plan {
                id: SubscriptionTier::Pro,
                name: "Pro",
                price: 29,
                currency: "USD",
                interval: "month",
                limits: PlanLimits {
                    conversions: 500,
                    files: 100,
                    workflows: 50,
                    storage_mb: 5000,
                },
                features: vec![
                    "500 code conversions per month",
                    "100 data files",
                    "50 workflows",
                    "Live benchmark access",
                    "Email support",
                ],
            },
            Plan {
                id: SubscriptionTier::Enterprise,
                name: "Enterprise",
                price: 99,
                currency: "USD",
                interval: "month",
                limits: PlanLimits {
                    conversions: UNLIMITED,
                    files: UNLIMITED,
                    workflows: UNLIMITED,
                    storage_mb: UNLIMITED,
                },
                features: vec![
                    "Unlimited code conversions",
                    "Unlimited data files",
                    "Unlimited workflows",
                    "Priority support",
                    "Dedicated account manager",
                ],
            },
        ];

        Self { plans }
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }

    pub fn get(&self, tier: SubscriptionTier) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tier_has_a_plan() {
        let catalog = PlanCatalog::builtin();
        for tier in SubscriptionTier::all() {
            assert!(catalog.get(tier).is_some(), "missing plan for {:?}", tier);
        }
        assert_eq!(catalog.all().len(), 3);
    }

    #[test]
    fn test_plan_table() {
        let catalog = PlanCatalog::builtin();

        let free = catalog.get(SubscriptionTier::Free).unwrap();
        assert_eq!(free.price, 0);
        assert!(!free.is_paid());
        assert_eq!(
            free.limits,
            PlanLimits { conversions: 10, files: 5, workflows: 3, storage_mb: 100 }
        );

        let pro = catalog.get(SubscriptionTier::Pro).unwrap();
        assert_eq!(pro.price_cents(), 2900);
        assert_eq!(
            pro.limits,
            PlanLimits { conversions: 500, files: 100, workflows: 50, storage_mb: 5000 }
        );

        let enterprise = catalog.get(SubscriptionTier::Enterprise).unwrap();
        assert_eq!(enterprise.price, 99);
        assert_eq!(enterprise.limits.conversions, UNLIMITED);
        assert_eq!(enterprise.limits.storage_mb, UNLIMITED);
    }

    #[test]
    fn test_plan_serialization() {
        let catalog = PlanCatalog::builtin();
        let json = serde_json::to_value(catalog.get(SubscriptionTier::Pro).unwrap()).unwrap();

        assert_eq!(json["id"], "pro");
        assert_eq!(json["price"], 29);
        assert_eq!(json["limits"]["storageMb"], 5000);
    }
}
