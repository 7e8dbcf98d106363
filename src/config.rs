use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::fines::{FineStrategy, ProgressiveTier};

/// facility-wide parking policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingPolicy {
    pub rate_config: RateConfig,
    pub grace_config: GraceConfig,
    pub overstay_config: OverstayConfig,
    pub fine_schedule: FineSchedule,
    /// strategy selected at startup, changeable later through `ActiveFineStrategy`
    pub default_strategy: FineStrategyKind,
}

/// rate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// flat hourly rate for handicapped vehicles parked in handicapped spots
    pub handicapped_hourly_rate: Money,
}

/// grace period configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraceConfig {
    /// stays up to and including this many minutes pay no parking fee
    pub grace_period_minutes: i64,
}

/// overstay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverstayConfig {
    /// stays strictly longer than this are fined
    pub threshold_hours: Decimal,
    /// hours charged for unauthorized use of a reserved spot
    pub unauthorized_reserved_hours: Decimal,
}

/// amounts used by the three fine strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineSchedule {
    pub fixed_amount: Money,
    pub hourly_amount: Money,
    pub progressive_tiers: Vec<ProgressiveTier>,
}

/// strategy selector as stored in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineStrategyKind {
    Fixed,
    Progressive,
    Hourly,
}

impl FineSchedule {
    /// RM50 flat, RM20 per hour, RM50/100/150/200 by day of overstay
    pub fn standard() -> Self {
        Self {
            fixed_amount: Money::from_major(50),
            hourly_amount: Money::from_major(20),
            progressive_tiers: vec![
                ProgressiveTier::up_to(dec!(24), Money::from_major(50)),
                ProgressiveTier::up_to(dec!(48), Money::from_major(100)),
                ProgressiveTier::up_to(dec!(72), Money::from_major(150)),
                ProgressiveTier::beyond(Money::from_major(200)),
            ],
        }
    }

    /// build the strategy for a configured kind
    pub fn strategy(&self, kind: FineStrategyKind) -> FineStrategy {
        match kind {
            FineStrategyKind::Fixed => FineStrategy::Fixed {
                amount: self.fixed_amount,
            },
            FineStrategyKind::Progressive => FineStrategy::Progressive {
                tiers: self.progressive_tiers.clone(),
            },
            FineStrategyKind::Hourly => FineStrategy::Hourly {
                rate_per_hour: self.hourly_amount,
            },
        }
    }
}

impl ParkingPolicy {
    /// standard facility policy
    pub fn standard() -> Self {
        Self {
            rate_config: RateConfig {
                handicapped_hourly_rate: Money::from_major(2),
            },
            grace_config: GraceConfig {
                grace_period_minutes: 15,
            },
            overstay_config: OverstayConfig {
                threshold_hours: dec!(24),
                unauthorized_reserved_hours: dec!(1),
            },
            fine_schedule: FineSchedule::standard(),
            default_strategy: FineStrategyKind::Fixed,
        }
    }

    /// standard policy with a different starting fine strategy
    pub fn with_strategy(kind: FineStrategyKind) -> Self {
        Self {
            default_strategy: kind,
            ..Self::standard()
        }
    }

    /// strategy selected by this policy at startup
    pub fn initial_strategy(&self) -> FineStrategy {
        self.fine_schedule.strategy(self.default_strategy)
    }

    /// reject negative amounts and unordered tiers
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(ParkingError::InvalidConfiguration {
                message: message.to_string(),
            })
        };

        if self.rate_config.handicapped_hourly_rate.is_negative() {
            return invalid("handicapped hourly rate is negative");
        }
        if self.grace_config.grace_period_minutes < 0 {
            return invalid("grace period is negative");
        }
        if self.overstay_config.threshold_hours.is_sign_negative() {
            return invalid("overstay threshold is negative");
        }
        if self.overstay_config.unauthorized_reserved_hours <= Decimal::ZERO {
            return invalid("unauthorized reserved hours must be positive");
        }
        if self.fine_schedule.fixed_amount.is_negative()
            || self.fine_schedule.hourly_amount.is_negative()
        {
            return invalid("fine amount is negative");
        }

        FineStrategy::Progressive {
            tiers: self.fine_schedule.progressive_tiers.clone(),
        }
        .validate()
    }

    /// parse and validate a JSON policy document
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: ParkingPolicy =
            serde_json::from_str(json).map_err(|e| ParkingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        policy.validate()?;
        Ok(policy)
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ParkingPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_policy_is_valid() {
        let policy = ParkingPolicy::standard();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.rate_config.handicapped_hourly_rate, Money::from_major(2));
        assert_eq!(policy.grace_config.grace_period_minutes, 15);
        assert_eq!(policy.overstay_config.threshold_hours, dec!(24));
        assert_eq!(
            policy.initial_strategy(),
            FineStrategy::Fixed { amount: Money::from_major(50) }
        );
    }

    #[test]
    fn test_json_round_trip() {
        let policy = ParkingPolicy::with_strategy(FineStrategyKind::Hourly);
        let json = policy.to_json_pretty().unwrap();
        let loaded = ParkingPolicy::from_json(&json).unwrap();

        assert_eq!(loaded, policy);
        assert_eq!(
            loaded.initial_strategy(),
            FineStrategy::Hourly { rate_per_hour: Money::from_major(20) }
        );
    }

    #[test]
    fn test_rejects_negative_values() {
        let mut policy = ParkingPolicy::standard();
        policy.grace_config.grace_period_minutes = -1;
        assert!(matches!(
            policy.validate(),
            Err(ParkingError::InvalidConfiguration { .. })
        ));

        let mut policy = ParkingPolicy::standard();
        policy.fine_schedule.fixed_amount = Money::ZERO - Money::ONE;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            ParkingPolicy::from_json("{\"rate_config\": 3}"),
            Err(ParkingError::InvalidConfiguration { .. })
        ));
    }
}
