use hourglass_rs::SafeTimeProvider;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::ParkingPolicy;
use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::events::{Event, EventStore};

/// one step of the progressive schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveTier {
    /// inclusive upper bound on overstay hours, `None` for the open-ended last tier
    pub max_overstay_hours: Option<Decimal>,
    pub amount: Money,
}

impl ProgressiveTier {
    pub fn up_to(max_overstay_hours: Decimal, amount: Money) -> Self {
        Self {
            max_overstay_hours: Some(max_overstay_hours),
            amount,
        }
    }

    pub fn beyond(amount: Money) -> Self {
        Self {
            max_overstay_hours: None,
            amount,
        }
    }

    fn covers(&self, overstay_hours: Decimal) -> bool {
        self.max_overstay_hours
            .map_or(true, |max| overstay_hours <= max)
    }
}

/// turns overstay hours into a fine amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineStrategy {
    /// same amount whatever the overstay
    Fixed { amount: Money },
    /// amount of the first tier whose bound covers the overstay
    Progressive { tiers: Vec<ProgressiveTier> },
    /// rate x overstay hours
    Hourly { rate_per_hour: Money },
}

impl FineStrategy {
    /// fine for the given overstay; zero when there is no overstay
    pub fn amount_for(&self, overstay_hours: Decimal) -> Money {
        if overstay_hours <= Decimal::ZERO {
            return Money::ZERO;
        }

        match self {
            FineStrategy::Fixed { amount } => *amount,
            FineStrategy::Progressive { tiers } => tiers
                .iter()
                .find(|tier| tier.covers(overstay_hours))
                .or_else(|| tiers.last())
                .map_or(Money::ZERO, |tier| tier.amount),
            FineStrategy::Hourly { rate_per_hour } => *rate_per_hour * overstay_hours,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FineStrategy::Fixed { .. } => "fixed",
            FineStrategy::Progressive { .. } => "progressive",
            FineStrategy::Hourly { .. } => "hourly",
        }
    }

    /// amounts non-negative, tiers ascending with only the last open-ended
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(ParkingError::InvalidConfiguration { message });

        match self {
            FineStrategy::Fixed { amount } if amount.is_negative() => {
                invalid(format!("fixed fine is negative: {}", amount))
            }
            FineStrategy::Hourly { rate_per_hour } if rate_per_hour.is_negative() => {
                invalid(format!("hourly fine rate is negative: {}", rate_per_hour))
            }
            FineStrategy::Progressive { tiers } => {
                if tiers.is_empty() {
                    return invalid("progressive schedule has no tiers".to_string());
                }

                let mut previous: Option<Decimal> = None;
                for (index, tier) in tiers.iter().enumerate() {
                    if tier.amount.is_negative() {
                        return invalid(format!("tier {} amount is negative", index + 1));
                    }
                    match tier.max_overstay_hours {
                        None if index + 1 != tiers.len() => {
                            return invalid(format!("tier {} is open-ended but not last", index + 1));
                        }
                        Some(max) if previous.map_or(false, |prev| max <= prev) => {
                            return invalid(format!("tier {} bound is not ascending", index + 1));
                        }
                        _ => {}
                    }
                    previous = tier.max_overstay_hours;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// facility-wide strategy selection shared by every exit lane
///
/// Readers take a snapshot; replacing the strategy only affects fines
/// computed after the swap.
#[derive(Debug, Clone)]
pub struct ActiveFineStrategy {
    current: Arc<RwLock<FineStrategy>>,
}

impl ActiveFineStrategy {
    pub fn new(strategy: FineStrategy) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            current: Arc::new(RwLock::new(strategy)),
        })
    }

    pub fn from_policy(policy: &ParkingPolicy) -> Result<Self> {
        Self::new(policy.initial_strategy())
    }

    /// copy of the strategy in force right now
    pub fn snapshot(&self) -> FineStrategy {
        self.current.read().clone()
    }

    /// administrator change; returns the previous strategy
    pub fn replace(
        &self,
        strategy: FineStrategy,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<FineStrategy> {
        strategy.validate()?;

        let old = {
            let mut current = self.current.write();
            std::mem::replace(&mut *current, strategy.clone())
        };

        info!(from = old.name(), to = strategy.name(), "fine strategy changed");

        events.emit(Event::FineStrategyChanged {
            old_strategy: old.clone(),
            new_strategy: strategy,
            timestamp: time_provider.now(),
        });

        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FineSchedule, FineStrategyKind};
    use chrono::Utc;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn progressive() -> FineStrategy {
        FineSchedule::standard().strategy(FineStrategyKind::Progressive)
    }

    #[test]
    fn test_fixed_is_flat() {
        let strategy = FineStrategy::Fixed { amount: Money::from_major(50) };
        assert_eq!(strategy.amount_for(dec!(1)), Money::from_major(50));
        assert_eq!(strategy.amount_for(dec!(6)), Money::from_major(50));
        assert_eq!(strategy.amount_for(dec!(100)), Money::from_major(50));
    }

    #[test]
    fn test_hourly_scales() {
        let strategy = FineStrategy::Hourly { rate_per_hour: Money::from_major(20) };
        assert_eq!(strategy.amount_for(dec!(3)), Money::from_major(60));
        assert_eq!(strategy.amount_for(dec!(1)), Money::from_major(20));
    }

    #[test]
    fn test_progressive_tiers() {
        let strategy = progressive();
        assert_eq!(strategy.amount_for(dec!(1)), Money::from_major(50));
        assert_eq!(strategy.amount_for(dec!(24)), Money::from_major(50));
        assert_eq!(strategy.amount_for(dec!(25)), Money::from_major(100));
        assert_eq!(strategy.amount_for(dec!(72)), Money::from_major(150));
        assert_eq!(strategy.amount_for(dec!(500)), Money::from_major(200));
    }

    #[test]
    fn test_no_overstay_no_fine() {
        for strategy in [
            FineStrategy::Fixed { amount: Money::from_major(50) },
            FineStrategy::Hourly { rate_per_hour: Money::from_major(20) },
            progressive(),
        ] {
            assert_eq!(strategy.amount_for(dec!(0)), Money::ZERO);
            assert_eq!(strategy.amount_for(dec!(-3)), Money::ZERO);
        }
    }

    #[test]
    fn test_progressive_validation() {
        assert!(progressive().validate().is_ok());

        let open_ended_first = FineStrategy::Progressive {
            tiers: vec![
                ProgressiveTier::beyond(Money::from_major(200)),
                ProgressiveTier::up_to(dec!(24), Money::from_major(50)),
            ],
        };
        assert!(open_ended_first.validate().is_err());

        let descending = FineStrategy::Progressive {
            tiers: vec![
                ProgressiveTier::up_to(dec!(48), Money::from_major(100)),
                ProgressiveTier::up_to(dec!(24), Money::from_major(50)),
            ],
        };
        assert!(descending.validate().is_err());

        assert!(FineStrategy::Progressive { tiers: vec![] }.validate().is_err());
    }

    #[test]
    fn test_replace_strategy() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();
        let active = ActiveFineStrategy::from_policy(&ParkingPolicy::standard()).unwrap();
        let shared = active.clone();

        let before = shared.snapshot();
        let old = active
            .replace(FineStrategy::Hourly { rate_per_hour: Money::from_major(20) }, &time, &mut events)
            .unwrap();

        assert_eq!(old, before);
        assert_eq!(shared.snapshot().name(), "hourly");
        // snapshot taken before the swap keeps the old schedule
        assert_eq!(before.amount_for(dec!(3)), Money::from_major(50));
        assert!(matches!(events.events()[0], Event::FineStrategyChanged { .. }));
    }

    #[test]
    fn test_replace_rejects_invalid_strategy() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();
        let active = ActiveFineStrategy::from_policy(&ParkingPolicy::standard()).unwrap();

        let result = active.replace(FineStrategy::Progressive { tiers: vec![] }, &time, &mut events);
        assert!(result.is_err());
        assert_eq!(active.snapshot().name(), "fixed");
        assert!(events.events().is_empty());
    }
}
