//! Property-based tests for fees, fines and settlement arithmetic.

use chrono::{Duration, TimeZone, Utc};
use parking_settlement_rs::config::FineStrategyKind;
use parking_settlement_rs::payments::{change_amount, remaining_balance, validate_payment};
use parking_settlement_rs::vehicle::whole_hours_ceil;
use parking_settlement_rs::{
    FeeCalculator, FineManager, LicensePlate, Money, ParkingPolicy, ParkingSpot, PaymentMethod,
    Receipt, SafeTimeProvider, SpotType, TimeSource, Vehicle, VehicleType,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn arb_money() -> impl Strategy<Value = Money> {
    (0i64..=5_000_000i64).prop_map(Money::from_sen)
}

fn arb_spot_type() -> impl Strategy<Value = SpotType> {
    prop_oneof![
        Just(SpotType::Regular),
        Just(SpotType::Compact),
        Just(SpotType::Handicapped),
        Just(SpotType::Reserved),
    ]
}

fn arb_strategy_kind() -> impl Strategy<Value = FineStrategyKind> {
    prop_oneof![
        Just(FineStrategyKind::Fixed),
        Just(FineStrategyKind::Progressive),
        Just(FineStrategyKind::Hourly),
    ]
}

fn vehicle(handicapped: bool) -> Vehicle {
    Vehicle::arrive(
        LicensePlate::parse("PROP-1").unwrap(),
        VehicleType::Car,
        handicapped,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// fee is hours times the concession rate or the posted rate
    #[test]
    fn fee_is_hours_times_resolved_rate(
        hours in 0u32..500,
        rate_sen in 0i64..10_000,
        spot_type in arb_spot_type(),
        handicapped in any::<bool>(),
    ) {
        let policy = ParkingPolicy::standard();
        let calculator = FeeCalculator::new(&policy.rate_config);
        let rate = Money::from_sen(rate_sen);
        let spot = ParkingSpot::new("P-1", spot_type, rate);

        let fee = calculator
            .calculate_parking_fee(&vehicle(handicapped), &spot, Decimal::from(hours))
            .unwrap();

        let expected_rate = if handicapped && spot_type == SpotType::Handicapped {
            Money::from_major(2)
        } else {
            rate
        };
        prop_assert_eq!(fee, expected_rate * Decimal::from(hours));
    }

    /// overstay fine fires only past the threshold and uses the excess hours
    #[test]
    fn overstay_fine_matches_strategy(
        minutes in 0i64..(24 * 60 * 10),
        kind in arb_strategy_kind(),
    ) {
        let policy = ParkingPolicy::with_strategy(kind);
        let strategy = policy.initial_strategy();
        let manager = FineManager::new(policy.overstay_config.clone());

        let mut v = vehicle(false);
        let entry = v.entry_time.unwrap();
        let exit = entry + Duration::minutes(minutes);
        v.record_exit(exit);

        let hours = whole_hours_ceil(Duration::minutes(minutes));
        let fine = manager.check_overstay(&v, None, &strategy, exit);

        if hours <= Decimal::from(24) {
            prop_assert!(fine.is_none());
        } else {
            let fine = fine.unwrap();
            prop_assert_eq!(fine.amount(), strategy.amount_for(hours - Decimal::from(24)));
        }
    }

    /// remaining balance and change are never both positive
    #[test]
    fn balance_and_change_are_exclusive(paid in arb_money(), total in arb_money()) {
        let remaining = remaining_balance(paid, total);
        let change = change_amount(paid, total);

        prop_assert!(!(remaining.is_positive() && change.is_positive()));
        prop_assert_eq!(remaining, (total - paid).max(Money::ZERO));
        prop_assert_eq!(change, (paid - total).max(Money::ZERO));
        prop_assert_eq!(validate_payment(paid, total), remaining.is_zero());
    }

    /// building the same receipt twice yields the same totals
    #[test]
    fn receipt_totals_are_idempotent(
        fee in arb_money(),
        fines in arb_money(),
        paid in arb_money(),
        later in 1i64..10_000,
    ) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let time = SafeTimeProvider::new(TimeSource::Test(start));
        let builder = Receipt::builder(LicensePlate::parse("PROP-2").unwrap())
            .parking_fee(fee)
            .fine_amount(fines)
            .amount_paid(paid)
            .method(PaymentMethod::Card);

        let first = builder.clone().build(&time);
        time.test_control().unwrap().advance(Duration::seconds(later));
        let second = builder.build(&time);

        prop_assert_eq!(first.total_amount, fee + fines);
        prop_assert_eq!(first.total_amount, second.total_amount);
        prop_assert_eq!(first.remaining_balance, second.remaining_balance);
        prop_assert_eq!(first.change_amount, second.change_amount);
    }

    /// progressive fines never decrease as the overstay grows
    #[test]
    fn progressive_fine_is_monotonic(a in 0u32..200, b in 0u32..200) {
        let strategy = ParkingPolicy::with_strategy(FineStrategyKind::Progressive).initial_strategy();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(
            strategy.amount_for(Decimal::from(low)) <= strategy.amount_for(Decimal::from(high))
        );
    }

    /// billable hours cover the whole stay and overshoot by less than an hour
    #[test]
    fn billable_hours_round_up(seconds in 0i64..(3600 * 24 * 30)) {
        let hours = whole_hours_ceil(Duration::seconds(seconds));
        let billed_seconds = hours * Decimal::from(3600);

        prop_assert!(billed_seconds >= Decimal::from(seconds));
        prop_assert!(billed_seconds - Decimal::from(seconds) < Decimal::from(3600));
    }
}
