use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_settlement_rs::{
    EventStore, ExitProcessor, ExitRequest, FeeCalculator, FeeExemption, FineManager, FineStore,
    FineStrategy, LicensePlate, MemoryFineStore, MemoryPaymentLog, MemoryReservationStore,
    MemorySpotCatalog, Money, NoRefundAcknowledgement, ParkingError, ParkingPolicy, ParkingSpot,
    PaymentLog, PaymentMethod, ReservationManager, ReservationStatus, ReservationStore,
    SafeTimeProvider, SpotId, SpotType, TimeSource, Vehicle, VehicleType,
};
use rust_decimal_macros::dec;

fn entry() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 7, 30, 0).unwrap()
}

fn plate(raw: &str) -> LicensePlate {
    LicensePlate::parse(raw).unwrap()
}

struct Facility {
    exits: ExitProcessor,
    fines: Arc<MemoryFineStore>,
    payments: Arc<MemoryPaymentLog>,
    reservation_store: Arc<MemoryReservationStore>,
    reservations: Arc<ReservationManager>,
}

fn facility(policy: ParkingPolicy) -> Facility {
    let fines = Arc::new(MemoryFineStore::new());
    let payments = Arc::new(MemoryPaymentLog::new());
    let reservation_store = Arc::new(MemoryReservationStore::new());
    let spots = Arc::new(MemorySpotCatalog::with_spots(vec![
        ParkingSpot::new("L1-R05", SpotType::Regular, Money::from_major(5)),
        ParkingSpot::new("L1-C02", SpotType::Compact, Money::from_major(3)),
        ParkingSpot::new("L1-H01", SpotType::Handicapped, Money::from_major(5)),
        ParkingSpot::new("L2-V01", SpotType::Reserved, Money::from_major(8)),
    ]));
    let reservations = Arc::new(ReservationManager::new(reservation_store.clone(), spots.clone()));
    let exits = ExitProcessor::new(&policy, fines.clone(), spots, payments.clone(), reservations.clone()).unwrap();

    Facility {
        exits,
        fines,
        payments,
        reservation_store,
        reservations,
    }
}

fn exit(raw_plate: &str, spot: &str, paid: Money, method: PaymentMethod) -> ExitRequest {
    ExitRequest {
        vehicle: Vehicle::arrive(plate(raw_plate), VehicleType::Car, false, entry()),
        spot_id: SpotId::from(spot),
        amount_paid: paid,
        method,
        live_elapsed_hours: None,
    }
}

fn at(offset: Duration) -> SafeTimeProvider {
    SafeTimeProvider::new(TimeSource::Test(entry() + offset))
}

#[test]
fn scenario_a_regular_three_hours() {
    let calculator = FeeCalculator::new(&ParkingPolicy::standard().rate_config);
    let vehicle = Vehicle::arrive(plate("AAA-111"), VehicleType::Car, false, entry());
    let spot = ParkingSpot::new("L1-R05", SpotType::Regular, Money::from_major(5));

    let fee = calculator.calculate_parking_fee(&vehicle, &spot, dec!(3)).unwrap();
    assert_eq!(fee.to_rm_string(), "RM 15.00");
}

#[test]
fn scenario_b_handicapped_concession() {
    let calculator = FeeCalculator::new(&ParkingPolicy::standard().rate_config);
    let vehicle = Vehicle::arrive(plate("HCP-2"), VehicleType::Van, true, entry());
    let spot = ParkingSpot::new("L1-H01", SpotType::Handicapped, Money::from_major(5));

    let fee = calculator.calculate_parking_fee(&vehicle, &spot, dec!(5)).unwrap();
    assert_eq!(fee, Money::from_major(10));
}

#[test]
fn scenario_c_thirty_hour_stay_fixed_fine() {
    let f = facility(ParkingPolicy::standard());
    let outcome = f
        .exits
        .process_exit(exit("CCC-30", "L1-C02", Money::from_major(140), PaymentMethod::Card), &at(Duration::hours(30)))
        .unwrap();

    assert_eq!(outcome.fee.fee, Money::from_major(90));
    assert_eq!(outcome.receipt.fine_amount.to_rm_string(), "RM 50.00");
    assert_eq!(outcome.receipt.total_amount, Money::from_major(140));
}

#[test]
fn scenario_d_hourly_overstay() {
    let policy = ParkingPolicy::standard();
    let manager = FineManager::new(policy.overstay_config.clone());
    let strategy = FineStrategy::Hourly {
        rate_per_hour: Money::from_major(20),
    };
    let mut vehicle = Vehicle::arrive(plate("DDD-27"), VehicleType::Truck, false, entry());
    vehicle.record_exit(entry() + Duration::hours(27));

    let fine = manager
        .check_overstay(&vehicle, None, &strategy, entry() + Duration::hours(27))
        .unwrap();
    assert_eq!(fine.amount(), Money::from_major(60));
}

#[test]
fn scenario_e_underpayment_carried_forward() {
    let f = facility(ParkingPolicy::standard());
    // 3h at RM5 plus an old RM20 fine
    let old = parking_settlement_rs::Fine::new(
        plate("EEE-35"),
        parking_settlement_rs::FineType::UnauthorizedReserved,
        Money::from_major(20),
        entry() - Duration::days(3),
    )
    .unwrap();
    f.fines.save(old).unwrap();

    let outcome = f
        .exits
        .process_exit(exit("EEE-35", "L1-R05", Money::from_major(20), PaymentMethod::Cash), &at(Duration::hours(3)))
        .unwrap();

    assert_eq!(outcome.receipt.total_amount, Money::from_major(35));
    assert_eq!(outcome.receipt.remaining_balance, Money::from_major(15));
    assert_eq!(outcome.receipt.change_amount, Money::ZERO);

    let unpaid = f.fines.find_unpaid_by_plate(&plate("EEE-35")).unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].amount(), Money::from_major(15));
    assert_eq!(Some(unpaid[0].id()), outcome.settlement.shortfall_fine);
    assert_eq!(f.payments.find_by_plate(&plate("EEE-35")).unwrap().len(), 1);
}

#[test]
fn scenario_f_grace_period_either_method() {
    for method in [PaymentMethod::Cash, PaymentMethod::Card] {
        let f = facility(ParkingPolicy::standard());
        let outcome = f
            .exits
            .process_exit(exit("FFF-10", "L1-R05", Money::ZERO, method), &at(Duration::minutes(10)))
            .unwrap();

        assert_eq!(outcome.settlement.exemption, Some(FeeExemption::GracePeriod));
        assert_eq!(outcome.receipt.parking_fee, Money::ZERO);
        assert_eq!(outcome.receipt.remaining_balance, Money::ZERO);
        assert!(f.fines.find_all_unpaid().unwrap().is_empty());
    }
}

#[test]
fn overlapping_reservation_rejected_without_second_record() {
    let f = facility(ParkingPolicy::standard());
    let booking = at(-Duration::hours(2));
    let mut events = EventStore::new();
    let spot = SpotId::from("L2-V01");

    let first = f
        .reservations
        .create_reservation(&plate("RSV-1"), &spot, entry(), entry() + Duration::hours(3), &booking, &mut events)
        .unwrap();
    assert_eq!(first.prepaid_amount(), Money::from_major(24));

    let second = f.reservations.create_reservation(
        &plate("RSV-2"),
        &spot,
        entry() + Duration::hours(1),
        entry() + Duration::hours(5),
        &booking,
        &mut events,
    );
    assert!(matches!(second, Err(ParkingError::ReservationOverlap { .. })));
    assert_eq!(f.reservation_store.find_all().unwrap().len(), 1);

    let cancelled = f
        .reservations
        .cancel_reservation(first.id(), NoRefundAcknowledgement::Accepted, &booking, &mut events)
        .unwrap();
    assert_eq!(cancelled.status_at(booking.now()), ReservationStatus::Cancelled);
    assert!(f
        .reservations
        .is_spot_available(&spot, entry(), entry() + Duration::hours(3))
        .unwrap());
}

#[test]
fn reserved_spot_used_after_reservation_lapsed_is_fined() {
    let f = facility(ParkingPolicy::standard());
    let booking = at(-Duration::hours(6));
    let mut events = EventStore::new();
    f.reservations
        .create_reservation(
            &plate("LATE-1"),
            &SpotId::from("L2-V01"),
            entry() - Duration::hours(5),
            entry() - Duration::hours(1),
            &booking,
            &mut events,
        )
        .unwrap();

    let outcome = f
        .exits
        .process_exit(exit("LATE-1", "L2-V01", Money::from_major(66), PaymentMethod::Card), &at(Duration::hours(2)))
        .unwrap();

    assert_eq!(outcome.settlement.exemption, None);
    assert_eq!(outcome.receipt.fine_amount, Money::from_major(50));
    assert_eq!(outcome.new_fines.len(), 1);
}
