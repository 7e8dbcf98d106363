/// reservations - book, use and cancel prepaid reserved spots
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use parking_settlement_rs::{
    EventStore, ExitProcessor, ExitRequest, LicensePlate, MemoryFineStore, MemoryPaymentLog,
    MemoryReservationStore, MemorySpotCatalog, Money, NoRefundAcknowledgement, ParkingPolicy,
    ParkingSpot, PaymentMethod, ReservationManager, SafeTimeProvider, SpotId, SpotType, TimeSource,
    Vehicle, VehicleType,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    println!("=== reservations example ===\n");

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let time = SafeTimeProvider::new(TimeSource::Test(start));
    let controller = time.test_control().unwrap();
    let mut events = EventStore::new();

    let spots = Arc::new(MemorySpotCatalog::with_spots(vec![
        ParkingSpot::new("F3-V01", SpotType::Reserved, Money::from_major(8)),
        ParkingSpot::new("F3-V02", SpotType::Reserved, Money::from_major(8)),
    ]));
    let reservations = Arc::new(ReservationManager::new(
        Arc::new(MemoryReservationStore::new()),
        spots.clone(),
    ));
    let exits = ExitProcessor::new(
        &ParkingPolicy::standard(),
        Arc::new(MemoryFineStore::new()),
        spots,
        Arc::new(MemoryPaymentLog::new()),
        reservations.clone(),
    )?;

    let holder = LicensePlate::parse("RSV-100")?;
    let window_start = start + Duration::hours(1);
    let window_end = window_start + Duration::hours(4);

    // book 4 hours on F3-V01
    let booking = reservations.create_reservation(
        &holder,
        &SpotId::from("F3-V01"),
        window_start,
        window_end,
        &time,
        &mut events,
    )?;
    println!("booked {} for {} hours, prepaid {}", booking.spot_id(), booking.hours(), booking.prepaid_amount().to_rm_string());

    // a second booking for the same window is rejected
    let clash = reservations.create_reservation(
        &LicensePlate::parse("RSV-200")?,
        &SpotId::from("F3-V01"),
        window_start + Duration::hours(2),
        window_end + Duration::hours(2),
        &time,
        &mut events,
    );
    if let Err(err) = clash {
        println!("second booking rejected: {}", err);
    }

    // the holder arrives inside the window and leaves 3 hours later
    controller.advance(Duration::hours(1) + Duration::minutes(10));
    let vehicle = Vehicle::arrive(holder.clone(), VehicleType::Car, false, time.now());
    controller.advance(Duration::hours(3));

    let outcome = exits.process_exit(
        ExitRequest {
            vehicle,
            spot_id: SpotId::from("F3-V01"),
            amount_paid: Money::ZERO,
            method: PaymentMethod::Card,
            live_elapsed_hours: None,
        },
        &time,
    )?;
    println!("\n{}\n", outcome.receipt);

    // book and cancel another spot; the prepaid amount is forfeited
    let spare = reservations.create_reservation(
        &holder,
        &SpotId::from("F3-V02"),
        time.now() + Duration::hours(2),
        time.now() + Duration::hours(3),
        &time,
        &mut events,
    )?;
    reservations.cancel_reservation(spare.id(), NoRefundAcknowledgement::Accepted, &time, &mut events)?;
    println!("cancelled {}, forfeited {}", spare.id(), spare.prepaid_amount().to_rm_string());

    println!("\nevents recorded: {}", events.events().len());

    Ok(())
}
