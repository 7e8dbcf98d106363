/// quick exit - one car through the exit lane
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use parking_settlement_rs::{
    ExitProcessor, ExitRequest, MemoryFineStore, MemoryPaymentLog, MemoryReservationStore,
    MemorySpotCatalog, Money, ParkingPolicy, ParkingSpot, PaymentMethod, ReservationManager,
    SafeTimeProvider, SpotId, SpotType, TimeSource, LicensePlate, Vehicle, VehicleType,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let entry = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    let time = SafeTimeProvider::new(TimeSource::Test(entry));

    // one regular spot at RM5/hr
    let spots = Arc::new(MemorySpotCatalog::with_spots(vec![ParkingSpot::new(
        "F1-R01",
        SpotType::Regular,
        Money::from_major(5),
    )]));
    let reservations = Arc::new(ReservationManager::new(
        Arc::new(MemoryReservationStore::new()),
        spots.clone(),
    ));
    let exits = ExitProcessor::new(
        &ParkingPolicy::standard(),
        Arc::new(MemoryFineStore::new()),
        spots,
        Arc::new(MemoryPaymentLog::new()),
        reservations,
    )?;

    let vehicle = Vehicle::arrive(LicensePlate::parse("wxy-1234")?, VehicleType::Car, false, entry);

    // park for 2h40m, billed as 3 hours
    time.test_control().unwrap().advance(Duration::minutes(160));

    let outcome = exits.process_exit(
        ExitRequest {
            vehicle,
            spot_id: SpotId::from("F1-R01"),
            amount_paid: Money::from_major(20),
            method: PaymentMethod::Cash,
            live_elapsed_hours: None,
        },
        &time,
    )?;

    println!("{}", outcome.receipt);
    println!("\nchange due: {}", outcome.receipt.change_amount.to_rm_string());

    Ok(())
}
