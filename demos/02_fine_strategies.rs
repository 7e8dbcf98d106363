/// fine strategies - compare strategies and switch the active one
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use parking_settlement_rs::config::FineStrategyKind;
use parking_settlement_rs::{
    Event, ExitProcessor, ExitRequest, LicensePlate, MemoryFineStore, MemoryPaymentLog,
    MemoryReservationStore, MemorySpotCatalog, Money, ParkingPolicy, ParkingSpot, PaymentMethod,
    ReservationManager, SafeTimeProvider, SpotId, SpotType, TimeSource, Vehicle, VehicleType,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("=== fine strategies example ===\n");

    let policy = ParkingPolicy::standard();
    for kind in [FineStrategyKind::Fixed, FineStrategyKind::Progressive, FineStrategyKind::Hourly] {
        let strategy = policy.fine_schedule.strategy(kind);
        println!(
            "{:<12} 3h: {:>10}  30h: {:>10}  80h: {:>10}",
            strategy.name(),
            strategy.amount_for(dec!(3)).to_rm_string(),
            strategy.amount_for(dec!(30)).to_rm_string(),
            strategy.amount_for(dec!(80)).to_rm_string(),
        );
    }

    let entry = Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap();
    let time = SafeTimeProvider::new(TimeSource::Test(entry + Duration::hours(27)));

    let fines = Arc::new(MemoryFineStore::new());
    let spots = Arc::new(MemorySpotCatalog::with_spots(vec![ParkingSpot::new(
        "F1-R09",
        SpotType::Regular,
        Money::from_major(5),
    )]));
    let reservations = Arc::new(ReservationManager::new(
        Arc::new(MemoryReservationStore::new()),
        spots.clone(),
    ));
    let exits = ExitProcessor::new(
        &policy,
        fines,
        spots,
        Arc::new(MemoryPaymentLog::new()),
        reservations,
    )?;

    // administrator switches to hourly fines
    let hourly = policy.fine_schedule.strategy(FineStrategyKind::Hourly);
    let previous = exits.set_fine_strategy(hourly, &time)?;
    println!("\nswitched from {} to {}", previous.name(), exits.strategy().snapshot().name());

    // 27h stay: 3h over the threshold, RM20 each
    let outcome = exits.process_exit(
        ExitRequest {
            vehicle: Vehicle::arrive(LicensePlate::parse("OVR-27")?, VehicleType::Van, false, entry),
            spot_id: SpotId::from("F1-R09"),
            amount_paid: Money::from_major(200),
            method: PaymentMethod::Card,
            live_elapsed_hours: None,
        },
        &time,
    )?;
    println!("\n{}\n", outcome.receipt);

    for event in exits.take_events() {
        if let Event::FineIssued { fine_type, amount, .. } = event {
            println!("fine issued: {:?} {}", fine_type, amount.to_rm_string());
        }
    }

    Ok(())
}
