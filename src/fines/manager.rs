use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::OverstayConfig;
use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::events::{Event, EventStore};
use crate::store::FineStore;
use crate::types::{FineId, FineType, LicensePlate, ParkingSpot};
use crate::vehicle::Vehicle;

use super::{Fine, FineStrategy};

/// what the fine checks need to know about one visit
#[derive(Debug, Clone, Copy)]
pub struct VisitContext<'a> {
    pub vehicle: &'a Vehicle,
    pub spot: &'a ParkingSpot,
    /// elapsed hours from a real-time tracker, if one is running
    pub live_elapsed_hours: Option<Decimal>,
    /// the vehicle holds an active reservation covering its use of this spot
    pub authorized_for_spot: bool,
}

/// detects violations and settles fines per license plate
#[derive(Debug, Clone)]
pub struct FineManager {
    config: OverstayConfig,
}

impl FineManager {
    pub fn new(config: OverstayConfig) -> Self {
        Self { config }
    }

    /// overstay fine when the stay exceeds the threshold
    ///
    /// An unknown entry time means the stay cannot be measured, so no fine.
    pub fn check_overstay(
        &self,
        vehicle: &Vehicle,
        live_elapsed_hours: Option<Decimal>,
        strategy: &FineStrategy,
        now: DateTime<Utc>,
    ) -> Option<Fine> {
        let hours_parked = vehicle.hours_parked(live_elapsed_hours, now)?;
        if hours_parked <= self.config.threshold_hours {
            return None;
        }

        let overstay_hours = hours_parked - self.config.threshold_hours;
        let amount = strategy.amount_for(overstay_hours);

        debug!(
            plate = %vehicle.license_plate,
            hours_parked = %hours_parked,
            overstay_hours = %overstay_hours,
            strategy = strategy.name(),
            amount = %amount,
            "overstay detected"
        );

        self.issue(vehicle, FineType::Overstay, amount, now)
    }

    /// flat one-hour-equivalent fine for using a reserved spot without a reservation
    pub fn check_unauthorized_reserved(
        &self,
        vehicle: &Vehicle,
        spot: &ParkingSpot,
        authorized: bool,
        strategy: &FineStrategy,
        now: DateTime<Utc>,
    ) -> Option<Fine> {
        if !spot.is_reserved() || authorized {
            return None;
        }

        let amount = strategy.amount_for(self.config.unauthorized_reserved_hours);

        debug!(
            plate = %vehicle.license_plate,
            spot = %spot.id,
            amount = %amount,
            "unauthorized reserved spot use detected"
        );

        self.issue(vehicle, FineType::UnauthorizedReserved, amount, now)
    }

    /// run both checks independently; returned fines are not yet persisted
    pub fn generate_fines(
        &self,
        visit: &VisitContext<'_>,
        strategy: &FineStrategy,
        time_provider: &SafeTimeProvider,
    ) -> Vec<Fine> {
        let now = time_provider.now();

        let overstay = self.check_overstay(visit.vehicle, visit.live_elapsed_hours, strategy, now);
        let unauthorized = self.check_unauthorized_reserved(
            visit.vehicle,
            visit.spot,
            visit.authorized_for_spot,
            strategy,
            now,
        );

        overstay.into_iter().chain(unauthorized).collect()
    }

    /// persist each fine on its own
    ///
    /// A fine matching an unpaid one already stored for the same visit is not
    /// issued again; the stored id is returned in its place, so a retried exit
    /// never doubles a violation.
    pub fn record_fines(
        &self,
        store: &dyn FineStore,
        fines: Vec<Fine>,
        events: &mut EventStore,
    ) -> Result<Vec<FineId>> {
        let mut ids = Vec::with_capacity(fines.len());

        for fine in fines {
            if let Some(existing) = store
                .find_unpaid_by_plate(fine.license_plate())?
                .into_iter()
                .find(|stored| stored.same_violation(&fine))
            {
                debug!(fine_id = %existing.id(), plate = %fine.license_plate(), "fine already issued for this visit");
                ids.push(existing.id());
                continue;
            }

            let plate = fine.license_plate().clone();
            let fine_type = fine.fine_type();
            let amount = fine.amount();
            let issued_at = fine.issued_at();

            let id = store.save(fine)?;

            info!(fine_id = %id, plate = %plate, fine_type = ?fine_type, amount = %amount, "fine issued");
            events.emit(Event::FineIssued {
                fine_id: id,
                license_plate: plate,
                fine_type,
                amount,
                timestamp: issued_at,
            });
            ids.push(id);
        }

        Ok(ids)
    }

    pub fn unpaid_fines(&self, store: &dyn FineStore, plate: &LicensePlate) -> Result<Vec<Fine>> {
        store.find_unpaid_by_plate(plate)
    }

    /// sum of currently unpaid fines for a plate, read fresh from the store
    pub fn total_unpaid(&self, store: &dyn FineStore, plate: &LicensePlate) -> Result<Money> {
        Ok(super::total_unpaid(&store.find_unpaid_by_plate(plate)?))
    }

    pub fn all_unpaid(&self, store: &dyn FineStore) -> Result<Vec<Fine>> {
        store.find_all_unpaid()
    }

    /// mark every id paid, one at a time
    ///
    /// Ids already marked stay marked when a later one fails; the failures
    /// are reported together as `FineSettlementIncomplete`.
    pub fn mark_fines_paid(&self, store: &dyn FineStore, ids: &[FineId]) -> Result<Vec<FineId>> {
        let mut marked = Vec::with_capacity(ids.len());
        let mut failed = Vec::new();

        for &id in ids {
            match store.mark_paid(id) {
                Ok(()) => marked.push(id),
                Err(err) => {
                    warn!(fine_id = %id, error = %err, "failed to mark fine paid");
                    failed.push(id);
                }
            }
        }

        if failed.is_empty() {
            Ok(marked)
        } else {
            Err(ParkingError::FineSettlementIncomplete {
                marked: marked.len(),
                failed,
            })
        }
    }

    /// unpaid remainder of a settlement, collected on the next visit
    pub fn shortfall_fine(
        &self,
        plate: &LicensePlate,
        shortfall: Money,
        now: DateTime<Utc>,
    ) -> Result<Fine> {
        Fine::new(plate.clone(), FineType::Overstay, shortfall, now)
    }

    fn issue(
        &self,
        vehicle: &Vehicle,
        fine_type: FineType,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Option<Fine> {
        // strategies never yield negative amounts once validated
        Fine::new(vehicle.license_plate.clone(), fine_type, amount, now)
            .ok()
            .map(|fine| fine.for_visit(vehicle.entry_time))
    }
}
