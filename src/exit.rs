//! Exit lane control flow.
//!
//! Fee first, then fines (new and outstanding), then settlement against the
//! tender, then the receipt. Everything for one plate runs under that plate's
//! lock so concurrent exits cannot double-count or double-settle fines.
//!
//! The payment is logged before outstanding fines are marked paid, and fines
//! are recorded once per visit, so a failed exit can be retried.

use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::ParkingPolicy;
use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::events::{Event, EventStore};
use crate::fees::{FeeCalculation, FeeCalculator};
use crate::fines::{total_unpaid, ActiveFineStrategy, FineManager, FineStrategy, VisitContext};
use crate::payments::{ensure_non_negative, PaymentSettlement, Settlement, SettlementRequest};
use crate::receipt::Receipt;
use crate::reservations::ReservationManager;
use crate::store::{FineStore, KeyedLocks, PaymentLog, SpotCatalog};
use crate::types::{non_negative_hours, FeeExemption, FineId, PaymentMethod, SpotId};
use crate::vehicle::{whole_hours_ceil, Vehicle};

/// a vehicle leaving through the exit lane
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRequest {
    pub vehicle: Vehicle,
    pub spot_id: SpotId,
    pub amount_paid: Money,
    pub method: PaymentMethod,
    /// elapsed hours from the occupancy tracker, preferred over timestamps
    pub live_elapsed_hours: Option<Decimal>,
}

/// everything produced by one exit
#[derive(Debug, Clone, PartialEq)]
pub struct ExitOutcome {
    /// the vehicle with its exit time recorded
    pub vehicle: Vehicle,
    pub fee: FeeCalculation,
    /// fines triggered by this visit
    pub new_fines: Vec<FineId>,
    /// outstanding fines folded into this payment and marked paid
    pub settled_fines: Vec<FineId>,
    pub settlement: Settlement,
    pub receipt: Receipt,
}

pub struct ExitProcessor {
    fines: Arc<dyn FineStore>,
    spots: Arc<dyn SpotCatalog>,
    payments: Arc<dyn PaymentLog>,
    reservations: Arc<ReservationManager>,
    strategy: ActiveFineStrategy,
    fee_calculator: FeeCalculator,
    fine_manager: FineManager,
    settlement: PaymentSettlement,
    plate_locks: KeyedLocks,
    events: Mutex<EventStore>,
}

impl ExitProcessor {
    pub fn new(
        policy: &ParkingPolicy,
        fines: Arc<dyn FineStore>,
        spots: Arc<dyn SpotCatalog>,
        payments: Arc<dyn PaymentLog>,
        reservations: Arc<ReservationManager>,
    ) -> Result<Self> {
        policy.validate()?;

        Ok(Self {
            fines,
            spots,
            payments,
            reservations,
            strategy: ActiveFineStrategy::from_policy(policy)?,
            fee_calculator: FeeCalculator::new(&policy.rate_config),
            fine_manager: FineManager::new(policy.overstay_config.clone()),
            settlement: PaymentSettlement::new(policy),
            plate_locks: KeyedLocks::new(),
            events: Mutex::new(EventStore::new()),
        })
    }

    /// shared handle to the fine strategy in force
    pub fn strategy(&self) -> &ActiveFineStrategy {
        &self.strategy
    }

    /// administrator change of the fine strategy
    pub fn set_fine_strategy(
        &self,
        strategy: FineStrategy,
        time_provider: &SafeTimeProvider,
    ) -> Result<FineStrategy> {
        let mut events = self.events.lock();
        self.strategy.replace(strategy, time_provider, &mut events)
    }

    pub fn reservations(&self) -> &ReservationManager {
        &self.reservations
    }

    pub fn fine_manager(&self) -> &FineManager {
        &self.fine_manager
    }

    /// drain events collected so far
    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }

    /// process one exit end to end
    ///
    /// Tender and live hours are validated before anything is written. Events
    /// from a partially completed exit are still collected.
    pub fn process_exit(&self, request: ExitRequest, time_provider: &SafeTimeProvider) -> Result<ExitOutcome> {
        ensure_non_negative("amount paid", request.amount_paid)?;
        if let Some(hours) = request.live_elapsed_hours {
            non_negative_hours(hours)?;
        }

        let plate = request.vehicle.license_plate.clone();
        let mut events = EventStore::new();

        let result = self.plate_locks.with_lock(plate.as_str(), || {
            self.exit_locked(request, time_provider, &mut events)
        });

        let mut shared = self.events.lock();
        for event in events.take_events() {
            shared.emit(event);
        }

        result
    }

    fn exit_locked(
        &self,
        request: ExitRequest,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<ExitOutcome> {
        let now = time_provider.now();
        let mut vehicle = request.vehicle;
        vehicle.record_exit(now);
        let exit_time = vehicle.exit_time.unwrap_or(now);
        let plate = vehicle.license_plate.clone();

        let spot = self
            .spots
            .find_spot(&request.spot_id)?
            .ok_or_else(|| ParkingError::SpotNotFound {
                spot_id: request.spot_id.clone(),
            })?;

        // authorization is judged at entry; unknown entry means unauthorized
        let reservation = match (spot.is_reserved(), vehicle.entry_time) {
            (true, Some(entry)) => self.reservations.covering_reservation(&plate, &spot.id, entry)?,
            _ => None,
        };
        let authorized = reservation.is_some();

        // the prepaid exemption needs the window to hold the whole stay
        let prepaid_stay = match (&reservation, vehicle.entry_time) {
            (Some(r), Some(entry)) => r.covers_stay(entry, exit_time),
            _ => false,
        };
        let exemption = self
            .settlement
            .exemption(vehicle.occupied_duration(now), prepaid_stay);

        let hours = match vehicle.hours_parked(request.live_elapsed_hours, now) {
            Some(hours) => hours,
            None => {
                warn!(plate = %plate, spot = %spot.id, "entry time and elapsed hours unknown, billing zero hours");
                Decimal::ZERO
            }
        };

        // time past the reservation end is charged, the booked part is not
        let overrun_hours = match &reservation {
            Some(r) if !prepaid_stay => {
                let overrun = whole_hours_ceil(exit_time - r.end_time());
                info!(
                    plate = %plate,
                    reservation = %r.id(),
                    overrun_hours = %overrun,
                    "stay outlasted reservation window"
                );
                Some(overrun)
            }
            _ => None,
        };
        let fee = self
            .fee_calculator
            .calculate(&vehicle, &spot, overrun_hours.unwrap_or(hours))?;

        let strategy = self.strategy.snapshot();
        let visit = VisitContext {
            vehicle: &vehicle,
            spot: &spot,
            live_elapsed_hours: request.live_elapsed_hours,
            authorized_for_spot: authorized,
        };
        let fines = self.fine_manager.generate_fines(&visit, &strategy, time_provider);
        let new_fines = self.fine_manager.record_fines(self.fines.as_ref(), fines, events)?;

        let outstanding = self.fine_manager.unpaid_fines(self.fines.as_ref(), &plate)?;
        let outstanding_total = total_unpaid(&outstanding);
        let outstanding_ids: Vec<FineId> = outstanding.iter().map(|f| f.id()).collect();

        debug!(
            plate = %plate,
            spot = %spot.id,
            hours = %hours,
            fee = %fee.fee,
            exemption = ?exemption,
            outstanding = %outstanding_total,
            "exit assessed"
        );

        let mut settlement = self.settlement.assess(
            SettlementRequest {
                license_plate: plate.clone(),
                parking_fee: fee.fee,
                fine_amount: outstanding_total,
                amount_paid: request.amount_paid,
                method: request.method,
                exemption,
            },
            time_provider,
        )?;

        // the payment is logged before any fine is marked paid
        self.payments.append(settlement.payment.clone())?;
        self.settlement
            .finalize(&mut settlement, self.fines.as_ref(), time_provider, events)?;

        let settled_fines = if outstanding_ids.is_empty() {
            Vec::new()
        } else {
            let marked = self
                .fine_manager
                .mark_fines_paid(self.fines.as_ref(), &outstanding_ids)?;
            info!(plate = %plate, count = marked.len(), amount = %outstanding_total, "fines settled");
            events.emit(Event::FinesPaid {
                license_plate: plate.clone(),
                fine_ids: marked.clone(),
                amount: outstanding_total,
                timestamp: now,
            });
            marked
        };

        let payment = &settlement.payment;
        let receipt = Receipt::builder(plate)
            .vehicle_type(vehicle.vehicle_type)
            .spot(spot.id.clone(), spot.spot_type, spot.hourly_rate)
            .entry_time(vehicle.entry_time)
            .exit_time(vehicle.exit_time)
            .duration_hours(hours)
            .parking_fee(payment.parking_fee())
            .fine_amount(payment.fine_amount())
            .amount_paid(payment.amount_paid())
            .method(payment.method())
            .prepaid_reservation(exemption == Some(FeeExemption::PrepaidReservation))
            .reservation_overrun_hours(overrun_hours.filter(|_| exemption.is_none()))
            .grace_period(exemption == Some(FeeExemption::GracePeriod))
            .card_holder(fee.rate.is_concession())
            .cash_compensation(settlement.cash_compensation.clone())
            .shortfall_fine(settlement.shortfall_fine)
            .build(time_provider);

        Ok(ExitOutcome {
            vehicle,
            fee,
            new_fines,
            settled_fines,
            settlement,
            receipt,
        })
    }
}
