use chrono::Duration;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ParkingPolicy;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::fines::FineManager;
use crate::store::FineStore;
use crate::types::{FeeExemption, FineId, LicensePlate, PaymentMethod};

use super::{change_amount, ensure_non_negative, remaining_balance, CashCompensation, Payment};

/// what the exit lane hands over for settlement
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRequest {
    pub license_plate: LicensePlate,
    /// base fee before any exemption
    pub parking_fee: Money,
    /// unpaid fines folded into this transaction
    pub fine_amount: Money,
    pub amount_paid: Money,
    pub method: PaymentMethod,
    pub exemption: Option<FeeExemption>,
}

/// settlement outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub payment: Payment,
    pub exemption: Option<FeeExemption>,
    /// base fee not collected because of the exemption
    pub waived_fee: Money,
    pub cash_compensation: Option<CashCompensation>,
    pub remaining_balance: Money,
    pub change_amount: Money,
    /// fine carrying the unpaid remainder to the next visit
    pub shortfall_fine: Option<FineId>,
}

/// reconciles tendered money against fee + fines
///
/// Underpayment never blocks an exit: the remainder is carried forward as a
/// new unpaid fine on the same plate.
#[derive(Debug, Clone)]
pub struct PaymentSettlement {
    grace_period: Duration,
    fines: FineManager,
}

impl PaymentSettlement {
    pub fn new(policy: &ParkingPolicy) -> Self {
        Self {
            grace_period: Duration::minutes(policy.grace_config.grace_period_minutes),
            fines: FineManager::new(policy.overstay_config.clone()),
        }
    }

    /// validate amounts and build the payment record; nothing is persisted
    pub fn process_payment(
        &self,
        license_plate: &LicensePlate,
        parking_fee: Money,
        fine_amount: Money,
        amount_paid: Money,
        method: PaymentMethod,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        Payment::new(
            license_plate.clone(),
            parking_fee,
            fine_amount,
            amount_paid,
            method,
            time_provider.now(),
        )
    }

    /// occupancy up to and including the grace window
    pub fn within_grace_period(&self, occupied: Duration) -> bool {
        occupied <= self.grace_period
    }

    /// grace period takes precedence over a prepaid reservation
    pub fn exemption(&self, occupied: Option<Duration>, prepaid_reservation: bool) -> Option<FeeExemption> {
        if occupied.map_or(false, |d| self.within_grace_period(d)) {
            Some(FeeExemption::GracePeriod)
        } else if prepaid_reservation {
            Some(FeeExemption::PrepaidReservation)
        } else {
            None
        }
    }

    /// settle one exit: `assess` then `finalize`
    ///
    /// Exemptions waive the parking fee only; fines are always due. A cash
    /// exit that owes nothing is recorded as a tender refunded in full with
    /// zero paid. Any shortfall is saved as a new unpaid fine.
    pub fn settle(
        &self,
        request: SettlementRequest,
        fine_store: &dyn FineStore,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Settlement> {
        let mut settlement = self.assess(request, time_provider)?;
        self.finalize(&mut settlement, fine_store, time_provider, events)?;
        Ok(settlement)
    }

    /// compute the payment and balances without writing anything
    pub fn assess(&self, request: SettlementRequest, time_provider: &SafeTimeProvider) -> Result<Settlement> {
        ensure_non_negative("parking fee", request.parking_fee)?;
        ensure_non_negative("fine amount", request.fine_amount)?;
        ensure_non_negative("amount paid", request.amount_paid)?;

        let now = time_provider.now();
        let plate = request.license_plate;

        let (charged_fee, waived_fee) = match request.exemption {
            Some(_) => (Money::ZERO, request.parking_fee),
            None => (request.parking_fee, Money::ZERO),
        };
        let due = charged_fee + request.fine_amount;

        let cash_compensation = match (request.exemption, request.method) {
            (Some(_), PaymentMethod::Cash) if due.is_zero() => {
                Some(CashCompensation::refund_in_full(request.amount_paid, now))
            }
            _ => None,
        };
        let recorded_paid = if cash_compensation.is_some() {
            Money::ZERO
        } else {
            request.amount_paid
        };

        let payment = self.process_payment(
            &plate,
            charged_fee,
            request.fine_amount,
            recorded_paid,
            request.method,
            time_provider,
        )?;

        let remaining = remaining_balance(payment.amount_paid(), payment.total_amount());
        let change = change_amount(payment.amount_paid(), payment.total_amount());

        debug!(
            plate = %plate,
            fee = %charged_fee,
            fines = %request.fine_amount,
            paid = %recorded_paid,
            remaining = %remaining,
            change = %change,
            "settlement computed"
        );

        Ok(Settlement {
            payment,
            exemption: request.exemption,
            waived_fee,
            cash_compensation,
            remaining_balance: remaining,
            change_amount: change,
            shortfall_fine: None,
        })
    }

    /// carry any shortfall forward as a fine and emit the settlement events
    pub fn finalize(
        &self,
        settlement: &mut Settlement,
        fine_store: &dyn FineStore,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<()> {
        let now = time_provider.now();
        let plate = settlement.payment.license_plate().clone();
        let remaining = settlement.remaining_balance;

        if remaining.is_positive() {
            let fine = self.fines.shortfall_fine(&plate, remaining, now)?;
            let id = fine_store.save(fine)?;

            warn!(plate = %plate, fine_id = %id, amount = %remaining, "underpayment carried forward");
            events.emit(Event::ShortfallCarriedForward {
                license_plate: plate.clone(),
                fine_id: id,
                amount: remaining,
                timestamp: now,
            });
            settlement.shortfall_fine = Some(id);
        }

        if let Some(exemption) = settlement.exemption {
            events.emit(Event::FeeExempted {
                license_plate: plate.clone(),
                exemption,
                waived_fee: settlement.waived_fee,
                timestamp: now,
            });
        }

        if let Some(exchange) = &settlement.cash_compensation {
            events.emit(Event::CashTendered {
                license_plate: plate.clone(),
                amount: exchange.tendered(),
                timestamp: now,
            });
            events.emit(Event::RefundIssued {
                license_plate: plate.clone(),
                amount: exchange.refunded(),
                timestamp: now,
            });
        }

        let payment = &settlement.payment;
        info!(
            payment_id = %payment.id(),
            plate = %plate,
            total = %payment.total_amount(),
            paid = %payment.amount_paid(),
            method = %payment.method(),
            "payment settled"
        );
        events.emit(Event::PaymentSettled {
            payment_id: payment.id(),
            license_plate: plate,
            total_amount: payment.total_amount(),
            amount_paid: payment.amount_paid(),
            method: payment.method(),
            timestamp: now,
        });

        Ok(())
    }
}
