use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::fines::FineStrategy;
use crate::types::{
    FeeExemption, FineId, FineType, LicensePlate, PaymentId, PaymentMethod, ReservationId, SpotId,
};

/// all events that can be emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // fine events
    FineIssued {
        fine_id: FineId,
        license_plate: LicensePlate,
        fine_type: FineType,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    FinesPaid {
        license_plate: LicensePlate,
        fine_ids: Vec<FineId>,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    ShortfallCarriedForward {
        license_plate: LicensePlate,
        fine_id: FineId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    FineStrategyChanged {
        old_strategy: FineStrategy,
        new_strategy: FineStrategy,
        timestamp: DateTime<Utc>,
    },

    // payment events
    FeeExempted {
        license_plate: LicensePlate,
        exemption: FeeExemption,
        waived_fee: Money,
        timestamp: DateTime<Utc>,
    },
    CashTendered {
        license_plate: LicensePlate,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    RefundIssued {
        license_plate: LicensePlate,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentSettled {
        payment_id: PaymentId,
        license_plate: LicensePlate,
        total_amount: Money,
        amount_paid: Money,
        method: PaymentMethod,
        timestamp: DateTime<Utc>,
    },

    // reservation events
    ReservationCreated {
        reservation_id: ReservationId,
        license_plate: LicensePlate,
        spot_id: SpotId,
        hours: Decimal,
        prepaid_amount: Money,
        timestamp: DateTime<Utc>,
    },
    ReservationCancelled {
        reservation_id: ReservationId,
        license_plate: LicensePlate,
        forfeited_amount: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
