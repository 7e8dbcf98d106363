pub mod manager;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::types::{LicensePlate, ReservationId, ReservationStatus, SpotId};

pub use manager::{NoRefundAcknowledgement, ReservationManager};

/// a prepaid booking of a reserved spot
///
/// Expiry is derived from the clock; only cancellation is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    license_plate: LicensePlate,
    spot_id: SpotId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    prepaid_amount: Money,
    cancelled: bool,
}

impl Reservation {
    /// new active reservation with a frozen prepaid amount
    pub fn new(
        license_plate: LicensePlate,
        spot_id: SpotId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        hourly_rate: Money,
    ) -> Result<Self> {
        let hours = window_hours(start_time, end_time)?;
        Self::restore(
            Uuid::new_v4(),
            license_plate,
            spot_id,
            start_time,
            end_time,
            hourly_rate * hours,
            false,
        )
    }

    /// rebuild a reservation loaded from storage
    pub fn restore(
        id: ReservationId,
        license_plate: LicensePlate,
        spot_id: SpotId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        prepaid_amount: Money,
        cancelled: bool,
    ) -> Result<Self> {
        window_hours(start_time, end_time)?;
        if prepaid_amount.is_negative() {
            return Err(ParkingError::InvalidAmount {
                field: "prepaid amount",
                amount: prepaid_amount,
            });
        }

        Ok(Self {
            id,
            license_plate,
            spot_id,
            start_time,
            end_time,
            prepaid_amount,
            cancelled,
        })
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn license_plate(&self) -> &LicensePlate {
        &self.license_plate
    }

    pub fn spot_id(&self) -> &SpotId {
        &self.spot_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn prepaid_amount(&self) -> Money {
        self.prepaid_amount
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// booked length in hours
    pub fn hours(&self) -> Decimal {
        hours_between(self.start_time, self.end_time)
    }

    /// cancelled wins over expired; expired once `now` passes the end
    pub fn status_at(&self, now: DateTime<Utc>) -> ReservationStatus {
        if self.cancelled {
            ReservationStatus::Cancelled
        } else if now > self.end_time {
            ReservationStatus::Expired
        } else {
            ReservationStatus::Active
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ReservationStatus::Active
    }

    /// active at `at` and `at` falls inside the booked window
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.is_active_at(at) && self.start_time <= at && at <= self.end_time
    }

    /// covers the entry and is still active at exit, so the whole stay is prepaid
    pub fn covers_stay(&self, entry: DateTime<Utc>, exit: DateTime<Utc>) -> bool {
        self.covers(entry) && self.is_active_at(exit) && exit <= self.end_time
    }

    /// half-open window overlap
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }

    /// store-side cancellation; false when already cancelled
    pub fn mark_cancelled(&mut self) -> bool {
        !std::mem::replace(&mut self.cancelled, true)
    }
}

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    Decimal::from((end - start).num_seconds()) / Decimal::from(3600)
}

fn window_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Decimal> {
    if end <= start {
        return Err(ParkingError::InvalidReservationWindow { start, end });
    }
    Ok(hours_between(start, end))
}
