use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{FineId, ReservationId, ReservationStatus, SpotId, SpotType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParkingError {
    #[error("invalid license plate: {plate:?} (expected 2-15 characters of A-Z, 0-9 or '-')")]
    InvalidLicensePlate {
        plate: String,
    },

    #[error("invalid duration: {hours} hours (must not be negative)")]
    InvalidDuration {
        hours: Decimal,
    },

    #[error("invalid {field}: {amount} (must not be negative)")]
    InvalidAmount {
        field: &'static str,
        amount: Money,
    },

    #[error("spot not found: {spot_id}")]
    SpotNotFound {
        spot_id: SpotId,
    },

    #[error("spot {spot_id} cannot be reserved: type is {spot_type:?}, expected Reserved")]
    SpotNotReservable {
        spot_id: SpotId,
        spot_type: SpotType,
    },

    #[error("invalid reservation window: end {end} must be after start {start}")]
    InvalidReservationWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("spot {spot_id} already reserved in that window by reservation {conflicting}")]
    ReservationOverlap {
        spot_id: SpotId,
        conflicting: ReservationId,
    },

    #[error("reservation not found: {id}")]
    ReservationNotFound {
        id: ReservationId,
    },

    #[error("reservation {id} is {status:?}, only active reservations can be cancelled")]
    ReservationNotActive {
        id: ReservationId,
        status: ReservationStatus,
    },

    #[error("cancellation requires acknowledging that prepaid amounts are not refunded")]
    RefundNotAcknowledged,

    #[error("fine not found: {id}")]
    FineNotFound {
        id: FineId,
    },

    #[error("fine settlement incomplete: {marked} marked paid, {} failed", .failed.len())]
    FineSettlementIncomplete {
        marked: usize,
        failed: Vec<FineId>,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ParkingError>;
