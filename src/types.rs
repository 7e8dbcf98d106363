use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{ParkingError, Result};

/// unique identifier for a fine
pub type FineId = Uuid;

/// unique identifier for a reservation
pub type ReservationId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// normalized license plate
///
/// Always upper-case, 2 to 15 characters drawn from `A-Z`, `0-9` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicensePlate(String);

impl LicensePlate {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 15;

    /// trim, upper-case and validate
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        let len = normalized.chars().count();
        let valid_chars = normalized
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');

        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len) || !valid_chars {
            return Err(ParkingError::InvalidLicensePlate {
                plate: raw.to_string(),
            });
        }

        Ok(LicensePlate(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicensePlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LicensePlate {
    type Error = ParkingError;

    fn try_from(value: String) -> Result<Self> {
        LicensePlate::parse(&value)
    }
}

impl From<LicensePlate> for String {
    fn from(plate: LicensePlate) -> Self {
        plate.0
    }
}

/// spot identifier as issued by the floor layout, e.g. `F2-R07`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpotId(String);

impl SpotId {
    pub fn new(id: impl Into<String>) -> Self {
        SpotId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpotId {
    fn from(s: &str) -> Self {
        SpotId(s.to_string())
    }
}

/// vehicle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Motorcycle,
    Car,
    Van,
    Truck,
}

/// spot types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpotType {
    Regular,
    Compact,
    /// concessional rate for handicapped card holders
    Handicapped,
    /// bookable only through a prepaid reservation
    Reserved,
}

/// a parking spot as exposed by the spot catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: SpotId,
    pub spot_type: SpotType,
    pub hourly_rate: Money,
}

impl ParkingSpot {
    pub fn new(id: impl Into<String>, spot_type: SpotType, hourly_rate: Money) -> Self {
        Self {
            id: SpotId::new(id),
            spot_type,
            hourly_rate,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.spot_type == SpotType::Reserved
    }
}

/// fine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineType {
    /// stay beyond the overstay threshold, also used for carried-forward shortfalls
    Overstay,
    /// occupying a reserved spot without a covering reservation
    UnauthorizedReserved,
}

/// payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("Cash"),
            PaymentMethod::Card => f.write_str("Card"),
        }
    }
}

/// reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Active,
    /// window ended, derived from the clock
    Expired,
    /// cancelled by the holder, no refund
    Cancelled,
}

/// why the parking fee is not collected at exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeExemption {
    /// stay within the grace period, fee waived
    GracePeriod,
    /// fee already collected when the reservation was booked
    PrepaidReservation,
}

/// hours as a decimal quantity, rejected when negative
pub fn non_negative_hours(hours: Decimal) -> Result<Decimal> {
    if hours.is_sign_negative() && !hours.is_zero() {
        return Err(ParkingError::InvalidDuration { hours });
    }
    Ok(hours)
}
