pub mod manager;
pub mod strategy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::types::{FineId, FineType, LicensePlate};

pub use manager::{FineManager, VisitContext};
pub use strategy::{ActiveFineStrategy, FineStrategy, ProgressiveTier};

/// a fine issued to a license plate
///
/// Only the paid flag ever changes after issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fine {
    id: FineId,
    license_plate: LicensePlate,
    fine_type: FineType,
    amount: Money,
    issued_at: DateTime<Utc>,
    paid: bool,
    /// entry time of the visit that triggered the fine
    #[serde(default)]
    visit_entry: Option<DateTime<Utc>>,
}

impl Fine {
    /// issue a new unpaid fine
    pub fn new(
        license_plate: LicensePlate,
        fine_type: FineType,
        amount: Money,
        issued_at: DateTime<Utc>,
    ) -> Result<Self> {
        Self::restore(Uuid::new_v4(), license_plate, fine_type, amount, issued_at, false)
    }

    /// rebuild a fine loaded from storage
    pub fn restore(
        id: FineId,
        license_plate: LicensePlate,
        fine_type: FineType,
        amount: Money,
        issued_at: DateTime<Utc>,
        paid: bool,
    ) -> Result<Self> {
        if amount.is_negative() {
            return Err(ParkingError::InvalidAmount {
                field: "fine amount",
                amount,
            });
        }

        Ok(Self {
            id,
            license_plate,
            fine_type,
            amount,
            issued_at,
            paid,
            visit_entry: None,
        })
    }

    /// tie the fine to the visit that triggered it
    pub fn for_visit(mut self, entry_time: Option<DateTime<Utc>>) -> Self {
        self.visit_entry = entry_time;
        self
    }

    pub fn id(&self) -> FineId {
        self.id
    }

    pub fn license_plate(&self) -> &LicensePlate {
        &self.license_plate
    }

    pub fn fine_type(&self) -> FineType {
        self.fine_type
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    pub fn visit_entry(&self) -> Option<DateTime<Utc>> {
        self.visit_entry
    }

    /// same violation for the same plate and visit
    ///
    /// Fines without a visit, such as carried-forward shortfalls, never match.
    pub fn same_violation(&self, other: &Fine) -> bool {
        self.visit_entry.is_some()
            && self.visit_entry == other.visit_entry
            && self.fine_type == other.fine_type
            && self.license_plate == other.license_plate
    }

    /// the one permitted mutation; idempotent
    pub fn mark_paid(&mut self) {
        self.paid = true;
    }
}

/// sum of the amounts of unpaid fines
pub fn total_unpaid(fines: &[Fine]) -> Money {
    fines.iter().filter(|f| !f.is_paid()).map(Fine::amount).sum()
}
