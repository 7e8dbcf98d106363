pub mod cash;
pub mod settlement;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{ParkingError, Result};
use crate::types::{LicensePlate, PaymentId, PaymentMethod};

pub use cash::{CashCompensation, CashStep};
pub use settlement::{PaymentSettlement, Settlement, SettlementRequest};

/// one exit transaction, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    license_plate: LicensePlate,
    parking_fee: Money,
    fine_amount: Money,
    total_amount: Money,
    amount_paid: Money,
    method: PaymentMethod,
    payment_date: DateTime<Utc>,
}

impl Payment {
    /// total is always fee + fines
    pub fn new(
        license_plate: LicensePlate,
        parking_fee: Money,
        fine_amount: Money,
        amount_paid: Money,
        method: PaymentMethod,
        payment_date: DateTime<Utc>,
    ) -> Result<Self> {
        ensure_non_negative("parking fee", parking_fee)?;
        ensure_non_negative("fine amount", fine_amount)?;
        ensure_non_negative("amount paid", amount_paid)?;

        Ok(Self {
            id: Uuid::new_v4(),
            license_plate,
            parking_fee,
            fine_amount,
            total_amount: parking_fee + fine_amount,
            amount_paid,
            method,
            payment_date,
        })
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn license_plate(&self) -> &LicensePlate {
        &self.license_plate
    }

    pub fn parking_fee(&self) -> Money {
        self.parking_fee
    }

    pub fn fine_amount(&self) -> Money {
        self.fine_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn payment_date(&self) -> DateTime<Utc> {
        self.payment_date
    }

    pub fn remaining_balance(&self) -> Money {
        remaining_balance(self.amount_paid, self.total_amount)
    }

    pub fn change_amount(&self) -> Money {
        change_amount(self.amount_paid, self.total_amount)
    }

    pub fn is_fully_paid(&self) -> bool {
        validate_payment(self.amount_paid, self.total_amount)
    }
}

/// tender covers the total
pub fn validate_payment(paid: Money, total: Money) -> bool {
    paid >= total
}

/// max(0, total - paid)
pub fn remaining_balance(paid: Money, total: Money) -> Money {
    total.saturating_sub(paid)
}

/// max(0, paid - total)
pub fn change_amount(paid: Money, total: Money) -> Money {
    paid.saturating_sub(total)
}

pub(crate) fn ensure_non_negative(field: &'static str, amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(ParkingError::InvalidAmount { field, amount });
    }
    Ok(())
}
