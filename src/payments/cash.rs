use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// one step of the cash machine exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashStep {
    Tendered { amount: Money, at: DateTime<Utc> },
    Refunded { amount: Money, at: DateTime<Utc> },
}

/// insert-then-refund exchange for exits that owe nothing
///
/// The cash lane always takes a note before opening the barrier. When the
/// fee is waived or prepaid the full note comes back, so nothing is captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashCompensation {
    steps: Vec<CashStep>,
}

impl CashCompensation {
    /// tender followed by a refund of the same amount
    pub fn refund_in_full(tendered: Money, at: DateTime<Utc>) -> Self {
        Self {
            steps: vec![
                CashStep::Tendered { amount: tendered, at },
                CashStep::Refunded { amount: tendered, at },
            ],
        }
    }

    pub fn steps(&self) -> &[CashStep] {
        &self.steps
    }

    pub fn tendered(&self) -> Money {
        self.steps
            .iter()
            .map(|step| match step {
                CashStep::Tendered { amount, .. } => *amount,
                CashStep::Refunded { .. } => Money::ZERO,
            })
            .sum()
    }

    pub fn refunded(&self) -> Money {
        self.steps
            .iter()
            .map(|step| match step {
                CashStep::Refunded { amount, .. } => *amount,
                CashStep::Tendered { .. } => Money::ZERO,
            })
            .sum()
    }

    /// money kept by the facility, zero for a full refund
    pub fn net_captured(&self) -> Money {
        self.tendered() - self.refunded()
    }
}
