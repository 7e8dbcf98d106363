pub mod calculator;
pub mod rate;

use rust_decimal::Decimal;

use crate::decimal::Money;

pub use calculator::FeeCalculator;
pub use rate::{RateResolution, RateResolver, RateSource};

/// parking fee calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct FeeCalculation {
    pub fee: Money,
    pub hours: Decimal,
    pub rate: RateResolution,
}
