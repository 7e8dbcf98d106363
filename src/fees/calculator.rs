use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RateConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{non_negative_hours, ParkingSpot};
use crate::vehicle::Vehicle;

use super::{FeeCalculation, RateResolver};

/// converts billable hours into a parking fee
///
/// Hours must already be rounded by the caller; no time arithmetic happens here.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    resolver: RateResolver,
}

impl FeeCalculator {
    pub fn new(config: &RateConfig) -> Self {
        Self {
            resolver: RateResolver::new(config),
        }
    }

    pub fn resolver(&self) -> &RateResolver {
        &self.resolver
    }

    /// hours x resolved rate
    pub fn calculate_parking_fee(
        &self,
        vehicle: &Vehicle,
        spot: &ParkingSpot,
        duration_hours: Decimal,
    ) -> Result<Money> {
        Ok(self.calculate(vehicle, spot, duration_hours)?.fee)
    }

    /// fee with the rate breakdown
    pub fn calculate(
        &self,
        vehicle: &Vehicle,
        spot: &ParkingSpot,
        duration_hours: Decimal,
    ) -> Result<FeeCalculation> {
        let hours = non_negative_hours(duration_hours)?;
        let rate = self.resolver.resolve(vehicle, spot);
        let fee = rate.hourly_rate * hours;

        debug!(
            plate = %vehicle.license_plate,
            spot = %spot.id,
            hours = %hours,
            rate = %rate.hourly_rate,
            fee = %fee,
            "parking fee calculated"
        );

        Ok(FeeCalculation { fee, hours, rate })
    }
}
