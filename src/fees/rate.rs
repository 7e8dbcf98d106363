use serde::{Deserialize, Serialize};

use crate::config::RateConfig;
use crate::decimal::Money;
use crate::types::{ParkingSpot, SpotType};
use crate::vehicle::Vehicle;

/// where the applied hourly rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    /// the spot's posted rate
    Posted,
    /// concessional rate for a handicapped card holder in a handicapped spot
    HandicappedConcession,
}

/// resolved hourly rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateResolution {
    pub hourly_rate: Money,
    pub source: RateSource,
}

impl RateResolution {
    pub fn is_concession(&self) -> bool {
        self.source == RateSource::HandicappedConcession
    }
}

/// picks the hourly rate for a vehicle in a spot
#[derive(Debug, Clone)]
pub struct RateResolver {
    handicapped_hourly_rate: Money,
}

impl RateResolver {
    pub fn new(config: &RateConfig) -> Self {
        Self {
            handicapped_hourly_rate: config.handicapped_hourly_rate,
        }
    }

    /// handicapped vehicle in a handicapped spot pays the concession rate,
    /// everything else pays the posted rate
    pub fn resolve(&self, vehicle: &Vehicle, spot: &ParkingSpot) -> RateResolution {
        if vehicle.handicapped && spot.spot_type == SpotType::Handicapped {
            RateResolution {
                hourly_rate: self.handicapped_hourly_rate,
                source: RateSource::HandicappedConcession,
            }
        } else {
            RateResolution {
                hourly_rate: spot.hourly_rate,
                source: RateSource::Posted,
            }
        }
    }
}
