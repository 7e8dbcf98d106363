use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{non_negative_hours, LicensePlate, VehicleType};

/// a vehicle visit, created at entry and kept as history after exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub license_plate: LicensePlate,
    pub vehicle_type: VehicleType,
    /// holds a handicapped parking card
    pub handicapped: bool,
    /// `None` only for legacy records where entry was never captured
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    /// elapsed hours tracked by the occupancy system, preferred over timestamps
    pub elapsed_hours: Option<Decimal>,
}

impl Vehicle {
    /// record a vehicle entering the facility
    pub fn arrive(
        license_plate: LicensePlate,
        vehicle_type: VehicleType,
        handicapped: bool,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            license_plate,
            vehicle_type,
            handicapped,
            entry_time: Some(entry_time),
            exit_time: None,
            elapsed_hours: None,
        }
    }

    /// attach an externally tracked elapsed time
    pub fn with_elapsed_hours(mut self, hours: Decimal) -> Result<Self> {
        self.elapsed_hours = Some(non_negative_hours(hours)?);
        Ok(self)
    }

    /// set the exit time; the first recorded exit wins
    pub fn record_exit(&mut self, exit_time: DateTime<Utc>) {
        if self.exit_time.is_none() {
            self.exit_time = Some(exit_time);
        }
    }

    pub fn is_parked(&self) -> bool {
        self.exit_time.is_none()
    }

    /// wall-clock occupancy, up to exit or `now` while still parked
    pub fn occupied_duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        let entry = self.entry_time?;
        let end = self.exit_time.unwrap_or(now);
        Some((end - entry).max(Duration::zero()))
    }

    /// hours parked, rounded up to whole hours
    ///
    /// Prefers a live value, then the stored elapsed hours, then the
    /// timestamps. `None` when none of those are known.
    pub fn hours_parked(&self, live_elapsed: Option<Decimal>, now: DateTime<Utc>) -> Option<Decimal> {
        if let Some(hours) = live_elapsed.or(self.elapsed_hours) {
            return Some(hours.max(Decimal::ZERO).ceil());
        }
        self.occupied_duration(now).map(whole_hours_ceil)
    }
}

/// round a duration up to the next whole hour
pub fn whole_hours_ceil(duration: Duration) -> Decimal {
    let seconds = duration.num_seconds().max(0);
    let hours = seconds / 3600 + i64::from(seconds % 3600 != 0);
    Decimal::from(hours)
}
