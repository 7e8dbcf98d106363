use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{ParkingError, Result};
use crate::events::{Event, EventStore};
use crate::store::{KeyedLocks, ReservationStore, SpotCatalog};
use crate::types::{LicensePlate, ReservationId, ReservationStatus, SpotId};

use super::Reservation;

/// the holder's answer to "prepaid amounts are not refunded"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRefundAcknowledgement {
    Accepted,
    Declined,
}

/// books, checks and cancels prepaid reservations
pub struct ReservationManager {
    store: Arc<dyn ReservationStore>,
    spots: Arc<dyn SpotCatalog>,
    spot_locks: KeyedLocks,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn ReservationStore>, spots: Arc<dyn SpotCatalog>) -> Self {
        Self {
            store,
            spots,
            spot_locks: KeyedLocks::new(),
        }
    }

    /// book a reserved spot for `[start, end)`
    ///
    /// The overlap check and the insert run under the spot's lock so two
    /// bookings for the same window cannot both succeed.
    pub fn create_reservation(
        &self,
        plate: &LicensePlate,
        spot_id: &SpotId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Reservation> {
        let spot = self
            .spots
            .find_spot(spot_id)?
            .ok_or_else(|| ParkingError::SpotNotFound {
                spot_id: spot_id.clone(),
            })?;

        if !spot.is_reserved() {
            return Err(ParkingError::SpotNotReservable {
                spot_id: spot_id.clone(),
                spot_type: spot.spot_type,
            });
        }
        if end <= start {
            return Err(ParkingError::InvalidReservationWindow { start, end });
        }

        self.spot_locks.with_lock(spot_id.as_str(), || {
            let now = time_provider.now();

            if let Some(conflict) = self
                .store
                .find_all()?
                .into_iter()
                .find(|r| r.spot_id() == spot_id && r.is_active_at(now) && r.overlaps(start, end))
            {
                debug!(spot = %spot_id, conflicting = %conflict.id(), "reservation window taken");
                return Err(ParkingError::ReservationOverlap {
                    spot_id: spot_id.clone(),
                    conflicting: conflict.id(),
                });
            }

            let reservation = Reservation::new(plate.clone(), spot_id.clone(), start, end, spot.hourly_rate)?;

            if !self.store.save(reservation.clone())? {
                return Err(ParkingError::Storage {
                    message: format!("reservation store rejected {}", reservation.id()),
                });
            }

            info!(
                reservation_id = %reservation.id(),
                plate = %plate,
                spot = %spot_id,
                hours = %reservation.hours(),
                prepaid = %reservation.prepaid_amount(),
                "reservation created"
            );

            events.emit(Event::ReservationCreated {
                reservation_id: reservation.id(),
                license_plate: plate.clone(),
                spot_id: spot_id.clone(),
                hours: reservation.hours(),
                prepaid_amount: reservation.prepaid_amount(),
                timestamp: now,
            });

            Ok(reservation)
        })
    }

    /// cancel an active reservation; the prepaid amount is forfeited
    pub fn cancel_reservation(
        &self,
        id: ReservationId,
        acknowledgement: NoRefundAcknowledgement,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Reservation> {
        if acknowledgement != NoRefundAcknowledgement::Accepted {
            return Err(ParkingError::RefundNotAcknowledged);
        }

        let mut reservation = self.find(id)?;
        let spot_key = reservation.spot_id().as_str().to_string();

        self.spot_locks.with_lock(&spot_key, || {
            let now = time_provider.now();
            let status = reservation.status_at(now);
            if status != ReservationStatus::Active {
                return Err(ParkingError::ReservationNotActive { id, status });
            }

            if !self.store.cancel(id)? {
                return Err(ParkingError::ReservationNotActive {
                    id,
                    status: ReservationStatus::Cancelled,
                });
            }
            reservation.mark_cancelled();

            info!(
                reservation_id = %id,
                plate = %reservation.license_plate(),
                forfeited = %reservation.prepaid_amount(),
                "reservation cancelled"
            );

            events.emit(Event::ReservationCancelled {
                reservation_id: id,
                license_plate: reservation.license_plate().clone(),
                forfeited_amount: reservation.prepaid_amount(),
                timestamp: now,
            });

            Ok(reservation)
        })
    }

    /// active reservation for this plate and spot covering `at`, if any
    pub fn covering_reservation(
        &self,
        plate: &LicensePlate,
        spot_id: &SpotId,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>> {
        Ok(self
            .store
            .find_all()?
            .into_iter()
            .find(|r| r.license_plate() == plate && r.spot_id() == spot_id && r.covers(at)))
    }

    /// the vehicle may occupy the reserved spot at `at`
    pub fn is_authorized(&self, plate: &LicensePlate, spot_id: &SpotId, at: DateTime<Utc>) -> Result<bool> {
        Ok(self.covering_reservation(plate, spot_id, at)?.is_some())
    }

    pub fn find(&self, id: ReservationId) -> Result<Reservation> {
        self.store
            .find_all()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or(ParkingError::ReservationNotFound { id })
    }

    pub fn reservations_for_plate(&self, plate: &LicensePlate) -> Result<Vec<Reservation>> {
        Ok(self
            .store
            .find_all()?
            .into_iter()
            .filter(|r| r.license_plate() == plate)
            .collect())
    }

    pub fn active_reservations(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
        Ok(self
            .store
            .find_all()?
            .into_iter()
            .filter(|r| r.is_active_at(now))
            .collect())
    }

    pub fn is_spot_available(&self, spot_id: &SpotId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<bool> {
        Ok(!self.store.is_spot_reserved(spot_id, start, end)?)
    }
}
