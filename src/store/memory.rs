//! In-memory stores used by tests, demos and single-process deployments.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::errors::{ParkingError, Result};
use crate::fines::Fine;
use crate::payments::Payment;
use crate::reservations::Reservation;
use crate::types::{FineId, LicensePlate, ParkingSpot, ReservationId, SpotId};

use super::{FineStore, PaymentLog, ReservationStore, SpotCatalog};

#[derive(Debug, Default)]
pub struct MemoryFineStore {
    fines: RwLock<Vec<Fine>>,
}

impl MemoryFineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// every fine ever saved, paid or not
    pub fn all(&self) -> Vec<Fine> {
        self.fines.read().clone()
    }
}

impl FineStore for MemoryFineStore {
    fn save(&self, fine: Fine) -> Result<FineId> {
        let mut fines = self.fines.write();
        if fines.iter().any(|f| f.id() == fine.id()) {
            return Err(ParkingError::Storage {
                message: format!("fine {} already stored", fine.id()),
            });
        }
        let id = fine.id();
        fines.push(fine);
        Ok(id)
    }

    fn find_unpaid_by_plate(&self, plate: &LicensePlate) -> Result<Vec<Fine>> {
        Ok(self
            .fines
            .read()
            .iter()
            .filter(|f| !f.is_paid() && f.license_plate() == plate)
            .cloned()
            .collect())
    }

    fn find_all_unpaid(&self) -> Result<Vec<Fine>> {
        Ok(self.fines.read().iter().filter(|f| !f.is_paid()).cloned().collect())
    }

    fn mark_paid(&self, id: FineId) -> Result<()> {
        let mut fines = self.fines.write();
        let fine = fines
            .iter_mut()
            .find(|f| f.id() == id)
            .ok_or(ParkingError::FineNotFound { id })?;
        fine.mark_paid();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryReservationStore {
    reservations: RwLock<HashMap<ReservationId, Reservation>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReservationStore for MemoryReservationStore {
    fn save(&self, reservation: Reservation) -> Result<bool> {
        let mut reservations = self.reservations.write();
        if reservations.contains_key(&reservation.id()) {
            return Ok(false);
        }
        reservations.insert(reservation.id(), reservation);
        Ok(true)
    }

    fn find_all(&self) -> Result<Vec<Reservation>> {
        let mut all: Vec<Reservation> = self.reservations.read().values().cloned().collect();
        all.sort_by_key(|r| r.start_time());
        Ok(all)
    }

    fn is_spot_reserved(&self, spot_id: &SpotId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .reservations
            .read()
            .values()
            .any(|r| !r.is_cancelled() && r.spot_id() == spot_id && r.overlaps(start, end)))
    }

    fn cancel(&self, id: ReservationId) -> Result<bool> {
        Ok(self
            .reservations
            .write()
            .get_mut(&id)
            .map_or(false, Reservation::mark_cancelled))
    }
}

#[derive(Debug, Default)]
pub struct MemorySpotCatalog {
    spots: RwLock<HashMap<SpotId, ParkingSpot>>,
}

impl MemorySpotCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spots(spots: impl IntoIterator<Item = ParkingSpot>) -> Self {
        let catalog = Self::new();
        for spot in spots {
            catalog.insert(spot);
        }
        catalog
    }

    /// add or replace a spot
    pub fn insert(&self, spot: ParkingSpot) {
        self.spots.write().insert(spot.id.clone(), spot);
    }
}

impl SpotCatalog for MemorySpotCatalog {
    fn find_spot(&self, spot_id: &SpotId) -> Result<Option<ParkingSpot>> {
        Ok(self.spots.read().get(spot_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPaymentLog {
    payments: RwLock<Vec<Payment>>,
}

impl MemoryPaymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.read().is_empty()
    }
}

impl PaymentLog for MemoryPaymentLog {
    fn append(&self, payment: Payment) -> Result<()> {
        self.payments.write().push(payment);
        Ok(())
    }

    fn find_by_plate(&self, plate: &LicensePlate) -> Result<Vec<Payment>> {
        Ok(self
            .payments
            .read()
            .iter()
            .filter(|p| p.license_plate() == plate)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::types::{FineType, PaymentMethod, SpotType};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn plate(s: &str) -> LicensePlate {
        LicensePlate::parse(s).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_fine_store_filters_by_plate_and_paid() {
        let store = MemoryFineStore::new();
        let a = store
            .save(Fine::new(plate("AAA-1"), FineType::Overstay, Money::from_major(50), at(9)).unwrap())
            .unwrap();
        store
            .save(Fine::new(plate("BBB-2"), FineType::Overstay, Money::from_major(50), at(9)).unwrap())
            .unwrap();

        assert_eq!(store.find_unpaid_by_plate(&plate("AAA-1")).unwrap().len(), 1);
        assert_eq!(store.find_all_unpaid().unwrap().len(), 2);

        store.mark_paid(a).unwrap();
        assert!(store.find_unpaid_by_plate(&plate("AAA-1")).unwrap().is_empty());
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn test_fine_store_rejects_unknown_and_duplicate() {
        let store = MemoryFineStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.mark_paid(id), Err(ParkingError::FineNotFound { id }));

        let fine = Fine::new(plate("AAA-1"), FineType::Overstay, Money::from_major(5), at(9)).unwrap();
        store.save(fine.clone()).unwrap();
        assert!(matches!(store.save(fine), Err(ParkingError::Storage { .. })));
    }

    #[test]
    fn test_reservation_store_overlap_ignores_cancelled() {
        let store = MemoryReservationStore::new();
        let spot = SpotId::from("R-01");
        let r = Reservation::new(plate("AAA-1"), spot.clone(), at(10), at(12), Money::from_major(8)).unwrap();
        let id = r.id();
        assert!(store.save(r.clone()).unwrap());
        assert!(!store.save(r).unwrap());

        assert!(store.is_spot_reserved(&spot, at(11), at(13)).unwrap());
        assert!(!store.is_spot_reserved(&spot, at(12), at(13)).unwrap());
        assert!(!store.is_spot_reserved(&SpotId::from("R-02"), at(11), at(13)).unwrap());

        assert!(store.cancel(id).unwrap());
        assert!(!store.cancel(id).unwrap());
        assert!(!store.cancel(Uuid::new_v4()).unwrap());
        assert!(!store.is_spot_reserved(&spot, at(11), at(13)).unwrap());
    }

    #[test]
    fn test_find_all_sorted_by_start() {
        let store = MemoryReservationStore::new();
        let spot = SpotId::from("R-01");
        store
            .save(Reservation::new(plate("B-2"), spot.clone(), at(14), at(15), Money::ONE).unwrap())
            .unwrap();
        store
            .save(Reservation::new(plate("A-1"), spot, at(8), at(8) + Duration::minutes(30), Money::ONE).unwrap())
            .unwrap();

        let all = store.find_all().unwrap();
        assert_eq!(all[0].start_time(), at(8));
        assert_eq!(all[1].start_time(), at(14));
    }

    #[test]
    fn test_spot_catalog_and_payment_log() {
        let catalog = MemorySpotCatalog::with_spots(vec![ParkingSpot::new(
            "C-07",
            SpotType::Compact,
            Money::from_major(3),
        )]);
        assert!(catalog.find_spot(&SpotId::from("C-07")).unwrap().is_some());
        assert!(catalog.find_spot(&SpotId::from("C-08")).unwrap().is_none());

        let log = MemoryPaymentLog::new();
        assert!(log.is_empty());
        let payment = Payment::new(
            plate("AAA-1"),
            Money::from_major(3),
            Money::ZERO,
            Money::from_major(3),
            PaymentMethod::Card,
            at(9),
        )
        .unwrap();
        log.append(payment).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.find_by_plate(&plate("AAA-1")).unwrap().len(), 1);
        assert!(log.find_by_plate(&plate("ZZZ-9")).unwrap().is_empty());
    }
}
