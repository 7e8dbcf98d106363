//! Persistence seams.
//!
//! The engine never caches fines or reservations between calls; every read
//! goes through these traits. Implementations take `&self` so one store can
//! be shared across threads behind an `Arc`.

pub mod locks;
pub mod memory;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::fines::Fine;
use crate::payments::Payment;
use crate::reservations::Reservation;
use crate::types::{FineId, LicensePlate, ParkingSpot, ReservationId, SpotId};

pub use locks::KeyedLocks;
pub use memory::{MemoryFineStore, MemoryPaymentLog, MemoryReservationStore, MemorySpotCatalog};

/// fines keyed by license plate, kept across visits
pub trait FineStore: Send + Sync {
    fn save(&self, fine: Fine) -> Result<FineId>;

    fn find_unpaid_by_plate(&self, plate: &LicensePlate) -> Result<Vec<Fine>>;

    fn find_all_unpaid(&self) -> Result<Vec<Fine>>;

    fn mark_paid(&self, id: FineId) -> Result<()>;
}

/// prepaid reservations
pub trait ReservationStore: Send + Sync {
    fn save(&self, reservation: Reservation) -> Result<bool>;

    fn find_all(&self) -> Result<Vec<Reservation>>;

    /// any non-cancelled reservation on the spot overlapping `[start, end)`
    fn is_spot_reserved(&self, spot_id: &SpotId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<bool>;

    fn cancel(&self, id: ReservationId) -> Result<bool>;
}

/// read-only spot lookup
pub trait SpotCatalog: Send + Sync {
    fn find_spot(&self, spot_id: &SpotId) -> Result<Option<ParkingSpot>>;
}

/// append-only payment log
pub trait PaymentLog: Send + Sync {
    fn append(&self, payment: Payment) -> Result<()>;

    fn find_by_plate(&self, plate: &LicensePlate) -> Result<Vec<Payment>>;
}
