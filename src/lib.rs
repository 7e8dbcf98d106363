pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod exit;
pub mod fees;
pub mod fines;
pub mod payments;
pub mod receipt;
pub mod reservations;
pub mod store;
pub mod types;
pub mod vehicle;

// re-export key types
pub use config::{FineSchedule, FineStrategyKind, GraceConfig, OverstayConfig, ParkingPolicy, RateConfig};
pub use decimal::Money;
pub use errors::{ParkingError, Result};
pub use events::{Event, EventStore};
pub use exit::{ExitOutcome, ExitProcessor, ExitRequest};
pub use fees::{FeeCalculation, FeeCalculator, RateResolution, RateResolver, RateSource};
pub use fines::{ActiveFineStrategy, Fine, FineManager, FineStrategy, ProgressiveTier, VisitContext};
pub use payments::{
    CashCompensation, CashStep, Payment, PaymentSettlement, Settlement, SettlementRequest,
};
pub use receipt::{Receipt, ReceiptBuilder};
pub use reservations::{NoRefundAcknowledgement, Reservation, ReservationManager};
pub use store::{
    FineStore, KeyedLocks, MemoryFineStore, MemoryPaymentLog, MemoryReservationStore,
    MemorySpotCatalog, PaymentLog, ReservationStore, SpotCatalog,
};
pub use types::{
    FeeExemption, FineId, FineType, LicensePlate, ParkingSpot, PaymentId, PaymentMethod,
    ReservationId, ReservationStatus, SpotId, SpotType, VehicleType,
};
pub use vehicle::Vehicle;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
