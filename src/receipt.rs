use std::fmt;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::payments::{change_amount, remaining_balance, CashCompensation};
use crate::types::{FineId, LicensePlate, PaymentMethod, SpotId, SpotType, VehicleType};

const RULE: &str = "========================================";
const THIN_RULE: &str = "----------------------------------------";

/// read-only summary of a completed exit transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub license_plate: LicensePlate,
    pub vehicle_type: Option<VehicleType>,
    pub spot_id: Option<SpotId>,
    pub spot_type: Option<SpotType>,
    pub spot_rate: Option<Money>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_hours: Decimal,
    pub parking_fee: Money,
    pub fine_amount: Money,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub remaining_balance: Money,
    pub change_amount: Money,
    pub method: PaymentMethod,
    pub prepaid_reservation: bool,
    /// hours billed after a reservation window ended mid-stay
    #[serde(default)]
    pub reservation_overrun_hours: Option<Decimal>,
    pub grace_period: bool,
    /// handicapped card holder billed at the concession rate
    pub card_holder: bool,
    pub cash_compensation: Option<CashCompensation>,
    pub shortfall_fine: Option<FineId>,
    pub payment_date: DateTime<Utc>,
}

impl Receipt {
    pub fn builder(license_plate: LicensePlate) -> ReceiptBuilder {
        ReceiptBuilder::new(license_plate)
    }

    /// explanatory lines printed under the totals
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();

        if self.prepaid_reservation {
            notes.push("Parking fee prepaid with reservation.".to_string());
        }
        if let Some(hours) = self.reservation_overrun_hours {
            notes.push(format!("Reservation window ended, {} hour(s) charged beyond it.", hours));
        }
        if self.grace_period {
            notes.push("Grace period exit, no parking fee charged.".to_string());
        }
        if self.card_holder {
            notes.push("Handicapped card holder concession rate applied.".to_string());
        }
        if let Some(exchange) = &self.cash_compensation {
            notes.push(format!(
                "Cash {} inserted and {} refunded.",
                exchange.tendered().to_rm_string(),
                exchange.refunded().to_rm_string()
            ));
        }
        if self.remaining_balance.is_positive() {
            notes.push(format!(
                "Unpaid balance {} carried forward as a fine.",
                self.remaining_balance.to_rm_string()
            ));
        }

        notes
    }

    /// fixed-layout text receipt
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            RULE.to_string(),
            "            PARKING RECEIPT".to_string(),
            RULE.to_string(),
            field("Plate", self.license_plate.as_str()),
            field("Vehicle Type", &optional_debug(self.vehicle_type.as_ref())),
            field("Spot", &self.spot_label()),
            field(
                "Rate",
                &self
                    .spot_rate
                    .map(|rate| format!("{}/hr", rate.to_rm_string()))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            field("Entry", &timestamp(self.entry_time)),
            field("Exit", &timestamp(self.exit_time)),
            field("Duration", &format!("{} hour(s)", self.duration_hours.normalize())),
            THIN_RULE.to_string(),
            field("Parking Fee", &self.parking_fee.to_rm_string()),
            field("Fines", &self.fine_amount.to_rm_string()),
            field("Total", &self.total_amount.to_rm_string()),
            field(
                "Paid",
                &format!("{} ({})", self.amount_paid.to_rm_string(), self.method),
            ),
            field("Change", &self.change_amount.to_rm_string()),
            field("Balance Due", &self.remaining_balance.to_rm_string()),
            THIN_RULE.to_string(),
        ];

        let notes = self.notes();
        if !notes.is_empty() {
            lines.extend(notes);
            lines.push(THIN_RULE.to_string());
        }

        lines.push(field("Date", &self.payment_date.format("%Y-%m-%d %H:%M:%S").to_string()));
        lines.push(RULE.to_string());
        lines.join("\n")
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn spot_label(&self) -> String {
        match (&self.spot_id, self.spot_type) {
            (Some(id), Some(spot_type)) => format!("{} ({:?})", id, spot_type),
            (Some(id), None) => id.to_string(),
            (None, _) => "-".to_string(),
        }
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

fn field(label: &str, value: &str) -> String {
    format!("{:<14}{}", format!("{}:", label), value)
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn optional_debug<T: fmt::Debug>(value: Option<&T>) -> String {
    value.map(|v| format!("{:?}", v)).unwrap_or_else(|| "-".to_string())
}

/// builder for receipts
#[derive(Debug, Clone)]
pub struct ReceiptBuilder {
    license_plate: LicensePlate,
    vehicle_type: Option<VehicleType>,
    spot_id: Option<SpotId>,
    spot_type: Option<SpotType>,
    spot_rate: Option<Money>,
    entry_time: Option<DateTime<Utc>>,
    exit_time: Option<DateTime<Utc>>,
    duration_hours: Decimal,
    parking_fee: Money,
    fine_amount: Money,
    amount_paid: Money,
    method: PaymentMethod,
    prepaid_reservation: bool,
    reservation_overrun_hours: Option<Decimal>,
    grace_period: bool,
    card_holder: bool,
    cash_compensation: Option<CashCompensation>,
    shortfall_fine: Option<FineId>,
}

impl ReceiptBuilder {
    pub fn new(license_plate: LicensePlate) -> Self {
        Self {
            license_plate,
            vehicle_type: None,
            spot_id: None,
            spot_type: None,
            spot_rate: None,
            entry_time: None,
            exit_time: None,
            duration_hours: Decimal::ZERO,
            parking_fee: Money::ZERO,
            fine_amount: Money::ZERO,
            amount_paid: Money::ZERO,
            method: PaymentMethod::Cash,
            prepaid_reservation: false,
            reservation_overrun_hours: None,
            grace_period: false,
            card_holder: false,
            cash_compensation: None,
            shortfall_fine: None,
        }
    }

    pub fn vehicle_type(mut self, vehicle_type: VehicleType) -> Self {
        self.vehicle_type = Some(vehicle_type);
        self
    }

    /// spot id, type and posted rate together
    pub fn spot(mut self, spot_id: SpotId, spot_type: SpotType, hourly_rate: Money) -> Self {
        self.spot_id = Some(spot_id);
        self.spot_type = Some(spot_type);
        self.spot_rate = Some(hourly_rate);
        self
    }

    pub fn entry_time(mut self, entry_time: Option<DateTime<Utc>>) -> Self {
        self.entry_time = entry_time;
        self
    }

    pub fn exit_time(mut self, exit_time: Option<DateTime<Utc>>) -> Self {
        self.exit_time = exit_time;
        self
    }

    pub fn duration_hours(mut self, hours: Decimal) -> Self {
        self.duration_hours = hours;
        self
    }

    pub fn parking_fee(mut self, fee: Money) -> Self {
        self.parking_fee = fee;
        self
    }

    pub fn fine_amount(mut self, amount: Money) -> Self {
        self.fine_amount = amount;
        self
    }

    pub fn amount_paid(mut self, amount: Money) -> Self {
        self.amount_paid = amount;
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn prepaid_reservation(mut self, prepaid: bool) -> Self {
        self.prepaid_reservation = prepaid;
        self
    }

    pub fn reservation_overrun_hours(mut self, hours: Option<Decimal>) -> Self {
        self.reservation_overrun_hours = hours;
        self
    }

    pub fn grace_period(mut self, grace: bool) -> Self {
        self.grace_period = grace;
        self
    }

    pub fn card_holder(mut self, card_holder: bool) -> Self {
        self.card_holder = card_holder;
        self
    }

    pub fn cash_compensation(mut self, exchange: Option<CashCompensation>) -> Self {
        self.cash_compensation = exchange;
        self
    }

    pub fn shortfall_fine(mut self, fine_id: Option<FineId>) -> Self {
        self.shortfall_fine = fine_id;
        self
    }

    /// compute totals and stamp the payment date
    pub fn build(self, time_provider: &SafeTimeProvider) -> Receipt {
        let total_amount = self.parking_fee + self.fine_amount;

        Receipt {
            license_plate: self.license_plate,
            vehicle_type: self.vehicle_type,
            spot_id: self.spot_id,
            spot_type: self.spot_type,
            spot_rate: self.spot_rate,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            duration_hours: self.duration_hours,
            parking_fee: self.parking_fee,
            fine_amount: self.fine_amount,
            total_amount,
            amount_paid: self.amount_paid,
            remaining_balance: remaining_balance(self.amount_paid, total_amount),
            change_amount: change_amount(self.amount_paid, total_amount),
            method: self.method,
            prepaid_reservation: self.prepaid_reservation,
            reservation_overrun_hours: self.reservation_overrun_hours,
            grace_period: self.grace_period,
            card_holder: self.card_holder,
            cash_compensation: self.cash_compensation,
            shortfall_fine: self.shortfall_fine,
            payment_date: time_provider.now(),
        }
    }
}
