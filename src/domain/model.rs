use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::{RentalError, Result};

static PLATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}[0-9]{3}$").expect("plate pattern is valid"));

/// True iff the trimmed plate is exactly three ASCII letters followed by three digits.
pub fn validate_plate(plate: &str) -> bool {
    let trimmed = plate.trim();
    !trimmed.is_empty() && PLATE_PATTERN.is_match(trimmed)
}

/// First character uppercased, the rest lowercased. `None` for empty input.
pub fn capitalize(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let first = chars.next()?;
    let mut result: String = first.to_uppercase().collect();
    result.push_str(&chars.as_str().to_lowercase());
    Some(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    Reserved,
    Rented,
    Maintenance,
    OutOfService,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Reserved => "RESERVED",
            VehicleStatus::Rented => "RENTED",
            VehicleStatus::Maintenance => "MAINTENANCE",
            VehicleStatus::OutOfService => "OUT_OF_SERVICE",
        };
        f.write_str(label)
    }
}

/// Kind-specific attributes. Everything else lives on [`Vehicle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VehicleKind {
    Car { seats: u8 },
    Motorcycle { has_sidecar: bool },
    Truck { cargo_capacity: f64 },
}

impl VehicleKind {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleKind::Car { .. } => "Car",
            VehicleKind::Motorcycle { .. } => "Motorcycle",
            VehicleKind::Truck { .. } => "Truck",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    license_plate: Option<String>,
    make: String,
    model: String,
    year: i32,
    status: VehicleStatus,
    kind: VehicleKind,
}

impl Vehicle {
    fn new(make: &str, model: &str, year: i32, kind: VehicleKind) -> Self {
        Self {
            license_plate: None,
            make: capitalize(make.trim()).unwrap_or_default(),
            model: capitalize(model.trim()).unwrap_or_default(),
            year,
            status: VehicleStatus::Available,
            kind,
        }
    }

    pub fn car(make: &str, model: &str, year: i32, seats: u8) -> Self {
        Self::new(make, model, year, VehicleKind::Car { seats })
    }

    pub fn motorcycle(make: &str, model: &str, year: i32, has_sidecar: bool) -> Self {
        Self::new(make, model, year, VehicleKind::Motorcycle { has_sidecar })
    }

    pub fn truck(make: &str, model: &str, year: i32, cargo_capacity: f64) -> Self {
        Self::new(make, model, year, VehicleKind::Truck { cargo_capacity })
    }

    /// Builder-style plate assignment for freshly constructed vehicles.
    pub fn with_plate(mut self, plate: &str) -> Result<Self> {
        self.set_license_plate(plate)?;
        Ok(self)
    }

    /// Validates before assigning, so a rejected plate leaves the old value in place.
    pub fn set_license_plate(&mut self, plate: &str) -> Result<()> {
        if !validate_plate(plate) {
            return Err(RentalError::InvalidPlate {
                plate: plate.to_string(),
            });
        }
        self.license_plate = Some(plate.trim().to_ascii_uppercase());
        Ok(())
    }

    pub fn license_plate(&self) -> Option<&str> {
        self.license_plate.as_deref()
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn kind(&self) -> &VehicleKind {
        &self.kind
    }

    pub(crate) fn set_status(&mut self, status: VehicleStatus) {
        self.status = status;
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn info(&self) -> String {
        format!(
            "| {} | {} | {} | {} | {} | {} |",
            self.kind.label(),
            self.license_plate.as_deref().unwrap_or("-"),
            self.make,
            self.model,
            self.year,
            self.status
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    customer_id: i32,
    name: String,
}

impl Customer {
    pub fn new(customer_id: i32, name: &str) -> Self {
        Self {
            customer_id,
            name: name.trim().to_string(),
        }
    }

    pub fn customer_id(&self) -> i32 {
        self.customer_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Customer ID: {} | Name: {}", self.customer_id, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Rent,
    Return,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Rent => f.write_str("RENT"),
            RecordKind::Return => f.write_str("RETURN"),
        }
    }
}

/// One rent or return event. Vehicle and customer are referenced by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRecord {
    plate: String,
    customer_id: i32,
    date: NaiveDate,
    amount: Decimal,
    kind: RecordKind,
}

impl RentalRecord {
    pub(crate) fn new(
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        amount: Decimal,
        kind: RecordKind,
    ) -> Self {
        Self {
            plate: plate.to_ascii_uppercase(),
            customer_id,
            date,
            amount,
            kind,
        }
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }

    pub fn customer_id(&self) -> i32 {
        self.customer_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }
}

impl fmt::Display for RentalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Plate: {} | Customer: {} | Date: {} | Amount: ${:.2}",
            self.kind, self.plate, self.customer_id, self.date, self.amount
        )
    }
}
