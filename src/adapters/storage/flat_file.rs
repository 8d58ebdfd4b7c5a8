use crate::domain::model::{Customer, RecordKind, RentalRecord, Vehicle, VehicleKind};
use crate::domain::ports::{ConfigProvider, LoadedState, Persistence};
use crate::utils::error::{RentalError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const DEFAULT_VEHICLES_FILE: &str = "vehicles.txt";
pub const DEFAULT_CUSTOMERS_FILE: &str = "customers.txt";
pub const DEFAULT_RECORDS_FILE: &str = "rental_records.txt";

/// `kind,plate,make,model,year,seats,has_sidecar,cargo_capacity`
#[derive(Debug, Serialize, Deserialize)]
struct VehicleRow {
    kind: String,
    plate: String,
    make: String,
    model: String,
    year: i32,
    seats: Option<u8>,
    has_sidecar: Option<bool>,
    cargo_capacity: Option<f64>,
}

impl VehicleRow {
    fn from_vehicle(vehicle: &Vehicle) -> Result<Self> {
        let plate = vehicle
            .license_plate()
            .ok_or_else(|| RentalError::ValidationError {
                message: "cannot persist a vehicle without a license plate".to_string(),
            })?;
        let (seats, has_sidecar, cargo_capacity) = match vehicle.kind() {
            VehicleKind::Car { seats } => (Some(*seats), None, None),
            VehicleKind::Motorcycle { has_sidecar } => (None, Some(*has_sidecar), None),
            VehicleKind::Truck { cargo_capacity } => (None, None, Some(*cargo_capacity)),
        };
        Ok(Self {
            kind: vehicle.kind().label().to_string(),
            plate: plate.to_string(),
            make: vehicle.make().to_string(),
            model: vehicle.model().to_string(),
            year: vehicle.year(),
            seats,
            has_sidecar,
            cargo_capacity,
        })
    }

    fn into_vehicle(self) -> Result<Vehicle> {
        fn missing(kind: &str, field: &str) -> RentalError {
            RentalError::ValidationError {
                message: format!("{} row is missing {}", kind, field),
            }
        }

        let vehicle = match self.kind.to_ascii_lowercase().as_str() {
            "car" => {
                let seats = self.seats.ok_or_else(|| missing("Car", "seats"))?;
                Vehicle::car(&self.make, &self.model, self.year, seats)
            }
            "motorcycle" => {
                let has_sidecar = self
                    .has_sidecar
                    .ok_or_else(|| missing("Motorcycle", "has_sidecar"))?;
                Vehicle::motorcycle(&self.make, &self.model, self.year, has_sidecar)
            }
            "truck" => {
                let capacity = self
                    .cargo_capacity
                    .ok_or_else(|| missing("Truck", "cargo_capacity"))?;
                Vehicle::truck(&self.make, &self.model, self.year, capacity)
            }
            other => {
                return Err(RentalError::ValidationError {
                    message: format!("unknown vehicle kind '{}'", other),
                })
            }
        };
        vehicle.with_plate(&self.plate)
    }
}

/// `id,name`
#[derive(Debug, Serialize, Deserialize)]
struct CustomerRow {
    id: i32,
    name: String,
}

/// `kind,plate,customer_id,date,amount`
#[derive(Debug, Serialize, Deserialize)]
struct RecordRow {
    kind: RecordKind,
    plate: String,
    customer_id: i32,
    date: NaiveDate,
    amount: String,
}

impl RecordRow {
    fn into_record(self) -> Result<RentalRecord> {
        let amount = self
            .amount
            .parse::<Decimal>()
            .map_err(|e| RentalError::ValidationError {
                message: format!("invalid amount '{}': {}", self.amount, e),
            })?;
        Ok(RentalRecord::new(
            &self.plate,
            self.customer_id,
            self.date,
            amount,
            self.kind,
        ))
    }
}

/// Three append-only delimited files under one data directory.
#[derive(Debug, Clone)]
pub struct FlatFileStorage {
    data_dir: PathBuf,
    vehicles_file: String,
    customers_file: String,
    records_file: String,
    delimiter: u8,
}

impl FlatFileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            vehicles_file: DEFAULT_VEHICLES_FILE.to_string(),
            customers_file: DEFAULT_CUSTOMERS_FILE.to_string(),
            records_file: DEFAULT_RECORDS_FILE.to_string(),
            delimiter: b',',
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            data_dir: config.data_dir().to_path_buf(),
            vehicles_file: config.vehicles_file().to_string(),
            customers_file: config.customers_file().to_string(),
            records_file: config.records_file().to_string(),
            delimiter: config.delimiter(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn append_row<T: Serialize>(&self, file: &str, row: &T) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(file);
        let handle = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(handle);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Rows that fail to parse are skipped with a warning instead of aborting the load.
    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            tracing::debug!("{} does not exist yet, treating as empty", path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for result in reader.deserialize::<T>() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    let line = e.position().map(|pos| pos.line()).unwrap_or_default();
                    tracing::warn!(
                        "Skipping malformed line {} in {}: {}",
                        line,
                        path.display(),
                        e
                    );
                }
            }
        }
        Ok(rows)
    }
}

fn convert_rows<R, T>(file: &str, rows: Vec<R>, convert: fn(R) -> Result<T>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match convert(row) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!("Skipping invalid entry in {}: {}", file, e);
                None
            }
        })
        .collect()
}

impl Persistence for FlatFileStorage {
    fn load_all(&self) -> Result<LoadedState> {
        let vehicle_rows = self.read_rows::<VehicleRow>(&self.vehicles_file)?;
        let vehicles = convert_rows(&self.vehicles_file, vehicle_rows, VehicleRow::into_vehicle);

        let customers = self
            .read_rows::<CustomerRow>(&self.customers_file)?
            .into_iter()
            .map(|row| Customer::new(row.id, &row.name))
            .collect();

        let record_rows = self.read_rows::<RecordRow>(&self.records_file)?;
        let records = convert_rows(&self.records_file, record_rows, RecordRow::into_record);

        Ok(LoadedState {
            vehicles,
            customers,
            records,
        })
    }

    fn append_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let row = VehicleRow::from_vehicle(vehicle)?;
        self.append_row(&self.vehicles_file, &row)
    }

    fn append_customer(&self, customer: &Customer) -> Result<()> {
        let row = CustomerRow {
            id: customer.customer_id(),
            name: customer.name().to_string(),
        };
        self.append_row(&self.customers_file, &row)
    }

    fn append_record(&self, record: &RentalRecord) -> Result<()> {
        let row = RecordRow {
            kind: record.kind(),
            plate: record.plate().to_string(),
            customer_id: record.customer_id(),
            date: record.date(),
            amount: record.amount().to_string(),
        };
        self.append_row(&self.records_file, &row)
    }
}
