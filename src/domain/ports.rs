use crate::domain::model::{Customer, RentalRecord, Vehicle};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a persistence backend holds, in load order.
#[derive(Debug, Clone, Default)]
pub struct LoadedState {
    pub vehicles: Vec<Vehicle>,
    pub customers: Vec<Customer>,
    pub records: Vec<RentalRecord>,
}

impl LoadedState {
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.customers.is_empty() && self.records.is_empty()
    }
}

/// Append-only storage behind the record store.
///
/// Missing storage loads as an empty [`LoadedState`]. Each append writes one
/// entity and must be visible to a later `load_all`.
pub trait Persistence: Send {
    fn load_all(&self) -> Result<LoadedState>;
    fn append_vehicle(&self, vehicle: &Vehicle) -> Result<()>;
    fn append_customer(&self, customer: &Customer) -> Result<()>;
    fn append_record(&self, record: &RentalRecord) -> Result<()>;
}

/// How a failed append interacts with the in-memory commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// Commit in memory, then append; append failures are logged only.
    #[default]
    BestEffort,
    /// Append first; a failed append aborts the mutation.
    WriteAhead,
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &Path;
    fn vehicles_file(&self) -> &str;
    fn customers_file(&self) -> &str;
    fn records_file(&self) -> &str;
    fn delimiter(&self) -> u8;
    fn persist_mode(&self) -> PersistMode;
}
