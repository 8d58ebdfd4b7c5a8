use crate::domain::model::{Customer, RentalRecord, Vehicle};
use crate::domain::ports::{LoadedState, Persistence};
use crate::utils::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Process-local backend. Clones share the same state, so a test can keep
/// one handle, hand another to a store, and reopen a fresh store over it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<LoadedState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored state wholesale.
    pub fn seed(&self, state: LoadedState) {
        *self.state.lock() = state;
    }

    pub fn snapshot(&self) -> LoadedState {
        self.state.lock().clone()
    }
}

impl Persistence for MemoryStorage {
    fn load_all(&self) -> Result<LoadedState> {
        Ok(self.snapshot())
    }

    fn append_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        self.state.lock().vehicles.push(vehicle.clone());
        Ok(())
    }

    fn append_customer(&self, customer: &Customer) -> Result<()> {
        self.state.lock().customers.push(customer.clone());
        Ok(())
    }

    fn append_record(&self, record: &RentalRecord) -> Result<()> {
        self.state.lock().records.push(record.clone());
        Ok(())
    }
}
