use crate::domain::model::{Customer, RecordKind, RentalRecord, Vehicle, VehicleStatus};
use crate::domain::ports::{LoadedState, PersistMode, Persistence};
use crate::utils::error::{RentalError, Result};
use std::collections::HashMap;

fn plate_key(plate: &str) -> String {
    plate.trim().to_ascii_uppercase()
}

/// Authoritative in-memory collections, indexed by plate and customer id.
///
/// Every mutation is mirrored to the [`Persistence`] backend according to
/// the configured [`PersistMode`].
pub struct RecordStore<P: Persistence> {
    persistence: P,
    mode: PersistMode,
    vehicles: Vec<Vehicle>,
    customers: Vec<Customer>,
    records: Vec<RentalRecord>,
    plate_index: HashMap<String, usize>,
    customer_index: HashMap<i32, usize>,
}

impl<P: Persistence> RecordStore<P> {
    /// Load vehicles, then customers, then records from `persistence`.
    ///
    /// In best-effort mode an unreadable backend is logged and the store
    /// starts empty; in write-ahead mode the load error is returned.
    pub fn open(persistence: P, mode: PersistMode) -> Result<Self> {
        let loaded = match persistence.load_all() {
            Ok(loaded) => loaded,
            Err(e) if mode == PersistMode::BestEffort => {
                tracing::error!("Failed to load persisted state, starting empty: {}", e);
                LoadedState::default()
            }
            Err(e) => {
                return Err(RentalError::PersistenceError {
                    message: format!("failed to load persisted state: {}", e),
                })
            }
        };

        let mut store = Self {
            persistence,
            mode,
            vehicles: Vec::new(),
            customers: Vec::new(),
            records: Vec::new(),
            plate_index: HashMap::new(),
            customer_index: HashMap::new(),
        };
        store.rehydrate(loaded);
        Ok(store)
    }

    fn rehydrate(&mut self, loaded: LoadedState) {
        for vehicle in loaded.vehicles {
            let Some(key) = vehicle.license_plate().map(plate_key) else {
                tracing::warn!("Skipping persisted vehicle without a license plate");
                continue;
            };
            if self.plate_index.contains_key(&key) {
                tracing::warn!("Skipping duplicate persisted vehicle {}", key);
                continue;
            }
            self.plate_index.insert(key, self.vehicles.len());
            self.vehicles.push(vehicle);
        }

        for customer in loaded.customers {
            if self.customer_index.contains_key(&customer.customer_id()) {
                tracing::warn!(
                    "Skipping duplicate persisted customer {}",
                    customer.customer_id()
                );
                continue;
            }
            self.customer_index
                .insert(customer.customer_id(), self.customers.len());
            self.customers.push(customer);
        }

        let mut dropped = 0usize;
        for record in loaded.records {
            let vehicle = self.plate_index.get(&plate_key(record.plate())).copied();
            let customer_known = self.customer_index.contains_key(&record.customer_id());
            let Some(index) = vehicle.filter(|_| customer_known) else {
                tracing::warn!(
                    "Dropping rental record with unresolved reference (plate {}, customer {})",
                    record.plate(),
                    record.customer_id()
                );
                dropped += 1;
                continue;
            };

            // Replaying history restores the status the vehicle had when the last run ended.
            let status = match record.kind() {
                RecordKind::Rent => VehicleStatus::Rented,
                RecordKind::Return => VehicleStatus::Available,
            };
            self.vehicles[index].set_status(status);
            self.records.push(record);
        }

        tracing::info!(
            vehicles = self.vehicles.len(),
            customers = self.customers.len(),
            records = self.records.len(),
            dropped,
            "Loaded rental state"
        );
    }

    fn persist_before<F>(&self, what: &str, append: F) -> Result<()>
    where
        F: FnOnce(&P) -> Result<()>,
    {
        if self.mode == PersistMode::WriteAhead {
            append(&self.persistence).map_err(|e| RentalError::PersistenceError {
                message: format!("failed to persist {}: {}", what, e),
            })?;
        }
        Ok(())
    }

    fn persist_after<F>(&self, what: &str, append: F)
    where
        F: FnOnce(&P) -> Result<()>,
    {
        if self.mode == PersistMode::BestEffort {
            if let Err(e) = append(&self.persistence) {
                tracing::error!("Failed to persist {}: {}", what, e);
            }
        }
    }

    /// Insert a vehicle. `Ok(false)` when its plate is already registered.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<bool> {
        let key = vehicle
            .license_plate()
            .map(plate_key)
            .ok_or_else(|| RentalError::ValidationError {
                message: "vehicle has no license plate".to_string(),
            })?;

        if self.plate_index.contains_key(&key) {
            tracing::info!("Vehicle with plate {} already exists", key);
            return Ok(false);
        }

        let what = format!("vehicle {}", key);
        self.persist_before(&what, |p| p.append_vehicle(&vehicle))?;

        let index = self.vehicles.len();
        self.plate_index.insert(key, index);
        self.vehicles.push(vehicle);

        self.persist_after(&what, |p| p.append_vehicle(&self.vehicles[index]));
        tracing::debug!("Added {}", what);
        Ok(true)
    }

    /// Insert a customer. `Ok(false)` when the id is already registered.
    pub fn add_customer(&mut self, customer: Customer) -> Result<bool> {
        let id = customer.customer_id();
        if self.customer_index.contains_key(&id) {
            tracing::info!("Customer with ID {} already exists", id);
            return Ok(false);
        }

        let what = format!("customer {}", id);
        self.persist_before(&what, |p| p.append_customer(&customer))?;

        let index = self.customers.len();
        self.customer_index.insert(id, index);
        self.customers.push(customer);

        self.persist_after(&what, |p| p.append_customer(&self.customers[index]));
        tracing::debug!("Added {}", what);
        Ok(true)
    }

    /// Append `record` and move its vehicle to `status` as one step.
    pub(crate) fn commit_transition(
        &mut self,
        record: RentalRecord,
        status: VehicleStatus,
    ) -> Result<()> {
        let index = self
            .plate_index
            .get(&plate_key(record.plate()))
            .copied()
            .ok_or_else(|| RentalError::UnknownVehicle {
                plate: record.plate().to_string(),
            })?;
        if !self.customer_index.contains_key(&record.customer_id()) {
            return Err(RentalError::UnknownCustomer {
                id: record.customer_id(),
            });
        }

        let what = format!("{} record for {}", record.kind(), record.plate());
        self.persist_before(&what, |p| p.append_record(&record))?;

        self.vehicles[index].set_status(status);
        let position = self.records.len();
        self.records.push(record);

        self.persist_after(&what, |p| p.append_record(&self.records[position]));
        Ok(())
    }

    pub(crate) fn set_vehicle_status(&mut self, plate: &str, status: VehicleStatus) -> Result<()> {
        let index = self
            .plate_index
            .get(&plate_key(plate))
            .copied()
            .ok_or_else(|| RentalError::UnknownVehicle {
                plate: plate.to_string(),
            })?;
        self.vehicles[index].set_status(status);
        Ok(())
    }

    pub fn find_vehicle_by_plate(&self, plate: &str) -> Option<&Vehicle> {
        self.plate_index
            .get(&plate_key(plate))
            .map(|&index| &self.vehicles[index])
    }

    pub fn find_customer_by_id(&self, id: i32) -> Option<&Customer> {
        self.customer_index
            .get(&id)
            .map(|&index| &self.customers[index])
    }

    /// Records whose customer's name contains `name` (case-insensitive).
    pub fn records_by_customer(&self, name: &str) -> Vec<&RentalRecord> {
        let needle = name.to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                self.find_customer_by_id(record.customer_id())
                    .map(|customer| customer.name().to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn records_by_vehicle(&self, plate: &str) -> Vec<&RentalRecord> {
        let key = plate_key(plate);
        self.records
            .iter()
            .filter(|record| record.plate().eq_ignore_ascii_case(&key))
            .collect()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn available_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter().filter(|vehicle| vehicle.is_available())
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn records(&self) -> &[RentalRecord] {
        &self.records
    }

    pub fn persist_mode(&self) -> PersistMode {
        self.mode
    }
}
