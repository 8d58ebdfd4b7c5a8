use crate::core::store::RecordStore;
use crate::domain::model::{Customer, RecordKind, RentalRecord, Vehicle, VehicleStatus};
use crate::domain::ports::Persistence;
use crate::utils::error::{RentalError, Result};
use chrono::NaiveDate;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;

/// Status a vehicle must be in for `kind`, and the status it moves to.
fn transition(kind: RecordKind) -> (VehicleStatus, VehicleStatus) {
    match kind {
        RecordKind::Rent => (VehicleStatus::Available, VehicleStatus::Rented),
        RecordKind::Return => (VehicleStatus::Rented, VehicleStatus::Available),
    }
}

/// Drives the AVAILABLE ⇄ RENTED state machine over a [`RecordStore`].
///
/// The store sits behind a mutex; each rent or return (status check, status
/// write, record append and persistence) happens under a single lock.
pub struct RentalEngine<P: Persistence> {
    store: Mutex<RecordStore<P>>,
}

impl<P: Persistence> RentalEngine<P> {
    pub fn new(store: RecordStore<P>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Lock the store for lookups and listings.
    pub fn store(&self) -> MutexGuard<'_, RecordStore<P>> {
        self.store.lock()
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) -> Result<bool> {
        self.store.lock().add_vehicle(vehicle)
    }

    pub fn add_customer(&self, customer: Customer) -> Result<bool> {
        self.store.lock().add_customer(customer)
    }

    /// Rent an AVAILABLE vehicle. `Ok(false)` if it is in any other state.
    pub fn rent(
        &self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        amount: Decimal,
    ) -> Result<bool> {
        self.apply(plate, customer_id, date, amount, RecordKind::Rent)
    }

    /// Return a RENTED vehicle. Any registered customer may return it.
    pub fn return_vehicle(
        &self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        fees: Decimal,
    ) -> Result<bool> {
        self.apply(plate, customer_id, date, fees, RecordKind::Return)
    }

    fn apply(
        &self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        amount: Decimal,
        kind: RecordKind,
    ) -> Result<bool> {
        if amount < Decimal::ZERO {
            return Err(RentalError::ValidationError {
                message: format!("{} amount cannot be negative: {}", kind, amount),
            });
        }

        let mut store = self.store.lock();
        let (plate, status) = {
            let vehicle =
                store
                    .find_vehicle_by_plate(plate)
                    .ok_or_else(|| RentalError::UnknownVehicle {
                        plate: plate.trim().to_string(),
                    })?;
            let canonical = vehicle.license_plate().unwrap_or(plate).to_string();
            (canonical, vehicle.status())
        };
        if store.find_customer_by_id(customer_id).is_none() {
            return Err(RentalError::UnknownCustomer { id: customer_id });
        }

        let (required, next) = transition(kind);
        if status != required {
            tracing::info!(
                "Cannot {} vehicle {}: status is {}, expected {}",
                kind.to_string().to_lowercase(),
                plate,
                status,
                required
            );
            return Ok(false);
        }

        let record = RentalRecord::new(&plate, customer_id, date, amount, kind);
        store.commit_transition(record, next)?;
        tracing::info!(
            "{} recorded for vehicle {} (customer {}, amount {})",
            kind,
            plate,
            customer_id,
            amount
        );
        Ok(true)
    }

    /// Move a vehicle into a side state such as MAINTENANCE.
    ///
    /// RENTED is only reachable through [`rent`](Self::rent), and a rented
    /// vehicle only leaves that state through a return, so both yield `Ok(false)`.
    pub fn set_status(&self, plate: &str, status: VehicleStatus) -> Result<bool> {
        let mut store = self.store.lock();
        let current = store
            .find_vehicle_by_plate(plate)
            .map(|vehicle| vehicle.status())
            .ok_or_else(|| RentalError::UnknownVehicle {
                plate: plate.trim().to_string(),
            })?;

        if status == VehicleStatus::Rented || current == VehicleStatus::Rented {
            return Ok(false);
        }

        store.set_vehicle_status(plate, status)?;
        tracing::info!("Vehicle {} status changed {} -> {}", plate, current, status);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::domain::ports::{LoadedState, PersistMode};

    fn engine() -> RentalEngine<MemoryStorage> {
        let store = RecordStore::open(MemoryStorage::new(), PersistMode::BestEffort).unwrap();
        let engine = RentalEngine::new(store);
        engine
            .add_vehicle(
                Vehicle::car("Toyota", "Camry", 2020, 5)
                    .with_plate("CAR123")
                    .unwrap(),
            )
            .unwrap();
        engine.add_customer(Customer::new(1, "John Doe")).unwrap();
        engine
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    /// Loads CAR123 and customer 1, optionally already rented, but cannot append records.
    struct ReadOnlyHistory {
        rented: bool,
    }

    impl Persistence for ReadOnlyHistory {
        fn load_all(&self) -> Result<LoadedState> {
            let records = if self.rented {
                vec![RentalRecord::new("CAR123", 1, today(), Decimal::ONE, RecordKind::Rent)]
            } else {
                Vec::new()
            };
            Ok(LoadedState {
                vehicles: vec![Vehicle::car("Toyota", "Camry", 2020, 5).with_plate("CAR123")?],
                customers: vec![Customer::new(1, "John Doe")],
                records,
            })
        }

        fn append_vehicle(&self, _vehicle: &Vehicle) -> Result<()> {
            Ok(())
        }

        fn append_customer(&self, _customer: &Customer) -> Result<()> {
            Ok(())
        }

        fn append_record(&self, _record: &RentalRecord) -> Result<()> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    fn unwritable(rented: bool, mode: PersistMode) -> RentalEngine<ReadOnlyHistory> {
        RentalEngine::new(RecordStore::open(ReadOnlyHistory { rented }, mode).unwrap())
    }

    fn car_status<P: Persistence>(engine: &RentalEngine<P>) -> VehicleStatus {
        engine
            .store()
            .find_vehicle_by_plate("CAR123")
            .unwrap()
            .status()
    }

    fn status(engine: &RentalEngine<MemoryStorage>) -> VehicleStatus {
        engine
            .store()
            .find_vehicle_by_plate("CAR123")
            .unwrap()
            .status()
    }

    #[test]
    fn test_rent_and_return_round_trip() {
        let engine = engine();
        assert_eq!(status(&engine), VehicleStatus::Available);

        assert!(engine.rent("CAR123", 1, today(), Decimal::new(100, 0)).unwrap());
        assert_eq!(status(&engine), VehicleStatus::Rented);

        assert!(!engine.rent("CAR123", 1, today(), Decimal::new(100, 0)).unwrap());
        assert_eq!(status(&engine), VehicleStatus::Rented);

        assert!(engine
            .return_vehicle("CAR123", 1, today(), Decimal::new(20, 0))
            .unwrap());
        assert_eq!(status(&engine), VehicleStatus::Available);

        assert!(!engine
            .return_vehicle("CAR123", 1, today(), Decimal::new(20, 0))
            .unwrap());
        assert_eq!(engine.store().records().len(), 2);
    }

    #[test]
    fn test_records_reference_vehicle_and_customer() {
        let engine = engine();
        engine.rent("car123", 1, today(), Decimal::new(100, 0)).unwrap();

        let store = engine.store();
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].plate(), "CAR123");
        assert_eq!(records[0].customer_id(), 1);
        assert_eq!(records[0].kind(), RecordKind::Rent);
        assert_eq!(records[0].amount(), Decimal::new(100, 0));
    }

    #[test]
    fn test_failed_transition_does_not_record() {
        let engine = engine();
        assert!(!engine
            .return_vehicle("CAR123", 1, today(), Decimal::ZERO)
            .unwrap());
        assert!(engine.store().records().is_empty());
    }

    #[test]
    fn test_unknown_references_are_errors() {
        let engine = engine();
        let err = engine
            .rent("ZZZ999", 1, today(), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, RentalError::UnknownVehicle { .. }));

        let err = engine.rent("CAR123", 9, today(), Decimal::ONE).unwrap_err();
        assert!(matches!(err, RentalError::UnknownCustomer { id: 9 }));
        assert_eq!(status(&engine), VehicleStatus::Available);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let engine = engine();
        let err = engine
            .rent("CAR123", 1, today(), Decimal::new(-5, 0))
            .unwrap_err();
        assert!(matches!(err, RentalError::ValidationError { .. }));
        assert_eq!(status(&engine), VehicleStatus::Available);
    }

    #[test]
    fn test_any_customer_may_return() {
        let engine = engine();
        engine.add_customer(Customer::new(2, "Jane Roe")).unwrap();
        engine.rent("CAR123", 1, today(), Decimal::ONE).unwrap();
        assert!(engine.return_vehicle("CAR123", 2, today(), Decimal::ZERO).unwrap());
    }

    #[test]
    fn test_side_states_block_renting() {
        let engine = engine();
        assert!(engine
            .set_status("CAR123", VehicleStatus::Maintenance)
            .unwrap());
        assert!(!engine.rent("CAR123", 1, today(), Decimal::ONE).unwrap());

        assert!(engine.set_status("CAR123", VehicleStatus::Available).unwrap());
        assert!(engine.rent("CAR123", 1, today(), Decimal::ONE).unwrap());

        assert!(!engine
            .set_status("CAR123", VehicleStatus::OutOfService)
            .unwrap());
        assert!(!engine.set_status("CAR123", VehicleStatus::Rented).unwrap());
        assert_eq!(status(&engine), VehicleStatus::Rented);
    }

    #[test]
    fn test_best_effort_transition_stands_when_record_append_fails() {
        let engine = unwritable(false, PersistMode::BestEffort);

        assert!(engine.rent("CAR123", 1, today(), Decimal::new(100, 0)).unwrap());
        assert_eq!(car_status(&engine), VehicleStatus::Rented);
        assert_eq!(engine.store().records().len(), 1);

        assert!(engine
            .return_vehicle("CAR123", 1, today(), Decimal::ZERO)
            .unwrap());
        assert_eq!(car_status(&engine), VehicleStatus::Available);
        assert_eq!(engine.store().records().len(), 2);
    }

    #[test]
    fn test_write_ahead_rent_changes_nothing_when_record_append_fails() {
        let engine = unwritable(false, PersistMode::WriteAhead);

        let err = engine
            .rent("CAR123", 1, today(), Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, RentalError::PersistenceError { .. }));
        assert_eq!(car_status(&engine), VehicleStatus::Available);
        assert!(engine.store().records().is_empty());
    }

    #[test]
    fn test_write_ahead_return_changes_nothing_when_record_append_fails() {
        let engine = unwritable(true, PersistMode::WriteAhead);
        assert_eq!(car_status(&engine), VehicleStatus::Rented);
        assert_eq!(engine.store().records().len(), 1);

        let err = engine
            .return_vehicle("CAR123", 1, today(), Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, RentalError::PersistenceError { .. }));
        assert_eq!(car_status(&engine), VehicleStatus::Rented);
        assert_eq!(engine.store().records().len(), 1);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = std::sync::Arc::new(engine());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || engine.rent("CAR123", 1, today(), Decimal::ONE).unwrap())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|rented| *rented)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(engine.store().records().len(), 1);
    }
}
