use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use tempfile::TempDir;
use vehicle_rental::{
    Customer, FlatFileStorage, MemoryStorage, PersistMode, RecordKind, RecordStore, RentalEngine,
    RentalError, Vehicle, VehicleKind, VehicleStatus,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn open_flat(dir: &TempDir) -> RentalEngine<FlatFileStorage> {
    let store = RecordStore::open(FlatFileStorage::new(dir.path()), PersistMode::BestEffort)
        .expect("store opens");
    RentalEngine::new(store)
}

#[test]
fn test_car123_scenario_produces_two_records() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_flat(&temp_dir);

    let car = Vehicle::car("Toyota", "Camry", 2020, 5)
        .with_plate("CAR123")
        .unwrap();
    assert!(engine.add_vehicle(car).unwrap());
    assert!(engine.add_customer(Customer::new(1, "John Doe")).unwrap());

    assert!(engine.rent("CAR123", 1, date(1), Decimal::new(1000, 1)).unwrap());
    {
        let store = engine.store();
        let rents: Vec<_> = store
            .records()
            .iter()
            .filter(|record| record.kind() == RecordKind::Rent)
            .collect();
        assert_eq!(rents.len(), 1);
        assert_eq!(rents[0].plate(), "CAR123");
        assert_eq!(rents[0].customer_id(), 1);
    }

    assert!(engine
        .return_vehicle("CAR123", 1, date(3), Decimal::new(200, 1))
        .unwrap());

    let store = engine.store();
    assert_eq!(store.records().len(), 2);
    assert_eq!(store.records()[1].kind(), RecordKind::Return);
    assert_eq!(store.records()[1].amount(), Decimal::new(20, 0));
}

#[test]
fn test_reload_reconstructs_equivalent_state() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_flat(&temp_dir);
        engine
            .add_vehicle(
                Vehicle::car("toyota", "camry", 2020, 5)
                    .with_plate("car123")
                    .unwrap(),
            )
            .unwrap();
        engine
            .add_vehicle(
                Vehicle::truck("Volvo", "FH16", 2018, 18.5)
                    .with_plate("TRK900")
                    .unwrap(),
            )
            .unwrap();
        engine.add_customer(Customer::new(1, "John Doe")).unwrap();
        engine.add_customer(Customer::new(2, "Roe, Jane")).unwrap();
        engine.rent("CAR123", 1, date(1), Decimal::new(10050, 2)).unwrap();
        engine.rent("TRK900", 2, date(2), Decimal::new(300, 0)).unwrap();
        engine
            .return_vehicle("TRK900", 2, date(4), Decimal::ZERO)
            .unwrap();
    }

    let engine = open_flat(&temp_dir);
    let store = engine.store();

    assert_eq!(store.vehicles().len(), 2);
    assert_eq!(store.customers().len(), 2);
    assert_eq!(store.records().len(), 3);

    let car = store.find_vehicle_by_plate("car123").unwrap();
    assert_eq!(car.make(), "Toyota");
    assert_eq!(car.model(), "Camry");
    assert_eq!(car.year(), 2020);
    assert_eq!(car.kind(), &VehicleKind::Car { seats: 5 });
    assert_eq!(car.status(), VehicleStatus::Rented);

    let truck = store.find_vehicle_by_plate("TRK900").unwrap();
    assert_eq!(truck.kind(), &VehicleKind::Truck { cargo_capacity: 18.5 });
    assert_eq!(truck.status(), VehicleStatus::Available);

    assert_eq!(store.find_customer_by_id(2).unwrap().name(), "Roe, Jane");
    assert_eq!(store.records()[0].amount(), Decimal::new(10050, 2));
    assert_eq!(store.records()[0].date(), date(1));
    assert_eq!(store.records_by_customer("jane").len(), 2);
}

#[test]
fn test_rented_vehicle_stays_rented_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_flat(&temp_dir);
        engine
            .add_vehicle(Vehicle::motorcycle("Ducati", "Monster", 2021, false).with_plate("MOT001").unwrap())
            .unwrap();
        engine.add_customer(Customer::new(5, "Ana Lima")).unwrap();
        assert!(engine.rent("MOT001", 5, date(1), Decimal::ONE).unwrap());
    }

    let engine = open_flat(&temp_dir);
    assert!(!engine.rent("MOT001", 5, date(2), Decimal::ONE).unwrap());
    assert!(engine
        .return_vehicle("mot001", 5, date(3), Decimal::ZERO)
        .unwrap());
}

#[test]
fn test_records_with_unknown_references_are_dropped_on_load() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("vehicles.txt"),
        "Car,CAR123,Toyota,Camry,2020,5,,\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("customers.txt"), "1,John Doe\n").unwrap();
    fs::write(
        temp_dir.path().join("rental_records.txt"),
        "RENT,CAR123,1,2024-06-01,100\nRENT,GHO000,1,2024-06-01,100\nRETURN,CAR123,77,2024-06-02,20\n",
    )
    .unwrap();

    let engine = open_flat(&temp_dir);
    let store = engine.store();
    assert_eq!(store.records().len(), 1);
    assert_eq!(
        store.find_vehicle_by_plate("CAR123").unwrap().status(),
        VehicleStatus::Rented
    );
}

#[test]
fn test_duplicate_adds_are_not_persisted_twice() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_flat(&temp_dir);
    let car = || {
        Vehicle::car("Toyota", "Camry", 2020, 5)
            .with_plate("CAR123")
            .unwrap()
    };

    assert!(engine.add_vehicle(car()).unwrap());
    assert!(!engine.add_vehicle(car()).unwrap());
    assert!(engine.add_customer(Customer::new(1, "John Doe")).unwrap());
    assert!(!engine.add_customer(Customer::new(1, "John Doe")).unwrap());

    let vehicles = fs::read_to_string(temp_dir.path().join("vehicles.txt")).unwrap();
    let customers = fs::read_to_string(temp_dir.path().join("customers.txt")).unwrap();
    assert_eq!(vehicles.lines().count(), 1);
    assert_eq!(customers.lines().count(), 1);
}

#[test]
fn test_write_ahead_surfaces_unwritable_storage() {
    let temp_dir = TempDir::new().unwrap();
    // A regular file where the data directory should be makes every append fail.
    let blocker = temp_dir.path().join("blocked");
    fs::write(&blocker, "not a directory").unwrap();

    let store = RecordStore::open(FlatFileStorage::new(&blocker), PersistMode::WriteAhead).unwrap();
    let engine = RentalEngine::new(store);

    let err = engine
        .add_customer(Customer::new(1, "John Doe"))
        .unwrap_err();
    assert!(matches!(err, RentalError::PersistenceError { .. }));
    assert!(engine.store().find_customer_by_id(1).is_none());

    let store =
        RecordStore::open(FlatFileStorage::new(&blocker), PersistMode::BestEffort).unwrap();
    let engine = RentalEngine::new(store);
    assert!(engine.add_customer(Customer::new(1, "John Doe")).unwrap());
    assert!(engine.store().find_customer_by_id(1).is_some());
}

#[test]
fn test_memory_backend_round_trip() {
    let storage = MemoryStorage::new();
    {
        let store = RecordStore::open(storage.clone(), PersistMode::WriteAhead).unwrap();
        let engine = RentalEngine::new(store);
        engine
            .add_vehicle(Vehicle::car("Kia", "Rio", 2022, 4).with_plate("KIA222").unwrap())
            .unwrap();
        engine.add_customer(Customer::new(3, "Li Wei")).unwrap();
        engine.rent("KIA222", 3, date(9), Decimal::new(45, 0)).unwrap();
    }

    let engine = RentalEngine::new(RecordStore::open(storage, PersistMode::WriteAhead).unwrap());
    let store = engine.store();
    assert_eq!(store.vehicles().len(), 1);
    assert_eq!(store.customers().len(), 1);
    assert_eq!(store.records_by_vehicle("kia222").len(), 1);
}
