pub mod engine;
pub mod store;

pub use crate::domain::model::{
    Customer, RecordKind, RentalRecord, Vehicle, VehicleKind, VehicleStatus,
};
pub use crate::domain::ports::{ConfigProvider, LoadedState, PersistMode, Persistence};
pub use crate::utils::error::Result;
pub use engine::RentalEngine;
pub use store::RecordStore;
