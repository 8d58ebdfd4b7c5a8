//! Vehicle rental record keeping.
//!
//! - [`domain`]: vehicles, customers, rental records and the persistence port
//! - [`core`]: the record store and the rent/return state machine
//! - [`adapters`]: flat-file and in-memory persistence backends
//! - [`config`]: TOML and command-line configuration
//! - [`app`]: interactive menu and listing output

pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::storage::{FlatFileStorage, MemoryStorage};
pub use crate::core::{
    Customer, PersistMode, Persistence, RecordKind, RecordStore, RentalEngine, RentalRecord,
    Vehicle, VehicleKind, VehicleStatus,
};
pub use utils::error::{RentalError, Result};
