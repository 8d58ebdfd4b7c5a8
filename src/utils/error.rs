use thiserror::Error;

#[derive(Error, Debug)]
pub enum RentalError {
    #[error("Invalid license plate format: '{plate}'")]
    InvalidPlate { plate: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unknown vehicle: {plate}")]
    UnknownVehicle { plate: String },

    #[error("Unknown customer: {id}")]
    UnknownCustomer { id: i32 },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Lookup,
    Persistence,
    Configuration,
}

impl RentalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RentalError::InvalidPlate { .. } | RentalError::ValidationError { .. } => {
                ErrorCategory::Validation
            }
            RentalError::UnknownVehicle { .. } | RentalError::UnknownCustomer { .. } => {
                ErrorCategory::Lookup
            }
            RentalError::PersistenceError { .. }
            | RentalError::IoError(_)
            | RentalError::CsvError(_)
            | RentalError::SerializationError(_) => ErrorCategory::Persistence,
            RentalError::ConfigError { .. } | RentalError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RentalError::InvalidPlate { plate } => format!(
                "'{}' is not a valid license plate (expected 3 letters followed by 3 digits)",
                plate.trim()
            ),
            RentalError::UnknownVehicle { plate } => {
                format!("No vehicle with plate {} is registered", plate)
            }
            RentalError::UnknownCustomer { id } => {
                format!("No customer with ID {} is registered", id)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Check the input format and try again",
            ErrorCategory::Lookup => "List vehicles or customers to find a valid key",
            ErrorCategory::Persistence => {
                "Check that the data directory exists and is writable"
            }
            ErrorCategory::Configuration => "Review the configuration file and CLI flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, RentalError>;
