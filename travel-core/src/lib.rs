pub mod models;
pub mod registration;
pub mod repository;
pub mod validation;

pub use models::{ClientTrip, NewClient, Trip};
pub use registration::{RegistrationOutcome, UnregistrationOutcome};
pub use repository::TravelRepository;
pub use validation::{CreateClientRequest, ValidationErrors};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Storage failure: {0}")]
    Storage(#[source] BoxError),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
