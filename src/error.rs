use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, PayoutError>;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("event {0} not found")]
    EventNotFound(Uuid),
    #[error("application {0} not found")]
    ApplicationNotFound(Uuid),
    #[error("no wallet for worker {0}")]
    WalletNotFound(Uuid),
    #[error("event {0} is already finished")]
    AlreadyFinished(Uuid),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("store error: {0}")]
    StoreError(String),
}

#[cfg(feature = "storage-postgres")]
impl From<sqlx::Error> for PayoutError {
    fn from(err: sqlx::Error) -> Self {
        PayoutError::StoreError(err.to_string())
    }
}
