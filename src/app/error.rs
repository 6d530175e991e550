use crate::crypto::signer::KeyError;
use crate::domain::address::AddressParseError;
use crate::domain::directory::DirectoryError;
use crate::domain::payload::PayloadError;
use crate::domain::registry::RegistryError;
use crate::infra::ipfs::StoreError;
use crate::infra::ledger::LedgerError;
use thiserror::Error;

/// Error surfaced by the service layer. Each variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Detail is logged, never returned to the caller.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn missing_field(field: &str) -> Self {
        ServiceError::Validation(format!("Missing required field: {}", field))
    }

    /// Message safe to echo to an untrusted caller.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::LedgerUnavailable(_) => "Ledger unavailable, retry later".to_string(),
            ServiceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DirectoryError> for ServiceError {
    fn from(err: DirectoryError) -> Self {
        let message = err.to_string();
        match err {
            DirectoryError::Unauthorized(_) => ServiceError::Unauthorized(message),
            DirectoryError::InvalidAddress(_)
            | DirectoryError::InvalidRange { .. }
            | DirectoryError::EmptyField(_) => ServiceError::Validation(message),
            DirectoryError::NotRegistered(_) | DirectoryError::NotFound(_) => {
                ServiceError::NotFound(message)
            }
            DirectoryError::AlreadyRegistered(_)
            | DirectoryError::AlreadyInState { .. }
            | DirectoryError::AlreadyAdmin(_) => ServiceError::Conflict(message),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::Unauthorized(_) => ServiceError::Unauthorized(message),
            RegistryError::InvalidAddress(_) | RegistryError::EmptyContentHash => {
                ServiceError::Validation(message)
            }
            RegistryError::NotFound { .. } => ServiceError::NotFound(message),
            RegistryError::AlreadyRevoked { .. } | RegistryError::AlreadyAdmin(_) => {
                ServiceError::Conflict(message)
            }
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Directory(e) => e.into(),
            LedgerError::Registry(e) => e.into(),
            LedgerError::InvalidSignature(e) => ServiceError::Unauthorized(e.to_string()),
            LedgerError::MalformedTransaction(m) => ServiceError::Validation(m),
            e @ LedgerError::DuplicateTransaction(_) => ServiceError::Conflict(e.to_string()),
            LedgerError::Unavailable(m) => ServiceError::LedgerUnavailable(m),
            e @ (LedgerError::Persistence(_) | LedgerError::Encoding(_)) => {
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            e @ StoreError::InvalidFormat(_) => ServiceError::Validation(e.to_string()),
            e @ StoreError::NotFound(_) => ServiceError::NotFound(e.to_string()),
            e @ (StoreError::Backend { .. } | StoreError::Serialization(_)) => {
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

impl From<PayloadError> for ServiceError {
    fn from(err: PayloadError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<KeyError> for ServiceError {
    fn from(err: KeyError) -> Self {
        ServiceError::Validation(format!("Invalid privateKey: {}", err))
    }
}

impl From<AddressParseError> for ServiceError {
    fn from(err: AddressParseError) -> Self {
        ServiceError::Validation(format!("Invalid address: {}", err))
    }
}
