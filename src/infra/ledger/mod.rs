//! Ledger boundary for the directory and registry contracts.
//!
//! Mutations arrive as signed transactions; the ledger recovers the caller from
//! the signature and lets the contracts decide whether that caller is an admin.
//! Reads mirror the contracts' public view functions.

pub mod local;
pub mod transaction;

use crate::crypto::signer::KeyError;
use crate::domain::address::Address;
use crate::domain::directory::{DirectoryError, Subject, SubjectPage};
use crate::domain::registry::{Credential, RegistryError};
use async_trait::async_trait;
use primitive_types::H256;
use serde::Serialize;
use thiserror::Error;

pub use local::LocalLedger;
pub use transaction::{Command, LedgerEvent, Receipt, SignedTransaction};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
    #[error("transaction signature rejected: {0}")]
    InvalidSignature(#[from] KeyError),
    #[error("transaction {0:?} was already executed")]
    DuplicateTransaction(H256),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("ledger state persistence failed: {0}")]
    Persistence(String),
    #[error("transaction encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contract {
    Directory,
    Registry,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatus {
    pub block_number: u64,
    pub subject_count: u64,
    pub credential_holders: u64,
    pub event_count: u64,
    pub directory_admins: Vec<Address>,
    pub registry_admins: Vec<Address>,
    pub state_file: Option<String>,
}

#[derive(Clone, Debug, Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggedEvent {
    pub block_number: u64,
    pub tx_hash: H256,
    pub timestamp: i64,
    pub event: LedgerEvent,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Executes one signed command atomically.
    async fn submit(&self, tx: SignedTransaction) -> Result<Receipt, LedgerError>;

    async fn subject(&self, address: Address) -> Result<Subject, LedgerError>;
    async fn is_registered(&self, address: Address) -> Result<bool, LedgerError>;
    async fn subject_count(&self) -> Result<u64, LedgerError>;
    async fn subject_range(&self, start: i64, count: i64) -> Result<Vec<Address>, LedgerError>;
    async fn subject_page(&self, start: i64, count: i64) -> Result<SubjectPage, LedgerError>;

    async fn credential(&self, subject: Address, index: u64) -> Result<Credential, LedgerError>;
    async fn credential_count(&self, subject: Address) -> Result<u64, LedgerError>;
    async fn verify_credential(
        &self,
        subject: Address,
        index: u64,
        record_hash: H256,
    ) -> Result<bool, LedgerError>;

    async fn is_admin(&self, contract: Contract, address: Address) -> Result<bool, LedgerError>;
    async fn status(&self) -> Result<LedgerStatus, LedgerError>;
    async fn recent_events(&self, limit: usize) -> Result<Vec<LoggedEvent>, LedgerError>;
}
