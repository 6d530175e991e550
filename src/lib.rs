pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{RecordsService, ServiceError, StudentService, TransactionSigner};
pub use crypto::hashing::{content_address, record_hash};
pub use crypto::signer::AdminKey;
pub use domain::address::Address;
pub use infra::config::Config;
pub use infra::ipfs::ContentStore;
pub use infra::ledger::{Ledger, LocalLedger};
