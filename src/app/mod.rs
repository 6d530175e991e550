//! Service layer: validates requests, signs commands and choreographs the
//! ledger and the content store. Holds no domain state of its own.

pub mod error;
pub mod records_service;
pub mod signing;
pub mod student_service;

pub use error::ServiceError;
pub use records_service::{IntegrityReport, RecordContent, RecordView, RecordWrite, RecordsService};
pub use signing::{SigningKey, TransactionSigner};
pub use student_service::StudentService;
