//! Contract logic and data model: subject directory, credential registry and
//! the off-chain payload shape.

pub mod access;
pub mod address;
pub mod directory;
pub mod payload;
pub mod registry;

pub use access::AdminRoles;
pub use address::Address;
pub use directory::{Subject, SubjectDirectory, SubjectPage, SubjectProfile};
pub use payload::{PdfDocument, StoredPayload};
pub use registry::{Credential, CredentialRegistry};
