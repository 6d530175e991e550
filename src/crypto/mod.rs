pub mod hashing;
pub mod signer;

pub use hashing::{content_address, is_valid_content_address, record_hash};
pub use signer::AdminKey;
