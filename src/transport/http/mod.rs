pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod diagnostics;
    pub mod health;
    pub mod ipfs;
    pub mod records;
    pub mod students;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
