// Handler modules
pub mod setup;
pub mod status;

// Re-export all handler functions
pub use setup::handle_setup;
pub use status::{LiveStatus, check_live_status, handle_status};
