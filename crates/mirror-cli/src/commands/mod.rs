//! Command implementations for mirror-cli

pub mod init;
pub mod status;
pub mod sync;

pub use init::run_init;
pub use status::run_status;
pub use sync::run_sync;
