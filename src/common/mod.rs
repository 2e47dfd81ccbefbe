pub mod config;
pub mod errors;
pub mod progress;

pub use config::DuffelConfig;
pub use errors::TransferError;
pub use progress::{CategoryProgress, TableProgress, TransferPhase, TransferProgress};
