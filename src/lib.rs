//! Sample and batch composition for soil lab submissions: default
//! propagation, validation, label text, and the lab CSV.

pub mod batches;
pub mod common;
pub mod config;
pub mod export;
pub mod history;
pub mod identifiers;
pub mod labels;
pub mod references;
pub mod samples;
pub mod store;
pub mod submissions;

pub use common::errors::{PortalError, PortalResult};
pub use config::Config;
pub use store::{HttpStore, MemoryStore, SubmissionStore};
pub use submissions::SubmissionSession;

/// Installs the `fmt` subscriber; a second call is a no-op
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

#[cfg(test)]
pub mod test_helpers;
