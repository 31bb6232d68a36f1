//! Recording subsystem
//!
//! Session lifecycle, chunk persistence, and finalization into durable
//! recording artifacts:
//! - SessionInfo / SessionStatus metadata model
//! - RecordingStore owning the on-disk tree and the active-session table

pub mod state;
pub mod store;

pub use state::{SessionInfo, SessionStatus};
pub use store::{RecordingStore, StoreError};
