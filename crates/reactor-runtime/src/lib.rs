//! Async runtime for the reactor dashboard.
//!
//! Talks to the prediction backend (or the offline mock), serialises
//! prediction requests through a single worker task and ingests uploads in
//! the background. Everything reports back to the UI over `mpsc` channels.

pub mod prediction;
pub mod upload_worker;
pub mod worker;

pub use reactor_core as core;
pub use reactor_data as data;
