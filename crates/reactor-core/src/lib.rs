//! Core domain layer for the polymer reactor dashboard.
//!
//! Holds the shared data model, the error type, number and size formatting,
//! CLI settings and the persisted preferences store, the mock-data
//! generators used for offline preview, MWD curve synthesis, and the
//! freehand target-distribution capture used by the inverse-problem screen.

pub mod error;
pub mod formatting;
pub mod inverse;
pub mod mock_data;
pub mod models;
pub mod mwd;
pub mod preferences;
pub mod settings;
pub mod sketch;
