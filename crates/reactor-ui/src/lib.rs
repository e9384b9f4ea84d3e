//! Terminal UI layer for the polymer reactor dashboard.
//!
//! Provides themes, the header/banner/progress components, one module per
//! screen, and the application event loop built on [`ratatui`].

pub mod app;
pub mod components;
pub mod screens;
pub mod themes;

pub use reactor_core as core;
