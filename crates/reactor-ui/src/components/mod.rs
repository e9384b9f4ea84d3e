//! Reusable line-level widgets shared by several screens.

pub mod banner;
pub mod header;
pub mod progress_bar;
