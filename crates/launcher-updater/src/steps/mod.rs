//! Individual steps of the update process.
//!
//! Each step is implemented as a separate module that the [`Updater`]
//! orchestrates.
//!
//! [`Updater`]: crate::Updater

pub mod download;
pub mod extract;
