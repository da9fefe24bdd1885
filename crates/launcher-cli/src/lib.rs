//! CLI library components for the DDALAB launcher.

pub mod logging;
