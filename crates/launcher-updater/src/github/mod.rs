//! GitHub Releases client and wire types.
//!
//! The registry is any endpoint speaking the GitHub Releases JSON format.

pub mod client;
pub mod types;

pub use client::GitHubClient;
pub use types::{GitHubAsset, GitHubRelease};
