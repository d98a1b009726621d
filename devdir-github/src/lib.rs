//! # devdir-github
//!
//! GitHub adapter for the reconciliation engine: a blocking REST client
//! implementing the `IssueHost` trait, partner repository selection, and a
//! file-backed snapshot store.

pub mod client;
pub mod error;
pub mod repos;
pub mod snapshot;

pub use client::{GithubClient, RepoInfo};
pub use repos::select_partners;
pub use snapshot::FileSnapshotStore;
