//! # devdir-sync
//!
//! The reconciliation engine: given a directory repository and a set of
//! partner repositories, keep one mirrored directory issue per qualifying
//! partner issue, synchronize its metadata and lifecycle state, and derive
//! aggregate reward statistics.
//!
//! Call [`pipeline::run`] with a [`pipeline::RunContext`] wired to real or
//! fake collaborators ([`provider`]).

pub mod diff;
pub mod error;
pub mod labels;
pub mod matcher;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod stats;
pub mod unavailable;

pub use error::SyncError;
pub use pipeline::{run, RunContext, RunFailure, RunSummary};
pub use provider::{
    IssueHost, IssuePatch, NullFeed, ProviderError, SnapshotKind, SnapshotStore, SocialFeed,
};
