//! # devdir-social
//!
//! Social feed adapter: announces new directory postings to a
//! Mastodon-compatible status API and retracts announcements when postings
//! close. Configured entirely from the environment; absent credentials
//! disable the feed rather than failing the run.

pub mod feed;

pub use feed::HttpFeed;
