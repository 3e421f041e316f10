//! Stored runs: job/artifact persistence, run-to-run diffs and their routes.

pub mod diff;
pub mod handlers;
pub mod models;
pub mod storage;
