//! figsync: keep a directory of analysis figures organized and reported.
//!
//! Figures are pulled from a remote cluster into a staging directory, filed
//! into category folders based on metadata parsed from their filenames, and
//! summarized in a self-contained HTML report that can be published to a
//! website repository.

pub mod classify;
pub mod clean;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod lock;
pub mod notify;
pub mod organize;
pub mod pipeline;
pub mod publish;
pub mod recency;
pub mod report;
pub mod store;
pub mod sync;

pub use error::{FigsyncError, Result, StepOutcome};
