//! Whole-batch error taxonomy.
//!
//! Per-candidate failures (a probe that times out, an image that will not
//! decode, a trim that leaves nothing) never surface here. They are counted
//! and reported in the stage results instead. Only conditions that leave the
//! caller with nothing to show are raised as [`HarvestError`].

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("invalid identifier: {0:?} is not a 7-9 digit id or a recognised URL")]
    InvalidIdentifier(String),
    #[error("no candidates generated for {0}")]
    NoCandidatesGenerated(String),
    #[error("all {attempted} probes failed")]
    AllProbesFailed { attempted: usize },
    #[error("archive is empty: all {failed} items failed")]
    ArchiveEmpty { failed: usize },
    /// The run's cancellation token fired before it could finish.
    #[error("run cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
