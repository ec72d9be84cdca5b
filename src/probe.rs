//! Probe engine: which candidates are real, decodable images?
//!
//! Stage 3 of the pipeline. Every candidate gets exactly one attempt: fetch
//! the URL, decode the body, and accept it iff both dimensions are non-zero.
//! Transport errors, non-success statuses, decode errors and timeouts are
//! all plain failures. There is no retry here.
//!
//! ## Bounded parallelism
//!
//! Probes run on the pipeline's dedicated rayon pool, whose size is the
//! configured `concurrency`. Each pool worker hands the blocking fetch/decode
//! to a helper thread and waits on a channel with a deadline, so a probe
//! never holds its worker longer than `timeout` (plus one cancellation poll
//! interval). A helper that misses the deadline is detached; its late result
//! is dropped.
//!
//! ## Ordering
//!
//! Results are collected with an indexed `par_iter().map().collect()`, so
//! [`ProbeReport::results`] is in generation-rank order no matter which
//! probe finishes first.
//!
//! ## Cancellation
//!
//! Probes not yet started are skipped and in-flight probes stop waiting as
//! soon as the [`CancelToken`] fires. The report then carries only the
//! results that had resolved, with `cancelled` set.
//!
//! ## Reuse
//!
//! An accepted result keeps the body it was decoded from, so the archive
//! stage can trim it without downloading the image a second time.

use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::imaging::decode;
use crate::pipeline::{CancelToken, PipelineEvent};
use crate::types::CandidateDescriptor;
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// How often a waiting probe re-checks the cancellation token.
const CANCEL_POLL: Duration = Duration::from_millis(25);

/// Outcome of probing one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult<'a> {
    pub candidate: &'a CandidateDescriptor,
    pub reachable: bool,
    /// Decoded dimensions; zero when unreachable.
    pub width: u32,
    pub height: u32,
    #[serde(rename = "elapsed_ms", serialize_with = "millis")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// The fetched body; present only when reachable.
    #[serde(skip)]
    pub body: Option<Arc<[u8]>>,
}

fn millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// All resolved probe results for a batch, in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport<'a> {
    pub results: Vec<ProbeResult<'a>>,
    /// Number of candidates submitted.
    pub attempted: usize,
    /// The batch was cancelled; `results` may be partial.
    pub cancelled: bool,
}

impl<'a> ProbeReport<'a> {
    /// Reachable candidates, in rank order.
    pub fn accepted(&self) -> Vec<&'a CandidateDescriptor> {
        self.results
            .iter()
            .filter(|r| r.reachable)
            .map(|r| r.candidate)
            .collect()
    }

    /// Like [`accepted`](Self::accepted), but an empty set is reported as
    /// [`HarvestError::AllProbesFailed`].
    pub fn survivors(&self) -> Result<Vec<&'a CandidateDescriptor>, HarvestError> {
        let accepted = self.accepted();
        if accepted.is_empty() {
            return Err(HarvestError::AllProbesFailed {
                attempted: self.attempted,
            });
        }
        Ok(accepted)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.reachable).count()
    }

    /// Bodies of the accepted results, keyed by candidate id.
    pub fn bodies(&self) -> HashMap<&'a str, Arc<[u8]>> {
        self.results
            .iter()
            .filter_map(|r| Some((r.candidate.id.as_str(), r.body.clone()?)))
            .collect()
    }
}

/// Probe tuning that is not carried by the pool itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
        }
    }
}

/// Probe every candidate on `pool`, returning results in rank order.
pub fn probe_all<'a>(
    pool: &rayon::ThreadPool,
    fetcher: &Arc<dyn Fetcher>,
    candidates: &'a [CandidateDescriptor],
    settings: &ProbeSettings,
    cancel: &CancelToken,
    events: Option<&Sender<PipelineEvent>>,
) -> ProbeReport<'a> {
    let outcomes: Vec<Option<ProbeResult<'a>>> = pool.install(|| {
        candidates
            .par_iter()
            .map(|candidate| {
                let result = probe_one(fetcher, candidate, settings.timeout, cancel)?;
                if let Some(tx) = events {
                    tx.send(PipelineEvent::Probed {
                        rank: candidate.rank,
                        id: candidate.id.clone(),
                        reachable: result.reachable,
                        width: result.width,
                        height: result.height,
                        elapsed_ms: result.elapsed.as_millis() as u64,
                        failure: result.failure.clone(),
                    })
                    .ok();
                }
                Some(result)
            })
            .collect()
    });

    let results: Vec<ProbeResult<'a>> = outcomes.into_iter().flatten().collect();
    let report = ProbeReport {
        attempted: candidates.len(),
        cancelled: cancel.is_cancelled(),
        results,
    };
    tracing::debug!(
        attempted = report.attempted,
        accepted = report.accepted().len(),
        cancelled = report.cancelled,
        "probe batch finished"
    );
    report
}

/// Run one probe. `None` means the batch was cancelled before it resolved.
fn probe_one<'a>(
    fetcher: &Arc<dyn Fetcher>,
    candidate: &'a CandidateDescriptor,
    timeout: Duration,
    cancel: &CancelToken,
) -> Option<ProbeResult<'a>> {
    if cancel.is_cancelled() {
        return None;
    }
    let started = Instant::now();
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(fetcher);
    let url = candidate.url.clone();
    let spawned = std::thread::Builder::new()
        .name("artgrab-probe".into())
        .spawn(move || {
            let outcome = worker
                .fetch(&url, timeout)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    let (width, height) = decode(&bytes)
                        .map(|img| (img.width(), img.height()))
                        .map_err(|e| e.to_string())?;
                    Ok((width, height, Arc::<[u8]>::from(bytes)))
                });
            // The receiver is gone if the probe already timed out.
            tx.send(outcome).ok();
        });

    let outcome = match spawned {
        Ok(_) => {
            let deadline = started + timeout;
            loop {
                if cancel.is_cancelled() {
                    return None;
                }
                let now = Instant::now();
                if now >= deadline {
                    break Err(format!("timed out after {} ms", timeout.as_millis()));
                }
                match rx.recv_timeout((deadline - now).min(CANCEL_POLL)) {
                    Ok(outcome) => break outcome,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        break Err("probe worker exited without a result".to_string());
                    }
                }
            }
        }
        Err(e) => Err(format!("failed to start probe worker: {e}")),
    };

    let elapsed = started.elapsed();
    Some(match outcome {
        Ok((width, height, body)) => ProbeResult {
            candidate,
            reachable: true,
            width,
            height,
            elapsed,
            failure: None,
            body: Some(body),
        },
        Err(reason) => {
            tracing::debug!(id = %candidate.id, url = %candidate.url, %reason, "probe failed");
            ProbeResult {
                candidate,
                reachable: false,
                width: 0,
                height: 0,
                elapsed,
                failure: Some(reason),
                body: None,
            }
        }
    })
}
