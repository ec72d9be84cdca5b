//! Pipeline orchestration: resolve → generate → probe → trim → archive.
//!
//! A [`Pipeline`] owns everything a run shares: the validated config, the
//! fetcher, a dedicated rayon pool sized to `probe.concurrency`, the
//! cancellation token and an optional event channel. Each stage is also
//! exposed on its own so the CLI can stop after any of them.
//!
//! Stage boundaries are plain values. Candidates are generated once and then
//! only borrowed, probe results reference them, and the archive stage reads
//! the survivors along with the bodies the probes downloaded.
//!
//! A run whose token fires ends in [`HarvestError::Cancelled`], whatever the
//! stage results would otherwise have been.

use crate::archive::{self, ArchiveSettings, HarvestOutput, Prefetched};
use crate::candidates;
use crate::config::PipelineConfig;
use crate::error::HarvestError;
use crate::fetch::{Fetcher, HttpFetcher, transport_chain};
use crate::identifier;
use crate::imaging::{CropRect, Quality, TrimSettings};
use crate::probe::{self, ProbeReport, ProbeSettings};
use crate::strategy::Strategy;
use crate::types::{CandidateDescriptor, Identifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress reported while a pipeline runs.
///
/// Sent over an mpsc channel; the CLI renders them on a printer thread.
/// `Probed` events arrive in completion order, everything else in rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Resolved {
        identifier: String,
    },
    Generated {
        candidates: usize,
    },
    Probed {
        rank: usize,
        id: String,
        reachable: bool,
        width: u32,
        height: u32,
        elapsed_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<String>,
    },
    ProbeFinished {
        attempted: usize,
        accepted: usize,
        cancelled: bool,
    },
    Archived {
        rank: usize,
        id: String,
        filename: String,
        bytes: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        crop: Option<CropRect>,
    },
    ItemFailed {
        rank: usize,
        id: String,
        reason: String,
    },
}

pub struct Pipeline {
    config: PipelineConfig,
    strategies: Vec<Strategy>,
    fetcher: Arc<dyn Fetcher>,
    pool: rayon::ThreadPool,
    cancel: CancelToken,
    events: Option<Sender<PipelineEvent>>,
}

impl Pipeline {
    /// Build a pipeline that fetches over HTTP.
    pub fn new(config: PipelineConfig) -> Result<Self, HarvestError> {
        let fetcher = Arc::new(HttpFetcher::new(
            config.probe.user_agent.clone(),
            config.probe.max_bytes,
        ));
        Self::with_fetcher(config, fetcher)
    }

    /// Build a pipeline around a caller-supplied fetcher.
    pub fn with_fetcher(
        config: PipelineConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, HarvestError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.probe.concurrency)
            .thread_name(|i| format!("artgrab-worker-{i}"))
            .build()?;
        Ok(Self {
            strategies: config.strategies(),
            config,
            fetcher,
            pool,
            cancel: CancelToken::new(),
            events: None,
        })
    }

    /// Report progress on `tx`. The channel closes when the pipeline drops.
    pub fn with_events(mut self, tx: Sender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// A handle that cancels in-flight and pending work when fired.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }

    pub fn resolve(&self, input: &str) -> Result<Identifier, HarvestError> {
        let id = identifier::resolve(input)?;
        self.emit(PipelineEvent::Resolved {
            identifier: id.canonical.clone(),
        });
        Ok(id)
    }

    pub fn candidates(&self, id: &Identifier) -> Result<Vec<CandidateDescriptor>, HarvestError> {
        let generated = candidates::generate(id, &self.strategies);
        if generated.is_empty() {
            return Err(HarvestError::NoCandidatesGenerated(id.canonical.clone()));
        }
        self.emit(PipelineEvent::Generated {
            candidates: generated.len(),
        });
        Ok(generated)
    }

    pub fn probe<'c>(&self, candidates: &'c [CandidateDescriptor]) -> ProbeReport<'c> {
        let settings = ProbeSettings {
            timeout: self.config.probe.timeout(),
        };
        let report = probe::probe_all(
            &self.pool,
            &self.fetcher,
            candidates,
            &settings,
            &self.cancel,
            self.events.as_ref(),
        );
        self.emit(PipelineEvent::ProbeFinished {
            attempted: report.attempted,
            accepted: report.accepted().len(),
            cancelled: report.cancelled,
        });
        report
    }

    /// Settings the archive stage runs with, derived from config.
    pub fn archive_settings(&self) -> ArchiveSettings {
        let trim = &self.config.trim;
        ArchiveSettings {
            prefix: self.config.archive.prefix.clone(),
            trim: trim.enabled.then(|| TrimSettings {
                threshold: trim.threshold,
                quality: Quality::new(trim.quality),
            }),
            transports: transport_chain(&self.config.archive.fallback_proxies),
            timeout: self.config.probe.timeout(),
        }
    }

    /// Fetch, trim and bundle `selected`, stamping the archive with the
    /// current time.
    pub fn archive(
        &self,
        id: &Identifier,
        selected: &[&CandidateDescriptor],
    ) -> Result<HarvestOutput, HarvestError> {
        self.archive_at(id, selected, Utc::now())
    }

    pub fn archive_at(
        &self,
        id: &Identifier,
        selected: &[&CandidateDescriptor],
        timestamp: DateTime<Utc>,
    ) -> Result<HarvestOutput, HarvestError> {
        self.archive_with(id, selected, &Prefetched::new(), timestamp)
    }

    fn archive_with(
        &self,
        id: &Identifier,
        selected: &[&CandidateDescriptor],
        prefetched: &Prefetched<'_>,
        timestamp: DateTime<Utc>,
    ) -> Result<HarvestOutput, HarvestError> {
        let settings = self.archive_settings();
        let manifest = archive::collect(
            &self.pool,
            self.fetcher.as_ref(),
            id,
            selected,
            prefetched,
            &settings,
            &self.cancel,
            self.events.as_ref(),
        );
        if self.cancel.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }
        archive::finish(manifest, id, selected.len(), &settings.prefix, timestamp)
    }

    /// Run every stage for one input.
    pub fn run(&self, input: &str) -> Result<HarvestOutput, HarvestError> {
        let id = self.resolve(input)?;
        let candidates = self.candidates(&id)?;
        let report = self.probe(&candidates);
        if report.cancelled {
            return Err(HarvestError::Cancelled);
        }
        let survivors = report.survivors()?;
        tracing::info!(
            identifier = %id,
            generated = candidates.len(),
            accepted = survivors.len(),
            "probe stage complete"
        );
        self.archive_with(&id, &survivors, &report.bodies(), Utc::now())
    }
}
