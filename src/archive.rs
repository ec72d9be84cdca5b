//! Archive builder: fetch, trim and bundle the surviving candidates.
//!
//! Stage 5 of the pipeline. Every selected candidate is produced
//! independently on the pipeline's pool:
//!
//! 1. when trimming is enabled, take the body the probe already downloaded
//!    (see [`Prefetched`]), or fetch it if there is none; then decode, trim
//!    and re-encode as JPEG
//! 2. when trimming is disabled, fetch the raw bytes (direct, then any
//!    configured fallback proxies) and keep them under the URL's extension
//!
//! A failed item is recorded in the [`ArchiveManifest`] and skipped. It is
//! never replaced with a different candidate. A candidate selected more than
//! once is produced once; the repeats are recorded as failures, so member
//! filenames stay unique. Production is parallel, but
//! the output is written by a single writer in rank order once every item
//! has resolved, so archive contents are deterministic.
//!
//! ## Output shape
//!
//! | Requested | Succeeded | Result |
//! |---|---|---|
//! | any | 0 | [`HarvestError::ArchiveEmpty`] |
//! | 1 | 1 | the single image file itself |
//! | > 1 | ≥ 1 | `.tar.gz` holding every successful member |

use crate::error::HarvestError;
use crate::fetch::{Fetcher, Transport, fetch_with_fallback};
use crate::imaging::{CropRect, TrimSettings, process_candidate};
use crate::naming::{archive_filename, extension_from_url, member_filename};
use crate::pipeline::{CancelToken, PipelineEvent};
use crate::types::{CandidateDescriptor, Identifier, Summary};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Bodies already downloaded by the probe stage, keyed by candidate id.
pub type Prefetched<'a> = HashMap<&'a str, Arc<[u8]>>;

/// Settings for one archive run.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    /// Leading filename component.
    pub prefix: String,
    /// `None` archives the raw fetched bytes.
    pub trim: Option<TrimSettings>,
    /// Ordered fetch transports; direct first.
    pub transports: Vec<Transport>,
    /// Per-attempt fetch timeout.
    pub timeout: Duration,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            prefix: "artgrab".to_string(),
            trim: Some(TrimSettings::default()),
            transports: vec![Transport::Direct],
            timeout: Duration::from_secs(8),
        }
    }
}

/// One successfully produced member.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    pub filename: String,
    pub candidate_id: String,
    pub rank: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size: usize,
    pub sha256: String,
    /// Region kept by the trim; `None` when trimming was disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
}

/// A candidate that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub candidate_id: String,
    pub rank: usize,
    pub reason: String,
}

/// Per-item outcomes of an archive run, each list in rank order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveManifest {
    pub entries: Vec<ArchiveEntry>,
    pub failures: Vec<ItemFailure>,
}

impl ArchiveManifest {
    pub fn succeeded(&self) -> usize {
        self.entries.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self, requested: usize) -> Summary {
        Summary {
            requested,
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }
}

/// What the archive stage delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// One requested item: the image file itself.
    Image,
    /// Several requested items bundled as `.tar.gz`.
    Archive,
}

/// Final pipeline output: a named payload plus its accounting.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestOutput {
    pub kind: PayloadKind,
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub summary: Summary,
    pub manifest: ArchiveManifest,
}

/// Produce every selected candidate on `pool` and report per-item outcomes.
///
/// Items not yet started when `cancel` fires are recorded as failures, as
/// are repeated selections of the same candidate.
#[allow(clippy::too_many_arguments)]
pub fn collect(
    pool: &rayon::ThreadPool,
    fetcher: &dyn Fetcher,
    identifier: &Identifier,
    selected: &[&CandidateDescriptor],
    prefetched: &Prefetched<'_>,
    settings: &ArchiveSettings,
    cancel: &CancelToken,
    events: Option<&Sender<PipelineEvent>>,
) -> ArchiveManifest {
    let mut seen = HashSet::new();
    let repeated: Vec<bool> = selected
        .iter()
        .map(|c| !seen.insert(c.id.as_str()))
        .collect();

    let outcomes: Vec<Result<ArchiveEntry, String>> = pool.install(|| {
        selected
            .par_iter()
            .zip(repeated.par_iter())
            .map(|(candidate, &repeat)| {
                if repeat {
                    return Err("duplicate selection".to_string());
                }
                if cancel.is_cancelled() {
                    return Err("cancelled".to_string());
                }
                let body = prefetched.get(candidate.id.as_str()).map(|b| &b[..]);
                produce(fetcher, identifier, candidate, body, settings)
            })
            .collect()
    });

    let mut manifest = ArchiveManifest::default();
    for (candidate, outcome) in selected.iter().zip(outcomes) {
        match outcome {
            Ok(entry) => {
                if let Some(tx) = events {
                    tx.send(PipelineEvent::Archived {
                        rank: entry.rank,
                        id: entry.candidate_id.clone(),
                        filename: entry.filename.clone(),
                        bytes: entry.size,
                        crop: entry.crop,
                    })
                    .ok();
                }
                manifest.entries.push(entry);
            }
            Err(reason) => {
                tracing::warn!(id = %candidate.id, %reason, "archive item failed");
                if let Some(tx) = events {
                    tx.send(PipelineEvent::ItemFailed {
                        rank: candidate.rank,
                        id: candidate.id.clone(),
                        reason: reason.clone(),
                    })
                    .ok();
                }
                manifest.failures.push(ItemFailure {
                    candidate_id: candidate.id.clone(),
                    rank: candidate.rank,
                    reason,
                });
            }
        }
    }
    manifest
}

/// Produce one member. `prefetched` is only used when trimming; the raw path
/// always fetches.
fn produce(
    fetcher: &dyn Fetcher,
    identifier: &Identifier,
    candidate: &CandidateDescriptor,
    prefetched: Option<&[u8]>,
    settings: &ArchiveSettings,
) -> Result<ArchiveEntry, String> {
    let fetched: Cow<'_, [u8]> = match prefetched.filter(|_| settings.trim.is_some()) {
        Some(body) => Cow::Borrowed(body),
        None => Cow::Owned(
            fetch_with_fallback(
                fetcher,
                &candidate.url,
                &settings.transports,
                settings.timeout,
            )
            .map_err(|e| e.to_string())?,
        ),
    };

    let (bytes, ext, crop) = match &settings.trim {
        Some(trim) => {
            let processed =
                process_candidate(candidate, &fetched, trim).map_err(|e| e.to_string())?;
            let encoded = processed.encode().map_err(|e| e.to_string())?;
            (encoded, "jpg", Some(processed.crop))
        }
        None => (fetched.into_owned(), extension_from_url(&candidate.url), None),
    };

    Ok(ArchiveEntry {
        filename: member_filename(&settings.prefix, identifier, candidate, ext),
        candidate_id: candidate.id.clone(),
        rank: candidate.rank,
        size: bytes.len(),
        sha256: format!("{:x}", Sha256::digest(&bytes)),
        bytes,
        crop,
    })
}

/// Turn a manifest into the deliverable payload.
///
/// `requested` is the number of candidates handed to the archive stage; it
/// alone decides between a single image and a bundle.
pub fn finish(
    manifest: ArchiveManifest,
    identifier: &Identifier,
    requested: usize,
    prefix: &str,
    timestamp: DateTime<Utc>,
) -> Result<HarvestOutput, HarvestError> {
    if manifest.entries.is_empty() {
        return Err(HarvestError::ArchiveEmpty {
            failed: manifest.failed(),
        });
    }
    let summary = manifest.summary(requested);

    if requested == 1 {
        let entry = &manifest.entries[0];
        return Ok(HarvestOutput {
            kind: PayloadKind::Image,
            filename: entry.filename.clone(),
            bytes: entry.bytes.clone(),
            summary,
            manifest,
        });
    }

    let bytes = write_tar_gz(&manifest.entries, timestamp.timestamp().max(0) as u64)?;
    tracing::info!(
        members = manifest.entries.len(),
        size = bytes.len(),
        "archive written"
    );
    Ok(HarvestOutput {
        kind: PayloadKind::Archive,
        filename: archive_filename(prefix, identifier, timestamp),
        bytes,
        summary,
        manifest,
    })
}

/// Write `entries` as a gzip-compressed tar, in slice order.
pub fn write_tar_gz(entries: &[ArchiveEntry], mtime: u64) -> io::Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        builder.append_data(&mut header, &entry.filename, entry.bytes.as_slice())?;
    }
    builder.into_inner()?.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::{MockFetcher, MockResponse};
    use crate::fetch::transport_chain;
    use crate::identifier::resolve;
    use crate::test_helpers::{Bands, letterboxed, noise, png_bytes, solid};
    use chrono::TimeZone;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap()
    }

    fn candidate(rank: usize, ext: &str) -> CandidateDescriptor {
        CandidateDescriptor {
            id: format!("80057281-mock-{rank:02}"),
            url: format!("https://mock/80057281/{rank}.{ext}"),
            width: 10,
            height: 10,
            kind: "poster".into(),
            source: "mock".into(),
            strategy: "mock".into(),
            variant: format!("v{rank}"),
            rank,
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    fn run(
        fetcher: &MockFetcher,
        selected: &[&CandidateDescriptor],
        settings: &ArchiveSettings,
    ) -> (ArchiveManifest, Identifier) {
        let id = resolve("80057281").unwrap();
        let manifest = collect(
            &pool(),
            fetcher,
            &id,
            selected,
            &Prefetched::new(),
            settings,
            &CancelToken::new(),
            None,
        );
        (manifest, id)
    }

    fn untar(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let name = e.path().unwrap().to_string_lossy().into_owned();
                let mut body = Vec::new();
                e.read_to_end(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    // =========================================================================
    // Single item
    // =========================================================================

    #[test]
    fn single_request_yields_the_image_itself() {
        let c = candidate(0, "png");
        let mock = MockFetcher::new().with(
            &c.url,
            MockResponse::Body(png_bytes(&letterboxed(
                40,
                30,
                Bands {
                    top: 5,
                    bottom: 5,
                    ..Bands::default()
                },
            ))),
        );
        let (manifest, id) = run(&mock, &[&c], &ArchiveSettings::default());
        let out = finish(manifest, &id, 1, "artgrab", timestamp()).unwrap();

        assert_eq!(out.kind, PayloadKind::Image);
        assert_eq!(out.filename, "artgrab_80057281_mock_poster_001.jpg");
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
        assert_eq!(out.summary.to_string(), "1 requested, 1 succeeded, 0 failed");
    }

    #[test]
    fn trim_disabled_keeps_raw_bytes_and_extension() {
        let c = candidate(0, "png");
        let raw = png_bytes(&solid(8, 8, [0, 0, 0]));
        let mock = MockFetcher::new().with(&c.url, MockResponse::Body(raw.clone()));
        let settings = ArchiveSettings {
            trim: None,
            ..ArchiveSettings::default()
        };
        let (manifest, id) = run(&mock, &[&c], &settings);
        assert!(manifest.entries[0].crop.is_none());
        let out = finish(manifest, &id, 1, "artgrab", timestamp()).unwrap();

        assert_eq!(out.bytes, raw);
        assert!(out.filename.ends_with("_001.png"));
    }

    // =========================================================================
    // Partial success
    // =========================================================================

    #[test]
    fn failures_are_counted_not_substituted() {
        let good = candidate(0, "png");
        let missing = candidate(1, "png");
        let blank = candidate(2, "png");
        let spare = candidate(3, "png");
        let mock = MockFetcher::new()
            .with(&good.url, MockResponse::Body(png_bytes(&noise(10, 10))))
            .with(&blank.url, MockResponse::Body(png_bytes(&solid(10, 10, [5, 5, 5]))))
            .with(&spare.url, MockResponse::Body(png_bytes(&noise(10, 10))));

        let (manifest, id) = run(&mock, &[&good, &missing, &blank], &ArchiveSettings::default());

        assert_eq!(manifest.succeeded(), 1);
        assert_eq!(manifest.failed(), 2);
        assert_eq!(manifest.failures[0].rank, 1);
        assert!(manifest.failures[1].reason.contains("blank"));
        assert!(!mock.get_calls().contains(&spare.url));

        let out = finish(manifest, &id, 3, "artgrab", timestamp()).unwrap();
        assert_eq!(out.kind, PayloadKind::Archive);
        assert_eq!(out.summary.requested, 3);
        assert_eq!(out.summary.succeeded + out.summary.failed, 3);
        let members = untar(&out.bytes);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0, "artgrab_80057281_mock_poster_001.jpg");
    }

    #[test]
    fn nothing_produced_is_archive_empty() {
        let a = candidate(0, "png");
        let b = candidate(1, "png");
        let mock = MockFetcher::new().with(&b.url, MockResponse::Status(500));
        let (manifest, id) = run(&mock, &[&a, &b], &ArchiveSettings::default());
        let err = finish(manifest, &id, 2, "artgrab", timestamp()).unwrap_err();
        assert!(matches!(err, HarvestError::ArchiveEmpty { failed: 2 }));
    }

    #[test]
    fn single_request_that_fails_is_archive_empty() {
        let c = candidate(0, "png");
        let (manifest, id) = run(&MockFetcher::new(), &[&c], &ArchiveSettings::default());
        let err = finish(manifest, &id, 1, "artgrab", timestamp()).unwrap_err();
        assert!(matches!(err, HarvestError::ArchiveEmpty { failed: 1 }));
    }

    // =========================================================================
    // Bundle contents
    // =========================================================================

    #[test]
    fn members_are_written_in_rank_order() {
        let candidates: Vec<CandidateDescriptor> = (0..5).map(|r| candidate(r, "png")).collect();
        let body = png_bytes(&noise(6, 6));
        let mock = candidates.iter().fold(MockFetcher::new(), |m, c| {
            // Later ranks finish first.
            let delay = Duration::from_millis(10 * (5 - c.rank as u64));
            m.with_delay(&c.url, MockResponse::Body(body.clone()), delay)
        });
        let selected: Vec<&CandidateDescriptor> = candidates.iter().collect();
        let (manifest, id) = run(&mock, &selected, &ArchiveSettings::default());
        let out = finish(manifest, &id, 5, "artgrab", timestamp()).unwrap();

        assert_eq!(out.filename, "artgrab_80057281_20260102030405.tar.gz");
        let names: Vec<String> = untar(&out.bytes).into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            (1..=5)
                .map(|i| format!("artgrab_80057281_mock_poster_{i:03}.jpg"))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn member_digest_matches_content() {
        let a = candidate(0, "webp");
        let b = candidate(1, "webp");
        let mock = MockFetcher::new()
            .with(&a.url, MockResponse::Body(b"first".to_vec()))
            .with(&b.url, MockResponse::Body(b"second".to_vec()));
        let settings = ArchiveSettings {
            trim: None,
            ..ArchiveSettings::default()
        };
        let (manifest, id) = run(&mock, &[&a, &b], &settings);
        let expected = format!("{:x}", Sha256::digest(b"second"));
        assert_eq!(manifest.entries[1].sha256, expected);

        let out = finish(manifest, &id, 2, "artgrab", timestamp()).unwrap();
        let members = untar(&out.bytes);
        assert_eq!(members[0].1, b"first");
        assert_eq!(members[1].0, "artgrab_80057281_mock_poster_002.webp");
    }

    // =========================================================================
    // Fallback and cancellation
    // =========================================================================

    #[test]
    fn fallback_proxy_used_after_direct_failure() {
        let c = candidate(0, "png");
        let proxied = format!("https://proxy.example/?u={}", c.url);
        let mock = MockFetcher::new()
            .with(&c.url, MockResponse::Status(403))
            .with(&proxied, MockResponse::Body(png_bytes(&noise(5, 5))));
        let settings = ArchiveSettings {
            transports: transport_chain(&["https://proxy.example/?u={url}".to_string()]),
            ..ArchiveSettings::default()
        };
        let (manifest, _) = run(&mock, &[&c], &settings);

        assert_eq!(manifest.succeeded(), 1);
        assert_eq!(mock.get_calls(), vec![c.url.clone(), proxied]);
    }

    #[test]
    fn no_fallback_without_configured_proxies() {
        let c = candidate(0, "png");
        let mock = MockFetcher::new().with(&c.url, MockResponse::Status(403));
        let (manifest, _) = run(&mock, &[&c], &ArchiveSettings::default());

        assert_eq!(manifest.failed(), 1);
        assert!(manifest.failures[0].reason.contains("403"));
        assert_eq!(mock.get_calls().len(), 1);
    }

    #[test]
    fn cancelled_items_are_recorded_as_failures() {
        let a = candidate(0, "png");
        let b = candidate(1, "png");
        let mock = MockFetcher::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let id = resolve("80057281").unwrap();
        let manifest = collect(
            &pool(),
            &mock,
            &id,
            &[&a, &b],
            &Prefetched::new(),
            &ArchiveSettings::default(),
            &cancel,
            None,
        );
        assert_eq!(manifest.failed(), 2);
        assert!(manifest.failures.iter().all(|f| f.reason == "cancelled"));
        assert!(mock.get_calls().is_empty());
    }

    #[test]
    fn events_follow_rank_order() {
        let a = candidate(0, "png");
        let b = candidate(1, "png");
        let mock = MockFetcher::new().with(&b.url, MockResponse::Body(png_bytes(&noise(4, 4))));
        let (tx, rx) = std::sync::mpsc::channel();
        let id = resolve("80057281").unwrap();
        collect(
            &pool(),
            &mock,
            &id,
            &[&a, &b],
            &Prefetched::new(),
            &ArchiveSettings::default(),
            &CancelToken::new(),
            Some(&tx),
        );
        drop(tx);
        let events: Vec<PipelineEvent> = rx.iter().collect();
        assert!(matches!(events[0], PipelineEvent::ItemFailed { rank: 0, .. }));
        assert!(matches!(events[1], PipelineEvent::Archived { rank: 1, .. }));
    }

    #[test]
    fn cancelling_mid_run_keeps_finished_members() {
        let candidates: Vec<CandidateDescriptor> = (0..4).map(|r| candidate(r, "png")).collect();
        let body = png_bytes(&noise(6, 6));
        let mock = candidates.iter().fold(MockFetcher::new(), |m, c| {
            m.with_delay(&c.url, MockResponse::Body(body.clone()), Duration::from_millis(100))
        });
        let selected: Vec<&CandidateDescriptor> = candidates.iter().collect();
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            trigger.cancel();
        });

        // A single worker produces the items in rank order.
        let one = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let id = resolve("80057281").unwrap();
        let manifest = collect(
            &one,
            &mock,
            &id,
            &selected,
            &Prefetched::new(),
            &ArchiveSettings::default(),
            &cancel,
            None,
        );
        canceller.join().unwrap();

        assert_eq!(manifest.succeeded() + manifest.failed(), 4);
        assert_eq!(manifest.entries[0].rank, 0);
        assert!(manifest.entries.iter().all(|e| e.size > 0));
        assert!(!manifest.failures.is_empty());
        assert!(manifest.failures.iter().all(|f| f.reason == "cancelled"));
        assert_eq!(manifest.failures.last().unwrap().rank, 3);
        assert!(!mock.get_calls().contains(&candidates[3].url));

        let out = finish(manifest, &id, 4, "artgrab", timestamp()).unwrap();
        assert_eq!(out.kind, PayloadKind::Archive);
        assert_eq!(untar(&out.bytes)[0].0, "artgrab_80057281_mock_poster_001.jpg");
    }

    // =========================================================================
    // Reusing probe bodies
    // =========================================================================

    #[test]
    fn trimming_uses_prefetched_body_without_fetching() {
        let c = candidate(0, "png");
        let body: Arc<[u8]> = png_bytes(&letterboxed(
            20,
            20,
            Bands {
                left: 3,
                ..Bands::default()
            },
        ))
        .into();
        let prefetched = Prefetched::from([(c.id.as_str(), body)]);
        let mock = MockFetcher::new();
        let id = resolve("80057281").unwrap();

        let manifest = collect(
            &pool(),
            &mock,
            &id,
            &[&c],
            &prefetched,
            &ArchiveSettings::default(),
            &CancelToken::new(),
            None,
        );

        assert_eq!(manifest.succeeded(), 1);
        assert_eq!(manifest.entries[0].crop.unwrap().left, 3);
        assert!(mock.get_calls().is_empty());
    }

    #[test]
    fn raw_path_fetches_even_with_prefetched_body() {
        let c = candidate(0, "png");
        let stale: Arc<[u8]> = png_bytes(&noise(4, 4)).into();
        let prefetched = Prefetched::from([(c.id.as_str(), stale)]);
        let mock = MockFetcher::new().with(&c.url, MockResponse::Body(b"fresh".to_vec()));
        let settings = ArchiveSettings {
            trim: None,
            ..ArchiveSettings::default()
        };
        let id = resolve("80057281").unwrap();

        let manifest = collect(
            &pool(),
            &mock,
            &id,
            &[&c],
            &prefetched,
            &settings,
            &CancelToken::new(),
            None,
        );

        assert_eq!(manifest.entries[0].bytes, b"fresh");
        assert_eq!(mock.get_calls(), vec![c.url.clone()]);
    }

    // =========================================================================
    // Repeated selections
    // =========================================================================

    #[test]
    fn repeated_selection_is_produced_once() {
        let a = candidate(0, "png");
        let b = candidate(1, "png");
        let body = png_bytes(&noise(6, 6));
        let mock = MockFetcher::new()
            .with(&a.url, MockResponse::Body(body.clone()))
            .with(&b.url, MockResponse::Body(body));

        let (manifest, id) = run(&mock, &[&a, &b, &a], &ArchiveSettings::default());

        let names: Vec<&str> = manifest.entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "artgrab_80057281_mock_poster_001.jpg",
                "artgrab_80057281_mock_poster_002.jpg"
            ]
        );
        assert_eq!(
            manifest.failures,
            vec![ItemFailure {
                candidate_id: a.id.clone(),
                rank: 0,
                reason: "duplicate selection".into(),
            }]
        );
        assert_eq!(mock.get_calls().iter().filter(|u| **u == a.url).count(), 1);

        let out = finish(manifest, &id, 3, "artgrab", timestamp()).unwrap();
        assert_eq!(untar(&out.bytes).len(), 2);
        assert_eq!(out.summary.to_string(), "3 requested, 2 succeeded, 1 failed");
    }
}
