//! # artgrab
//!
//! Derives likely artwork URLs for a title identifier, checks which ones
//! really serve images, strips letterbox/pillarbox borders, and bundles the
//! results.
//!
//! # Architecture: Five-Stage Pipeline
//!
//! ```text
//! 1. Resolve    input string  →  Identifier
//! 2. Generate   Identifier    →  Vec<CandidateDescriptor>   (pure, no I/O)
//! 3. Probe      candidates    →  ProbeReport                (bounded parallel fetch + decode)
//! 4. Trim       fetched bytes →  ProcessedImage             (per item, on the pool)
//! 5. Archive    survivors     →  HarvestOutput              (single image or .tar.gz)
//! ```
//!
//! Each stage is a plain function over values, and [`pipeline::Pipeline`]
//! wires them together. Per-candidate failures are counted in the stage
//! results; only whole-batch conditions surface as [`error::HarvestError`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`identifier`] | Stage 1: extracts the 7–9 digit token from a URL or bare input |
//! | [`strategy`] | Declarative catalog of URL templates and size variants |
//! | [`candidates`] | Stage 2: expands the catalog into ranked candidate descriptors |
//! | [`fetch`] | `Fetcher` trait, blocking HTTP implementation, proxy fallback chain |
//! | [`probe`] | Stage 3: timeout-bounded, order-preserving parallel probes |
//! | [`imaging`] | Stage 4: decode, border detection, crop, JPEG re-encode |
//! | [`archive`] | Stage 5: per-item production and `.tar.gz` bundling |
//! | [`pipeline`] | Orchestration, cancellation and progress events |
//! | [`config`] | `artgrab.toml` loading, validation and merging |
//! | [`naming`] | Member and archive filename conventions |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared types passed between stages |
//! | [`error`] | Whole-batch error taxonomy |
//!
//! # Design Decisions
//!
//! ## One Pool Per Pipeline
//!
//! Probing and archiving run on a rayon pool owned by the [`pipeline::Pipeline`],
//! sized to `probe.concurrency`. Two pipelines in one process never share a
//! concurrency budget, and nothing touches rayon's global pool.
//!
//! ## Blank Means Dark
//!
//! A pixel is blank when its red, green and blue channels are all at or below
//! the threshold. Only dark borders are removed; white matting is content.

pub mod archive;
pub mod candidates;
pub mod config;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod strategy;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
