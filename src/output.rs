//! CLI output formatting for all pipeline stages.
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Candidates
//!
//! ```text
//! 80057281: 13 candidates
//! 001 boxart/small poster 166x233
//!     https://art.titlecdn.net/boxart/80057281/small.jpg
//! ```
//!
//! ## Probe progress
//!
//! ```text
//! 001 ok 665x935 (212 ms)
//! 002 failed: HTTP status 404 (95 ms)
//! Probed 13: 4 accepted
//! ```
//!
//! ## Archive progress
//!
//! ```text
//! 001 → artgrab_80057281_titlecdn_poster_001.jpg (48213 bytes, trimmed to 665x900)
//! 002 skipped: image decode error: ...
//! ```

use crate::archive::{HarvestOutput, PayloadKind};
use crate::pipeline::PipelineEvent;
use crate::probe::ProbeReport;
use crate::types::{CandidateDescriptor, Identifier, Summary};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 0-based rank as a 1-based, 3-digit zero-padded index.
fn format_index(rank: usize) -> String {
    format!("{:0>3}", rank + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Stage 1-2: Resolve and generate
// ============================================================================

pub fn format_candidates(id: &Identifier, candidates: &[CandidateDescriptor]) -> Vec<String> {
    let mut lines = vec![format!("{}: {} candidates", id, candidates.len())];
    for c in candidates {
        lines.push(format!(
            "{} {}/{} {} {}x{}",
            format_index(c.rank),
            c.strategy,
            c.variant,
            c.kind,
            c.width,
            c.height
        ));
        lines.push(format!("{}{}", indent(1), c.url));
    }
    lines
}

pub fn print_candidates(id: &Identifier, candidates: &[CandidateDescriptor]) {
    for line in format_candidates(id, candidates) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Probe
// ============================================================================

/// Accepted candidates with their measured dimensions.
pub fn format_probe_report(report: &ProbeReport<'_>) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .filter(|r| r.reachable)
        .flat_map(|r| {
            [
                format!(
                    "{} {} {}x{}",
                    format_index(r.candidate.rank),
                    r.candidate.id,
                    r.width,
                    r.height
                ),
                format!("{}{}", indent(1), r.candidate.url),
            ]
        })
        .collect();
    let mut footer = format!(
        "Accepted {} of {}",
        report.accepted().len(),
        report.attempted
    );
    if report.cancelled {
        footer.push_str(" (cancelled)");
    }
    lines.push(footer);
    lines
}

pub fn print_probe_report(report: &ProbeReport<'_>) {
    for line in format_probe_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Progress events
// ============================================================================

pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Resolved { identifier } => vec![format!("Identifier {}", identifier)],
        PipelineEvent::Generated { candidates } => {
            vec![format!("Generated {} candidates", candidates)]
        }
        PipelineEvent::Probed {
            rank,
            reachable,
            width,
            height,
            elapsed_ms,
            failure,
            ..
        } => {
            let status = if *reachable {
                format!("ok {}x{}", width, height)
            } else {
                format!("failed: {}", failure.as_deref().unwrap_or("unknown"))
            };
            vec![format!(
                "{}{} {} ({} ms)",
                indent(1),
                format_index(*rank),
                status,
                elapsed_ms
            )]
        }
        PipelineEvent::ProbeFinished {
            attempted,
            accepted,
            cancelled,
        } => {
            let mut line = format!("Probed {}: {} accepted", attempted, accepted);
            if *cancelled {
                line.push_str(" (cancelled)");
            }
            vec![line]
        }
        PipelineEvent::Archived {
            rank,
            filename,
            bytes,
            crop,
            ..
        } => {
            let detail = match crop {
                Some(c) => format!("{} bytes, trimmed to {}x{}", bytes, c.width(), c.height()),
                None => format!("{} bytes, raw", bytes),
            };
            vec![format!(
                "{}{} → {} ({})",
                indent(1),
                format_index(*rank),
                filename,
                detail
            )]
        }
        PipelineEvent::ItemFailed { rank, reason, .. } => {
            vec![format!(
                "{}{} skipped: {}",
                indent(1),
                format_index(*rank),
                reason
            )]
        }
    }
}

// ============================================================================
// Stage 5: Result
// ============================================================================

pub fn format_summary(summary: &Summary) -> String {
    format!("Summary: {}", summary)
}

/// Closing lines for a finished run. `written_to` is where the payload was
/// saved.
pub fn format_harvest_output(output: &HarvestOutput, written_to: &str) -> Vec<String> {
    let what = match output.kind {
        PayloadKind::Image => "image",
        PayloadKind::Archive => "archive",
    };
    vec![
        format!(
            "Wrote {} {} ({} bytes)",
            what,
            written_to,
            output.bytes.len()
        ),
        format_summary(&output.summary),
    ]
}

pub fn print_harvest_output(output: &HarvestOutput, written_to: &str) {
    for line in format_harvest_output(output, written_to) {
        println!("{}", line);
    }
}
