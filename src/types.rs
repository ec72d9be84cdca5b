//! Shared types used across all pipeline stages.
//!
//! An [`Identifier`] is produced by the resolver and consumed by the
//! candidate generator. [`CandidateDescriptor`]s are produced once per batch
//! and then only read: the probe, trim and archive stages all borrow them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical resource key: a 7–9 digit numeric token.
///
/// Only [`crate::identifier::resolve`] constructs these from user input, so
/// holding an `Identifier` means the token has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// The input exactly as the caller supplied it.
    pub raw: String,
    /// The extracted numeric token.
    pub canonical: String,
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// One hypothesized asset location.
///
/// `rank` is the zero-based generation order. It is the tie-break for
/// display and the default ordering of archive members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescriptor {
    /// Unique within a generation batch: `<identifier>-<strategy>-<NN>`.
    pub id: String,
    pub url: String,
    /// Declared (not measured) dimensions from the strategy variant.
    pub width: u32,
    pub height: u32,
    /// Type tag, e.g. `poster`, `backdrop`, `logo`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Source tag naming the host family the template targets.
    pub source: String,
    pub strategy: String,
    pub variant: String,
    pub rank: usize,
}

/// Outcome counts reported with every pipeline result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested, {} succeeded, {} failed",
            self.requested, self.succeeded, self.failed
        )
    }
}
