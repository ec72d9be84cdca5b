//! Centralized filename construction for archive members and archives.
//!
//! ## Conventions
//!
//! - Member: `<prefix>_<identifier>_<source>_<type>_<index>.<ext>` where
//!   `<index>` is the 1-based generation rank, zero-padded to three digits.
//!   Rank is unique per batch, so member names are unique per archive.
//! - Archive: `<prefix>_<identifier>_<timestamp>.tar.gz`, timestamp in UTC
//!   as `YYYYMMDDhhmmss`.
//!
//! Free-text components (prefix, source and type tags come from config) are
//! sanitized: anything outside `[A-Za-z0-9-]` becomes `-`.

use crate::types::{CandidateDescriptor, Identifier};
use chrono::{DateTime, Utc};

pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Image extensions recognised in candidate URLs.
const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "jpg"),
    ("jpeg", "jpg"),
    ("png", "png"),
    ("webp", "webp"),
    ("gif", "gif"),
];

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Member filename for one archived candidate.
pub fn member_filename(
    prefix: &str,
    identifier: &Identifier,
    candidate: &CandidateDescriptor,
    ext: &str,
) -> String {
    format!(
        "{}_{}_{}_{}_{:0>3}.{}",
        sanitize(prefix),
        identifier.as_str(),
        sanitize(&candidate.source),
        sanitize(&candidate.kind),
        candidate.rank + 1,
        ext
    )
}

/// Archive filename stamped with `timestamp`.
pub fn archive_filename(prefix: &str, identifier: &Identifier, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.{}",
        sanitize(prefix),
        identifier.as_str(),
        timestamp.format("%Y%m%d%H%M%S"),
        ARCHIVE_EXTENSION
    )
}

/// Extension implied by the last path segment of `url`; `jpg` when unknown.
///
/// Query strings and fragments are ignored.
pub fn extension_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment
        .rsplit_once('.')
        .and_then(|(_, ext)| {
            KNOWN_EXTENSIONS
                .iter()
                .find(|(known, _)| ext.eq_ignore_ascii_case(known))
                .map(|(_, canonical)| *canonical)
        })
        .unwrap_or("jpg")
}
