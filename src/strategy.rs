//! The heuristic catalog: a declarative table of candidate strategies.
//!
//! Each [`Strategy`] names a family of URL templates and the size variants
//! that family is known to publish. The generator instantiates the cross
//! product `templates × variants` for every strategy, in declaration order.
//!
//! ## Template placeholders
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{id}` | canonical identifier |
//! | `{variant}` | variant tag |
//! | `{width}` / `{height}` | declared variant dimensions |
//!
//! The built-in catalog is returned by [`default_strategies`]. A
//! `[[strategies]]` array in `artgrab.toml` replaces it wholesale.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Strategy {
    /// Unique name; `[a-z0-9_]+` so generated ids stay unambiguous.
    pub name: String,
    /// Source tag carried into every descriptor and member filename.
    pub source: String,
    /// Type tag (`poster`, `backdrop`, `logo`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub templates: Vec<String>,
    pub variants: Vec<Variant>,
}

/// A size/variant tag with its declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    pub tag: String,
    pub width: u32,
    pub height: u32,
}

impl Variant {
    fn new(tag: &str, width: u32, height: u32) -> Self {
        Self {
            tag: tag.to_string(),
            width,
            height,
        }
    }
}

impl Strategy {
    /// Number of descriptors this strategy contributes per identifier.
    pub fn combinations(&self) -> usize {
        self.templates.len() * self.variants.len()
    }
}

/// The built-in catalog, in evaluation order.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            name: "boxart".into(),
            source: "titlecdn".into(),
            kind: "poster".into(),
            templates: vec![
                "https://art.titlecdn.net/boxart/{id}/{variant}.jpg".into(),
                "https://art.titlecdn.net/boxart/{id}_{width}x{height}.jpg".into(),
            ],
            variants: vec![
                Variant::new("small", 166, 233),
                Variant::new("medium", 342, 482),
                Variant::new("large", 665, 935),
            ],
        },
        Strategy {
            name: "backdrop".into(),
            source: "titlecdn".into(),
            kind: "backdrop".into(),
            templates: vec!["https://art.titlecdn.net/backdrop/{id}/{variant}.jpg".into()],
            variants: vec![
                Variant::new("sd", 1280, 720),
                Variant::new("hd", 1920, 1080),
                Variant::new("uhd", 3840, 2160),
            ],
        },
        Strategy {
            name: "logo".into(),
            source: "titlecdn".into(),
            kind: "logo".into(),
            templates: vec!["https://art.titlecdn.net/logo/{id}/{variant}.png".into()],
            variants: vec![
                Variant::new("w500", 500, 281),
                Variant::new("w1000", 1000, 562),
            ],
        },
        Strategy {
            name: "legacy".into(),
            source: "legacycdn".into(),
            kind: "poster".into(),
            templates: vec!["https://legacy.titlecdn.net/images/{id}/{variant}.jpg".into()],
            variants: vec![
                Variant::new("thumb", 150, 214),
                Variant::new("full", 750, 1071),
            ],
        },
    ]
}

/// Check a catalog for the properties the generator relies on.
///
/// Returns a human-readable message for the first violation found.
pub fn validate_strategies(strategies: &[Strategy]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for strategy in strategies {
        let name = &strategy.name;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "strategy name {name:?} must be non-empty and match [a-z0-9_]+"
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(format!("duplicate strategy name {name:?}"));
        }
        if strategy.templates.is_empty() {
            return Err(format!("strategy {name:?} has no templates"));
        }
        if strategy.variants.is_empty() {
            return Err(format!("strategy {name:?} has no variants"));
        }
        if let Some(t) = strategy.templates.iter().find(|t| !t.contains("{id}")) {
            return Err(format!("strategy {name:?} template {t:?} lacks {{id}}"));
        }
        if strategy.source.is_empty() || strategy.kind.is_empty() {
            return Err(format!("strategy {name:?} needs non-empty source and type"));
        }
    }
    Ok(())
}
