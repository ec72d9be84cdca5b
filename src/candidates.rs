//! Candidate generation: identifier → ordered descriptor list.
//!
//! Pure and deterministic. The same identifier and catalog always yield the
//! same descriptors in the same order, with no I/O.

use crate::strategy::Strategy;
use crate::types::{CandidateDescriptor, Identifier};

/// Instantiate every `template × variant` combination of every strategy.
///
/// Descriptor ids are `<identifier>-<strategy>-<NN>` where `NN` is the
/// template-major index within the strategy. Strategy names are restricted
/// to `[a-z0-9_]+` by [`crate::strategy::validate_strategies`], which keeps
/// ids unique across the batch.
///
/// # Panics
///
/// Panics if `identifier` is empty. [`crate::identifier::resolve`] never
/// produces one, so this is a caller bug rather than a runtime condition.
pub fn generate(identifier: &Identifier, strategies: &[Strategy]) -> Vec<CandidateDescriptor> {
    let id = identifier.as_str();
    assert!(!id.is_empty(), "generate() requires a resolved identifier");

    let mut out = Vec::with_capacity(strategies.iter().map(Strategy::combinations).sum());
    for strategy in strategies {
        let mut variant_index = 0usize;
        for template in &strategy.templates {
            for variant in &strategy.variants {
                out.push(CandidateDescriptor {
                    id: format!("{id}-{}-{variant_index:02}", strategy.name),
                    url: expand_template(template, id, &variant.tag, variant.width, variant.height),
                    width: variant.width,
                    height: variant.height,
                    kind: strategy.kind.clone(),
                    source: strategy.source.clone(),
                    strategy: strategy.name.clone(),
                    variant: variant.tag.clone(),
                    rank: out.len(),
                });
                variant_index += 1;
            }
        }
    }
    out
}

fn expand_template(template: &str, id: &str, variant: &str, width: u32, height: u32) -> String {
    template
        .replace("{id}", id)
        .replace("{variant}", variant)
        .replace("{width}", &width.to_string())
        .replace("{height}", &height.to_string())
}
