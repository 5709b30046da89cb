//! Classification taxonomy mapper
//!
//! Pure lookup from a raw classifier label to human-facing decision
//! metadata (display name, icon, severity class, responsible party).
//!
//! `resolve` is a total function: an unmapped label falls back to a defined
//! "unknown" entry instead of failing, so the pipeline never depends on a
//! closed enumeration of upstream labels.

use kashif_common::types::{Severity, TaxonomyEntry};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Responsible party assigned when no taxonomy entry matches
pub const UNSPECIFIED_PARTY: &str = "Unspecified";

static TAXONOMY: Lazy<HashMap<&'static str, TaxonomyEntry>> = Lazy::new(|| {
    let entries = [
        TaxonomyEntry {
            label: "Pothole".to_string(),
            display_name: "Road pothole".to_string(),
            icon: "🕳️".to_string(),
            severity: Severity::Severe,
            responsible_party: "Municipal roads authority".to_string(),
        },
        TaxonomyEntry {
            label: "Plain".to_string(),
            display_name: "Undamaged road".to_string(),
            icon: "✅".to_string(),
            severity: Severity::None,
            responsible_party: "No damage".to_string(),
        },
        TaxonomyEntry {
            label: "Damaged Car".to_string(),
            display_name: "Damaged vehicle".to_string(),
            icon: "🚗💥".to_string(),
            severity: Severity::Moderate,
            responsible_party: "Accident claims company".to_string(),
        },
        TaxonomyEntry {
            label: "Intact Car".to_string(),
            display_name: "Intact vehicle".to_string(),
            icon: "🚗✨".to_string(),
            severity: Severity::None,
            responsible_party: "No damage".to_string(),
        },
    ];

    entries
        .into_iter()
        .map(|e| {
            // Keys borrow from leaked label strings so the map stays 'static
            let key: &'static str = Box::leak(e.label.clone().into_boxed_str());
            (key, e)
        })
        .collect()
});

/// Resolve a classifier label to its taxonomy entry
///
/// Total: unmapped labels resolve to a fallback entry carrying the raw
/// label, a neutral severity, and an unspecified responsible party.
pub fn resolve(label: &str) -> TaxonomyEntry {
    TAXONOMY
        .get(label)
        .cloned()
        .unwrap_or_else(|| fallback_entry(label))
}

/// Fallback entry for labels the taxonomy does not cover
fn fallback_entry(label: &str) -> TaxonomyEntry {
    TaxonomyEntry {
        label: label.to_string(),
        display_name: label.to_string(),
        icon: "❓".to_string(),
        severity: Severity::Unknown,
        responsible_party: UNSPECIFIED_PARTY.to_string(),
    }
}
