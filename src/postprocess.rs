//! Post-processing stage applied to merged updates.
//!
//! No ranking algorithm ships with the engine. [`Identity`] is the default
//! and passes records through untouched; [`MergeBySource`] collapses
//! records that point at the same page and unions their sources.

use std::collections::HashMap;

use url::Url;

use crate::types::Update;

/// A stage run over the merged updates before they reach the caller.
pub trait PostProcessor: Send + Sync {
    /// Transform the merged updates.
    fn process(&self, updates: Vec<Update>) -> Vec<Update>;
}

/// Returns updates unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl PostProcessor for Identity {
    fn process(&self, updates: Vec<Update>) -> Vec<Update> {
        updates
    }
}

/// Collapse updates whose links normalise to the same URL.
///
/// The first record seen for a link is kept, in its original position;
/// later duplicates only contribute their sources and one ranking point
/// each.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeBySource;

impl PostProcessor for MergeBySource {
    fn process(&self, updates: Vec<Update>) -> Vec<Update> {
        let mut merged: Vec<Update> = Vec::with_capacity(updates.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for update in updates {
            let key = normalize_link(&update.link);
            match seen.get(&key) {
                Some(&slot) => {
                    let kept = &mut merged[slot];
                    for source in update.sources {
                        kept.add_source(source);
                    }
                    kept.add_points(1);
                    tracing::trace!(
                        link = %key,
                        points = kept.points(),
                        "merged duplicate update"
                    );
                }
                None => {
                    seen.insert(key, merged.len());
                    merged.push(update);
                }
            }
        }

        merged
    }
}

/// Tracking query parameters ignored when comparing links.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ocid",
];

/// Normalise a link for duplicate detection.
///
/// Lower-cases scheme and host, drops the fragment and tracking
/// parameters, and strips a trailing slash from the path. Links that do
/// not parse are compared verbatim.
pub fn normalize_link(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw.trim()) else {
        return raw.trim().to_string();
    };

    parsed.set_fragment(None);

    let params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string()
}
