use crate::models::{FilterCriteria, SearchResult};

/// Select the diskrefs of `results` matching every set criterion.
///
/// The archive returns newest first; the returned list is earliest first.
pub fn filter_programmes(results: &[SearchResult], criteria: &FilterCriteria) -> Vec<String> {
    results
        .iter()
        .rev()
        .filter(|r| matches(r, criteria))
        .map(|r| r.diskref.clone())
        .collect()
}

fn matches(result: &SearchResult, criteria: &FilterCriteria) -> bool {
    if let Some(date) = &criteria.date {
        if &result.date != date {
            return false;
        }
    }
    if let Some(channel) = &criteria.channel {
        if &result.service != channel {
            return false;
        }
    }
    if let Some(wanted) = criteria.series_position {
        // A result with no series position never satisfies a series constraint.
        let position = result.series.as_ref().and_then(|s| s.position);
        if position != Some(wanted) {
            return false;
        }
    }
    true
}
