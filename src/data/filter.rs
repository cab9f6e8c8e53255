use std::collections::BTreeSet;

use super::model::{GroupKey, Listing};

// ---------------------------------------------------------------------------
// Filter selection: the two category pickers
// ---------------------------------------------------------------------------

/// Values picked in the two category pickers for one request.
///
/// The filter only bites when both pickers hold a non-empty value; one value
/// or none means "show all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub first: Option<String>,
    pub second: Option<String>,
}

impl FilterSelection {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: Some(first.into()),
            second: Some(second.into()),
        }
    }

    /// The "Show All" button.
    pub fn reset(&mut self) {
        self.first = None;
        self.second = None;
    }

    /// Both selected values, if the filter is active.
    pub fn active_values(&self) -> Option<[&str; 2]> {
        match (self.first.as_deref(), self.second.as_deref()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some([a, b]),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_values().is_some()
    }
}

/// Rows whose `key` column equals either selected value, or every row when
/// the selection is inactive.
pub fn filter_listings<'a>(
    listings: &'a [Listing],
    key: GroupKey,
    selection: &FilterSelection,
) -> Vec<&'a Listing> {
    match selection.active_values() {
        Some(values) => listings
            .iter()
            .filter(|l| values.contains(&key.value_of(l)))
            .collect(),
        None => listings.iter().collect(),
    }
}

/// Sorted distinct values of a column, used to populate the pickers.
pub fn distinct_values(listings: &[Listing], key: GroupKey) -> Vec<String> {
    listings
        .iter()
        .map(|l| key.value_of(l))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
