use std::collections::BTreeMap;

use super::filter::{FilterSelection, filter_listings};
use super::model::{GroupKey, Listing, Number};

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// One scatter point: median price of a `(group, model_year)` cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianPricePoint {
    pub group: String,
    pub model_year: Number,
    pub median_price: f64,
    /// Rows that fell into this cell.
    pub count: usize,
}

/// One bar of a grouped histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramBin<K> {
    pub value: K,
    pub color: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Median price by year
// ---------------------------------------------------------------------------

/// Median price per `(group value, model_year)`.
///
/// `listings` should be the known-year view. The selection is an inclusive
/// filter on the `group_key` column. Output is sorted by group, then year.
pub fn median_price_by_year(
    listings: &[Listing],
    group_key: GroupKey,
    selection: &FilterSelection,
) -> Vec<MedianPricePoint> {
    let mut cells: BTreeMap<(&str, Number), Vec<i64>> = BTreeMap::new();
    for l in filter_listings(listings, group_key, selection) {
        cells
            .entry((group_key.value_of(l), l.model_year))
            .or_default()
            .push(l.price);
    }

    cells
        .into_iter()
        .filter_map(|((group, model_year), mut prices)| {
            let count = prices.len();
            median(&mut prices).map(|median_price| MedianPricePoint {
                group: group.to_string(),
                model_year,
                median_price,
                count,
            })
        })
        .collect()
}

/// Standard median: the middle value, or the mean of the two middle values.
pub fn median(values: &mut [i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid] as f64)
    } else {
        Some((values[mid - 1] as f64 + values[mid] as f64) / 2.0)
    }
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

/// Count of listings per `(days_listed, colour value)`. Use the full view.
pub fn count_by_days_listed(listings: &[Listing], color_key: GroupKey) -> Vec<HistogramBin<i64>> {
    count_by(listings, |l| l.days_listed, color_key)
}

/// Count of listings per `(condition, colour value)`. Use the full view.
pub fn count_by_condition(listings: &[Listing], color_key: GroupKey) -> Vec<HistogramBin<String>> {
    count_by(listings, |l| l.condition.clone(), color_key)
}

fn count_by<K: Ord>(
    listings: &[Listing],
    value: impl Fn(&Listing) -> K,
    color_key: GroupKey,
) -> Vec<HistogramBin<K>> {
    let mut counts: BTreeMap<(K, &str), usize> = BTreeMap::new();
    for l in listings {
        *counts.entry((value(l), color_key.value_of(l))).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((value, color), count)| HistogramBin {
            value,
            color: color.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::listing;

    #[test]
    fn median_of_odd_and_even_groups() {
        assert_eq!(median(&mut [30000, 10000, 20000]), Some(20000.0));
        assert_eq!(median(&mut [10000, 30000]), Some(20000.0));
        assert_eq!(median(&mut [7]), Some(7.0));
        assert_eq!(median(&mut [1, 2]), Some(1.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn groups_by_key_and_year() {
        let rows = vec![
            listing("ford f-150", 2011, 10_000, "truck"),
            listing("ram 1500", 2011, 20_000, "truck"),
            listing("gmc sierra", 2011, 30_000, "truck"),
            listing("ford f-250", 2012, 10_000, "truck"),
            listing("ford explorer", 2012, 30_000, "SUV"),
            listing("bmw x5", 2012, 10_000, "SUV"),
        ];
        let points = median_price_by_year(&rows, GroupKey::Type, &FilterSelection::default());

        let got: Vec<(&str, i64, f64)> = points
            .iter()
            .map(|p| (p.group.as_str(), p.model_year.as_f64() as i64, p.median_price))
            .collect();
        assert_eq!(
            got,
            vec![
                ("SUV", 2012, 20_000.0),
                ("truck", 2011, 20_000.0),
                ("truck", 2012, 10_000.0),
            ]
        );
    }

    #[test]
    fn groups_partition_filtered_rows() {
        let rows = vec![
            listing("ford f-150", 2011, 10_000, "truck"),
            listing("ford focus", 2011, 4_000, "sedan"),
            listing("bmw x5", 2012, 18_000, "SUV"),
            listing("bmw 328i", 2012, 12_000, "sedan"),
            listing("honda civic", 2013, 9_000, "sedan"),
        ];
        let points = median_price_by_year(&rows, GroupKey::Make, &FilterSelection::default());

        let total: usize = points.iter().map(|p| p.count).sum();
        assert_eq!(total, rows.len());
        let mut keys: Vec<_> = points.iter().map(|p| (&p.group, p.model_year)).collect();
        keys.dedup();
        assert_eq!(keys.len(), points.len());
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn selection_restricts_groups() {
        let rows = vec![
            listing("ford f-150", 2011, 10_000, "truck"),
            listing("bmw x5", 2011, 20_000, "SUV"),
            listing("honda civic", 2011, 5_000, "sedan"),
        ];
        let sel = FilterSelection::new("truck", "sedan");
        let points = median_price_by_year(&rows, GroupKey::Type, &sel);
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.group == "truck" || p.group == "sedan"));

        let all = median_price_by_year(&rows, GroupKey::Type, &FilterSelection::default());
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn single_row_and_empty_input() {
        let rows = vec![listing("ford f-150", 2011, 12_345, "truck")];
        let points = median_price_by_year(&rows, GroupKey::Type, &FilterSelection::default());
        assert_eq!(points[0].median_price, 12_345.0);
        assert_eq!(points[0].count, 1);

        assert!(median_price_by_year(&[], GroupKey::Make, &FilterSelection::default()).is_empty());
        assert!(count_by_condition(&[], GroupKey::Model).is_empty());
        assert!(count_by_days_listed(&[], GroupKey::Make).is_empty());
    }

    #[test]
    fn histogram_counts_sum_to_row_count() {
        let mut rows = vec![
            listing("ford f-150", 2011, 10_000, "truck"),
            listing("ford f-150", 2012, 11_000, "truck"),
            listing("ford focus", 2012, 4_000, "sedan"),
            listing("bmw x5", 2012, 18_000, "SUV"),
        ];
        rows[0].days_listed = 5;
        rows[1].days_listed = 5;
        rows[2].days_listed = 5;
        rows[3].condition = "excellent".to_string();

        let days = count_by_days_listed(&rows, GroupKey::Make);
        assert_eq!(days.iter().map(|b| b.count).sum::<usize>(), rows.len());
        assert!(days.contains(&HistogramBin {
            value: 5,
            color: "ford".to_string(),
            count: 3
        }));

        for key in [GroupKey::Make, GroupKey::Model, GroupKey::Type] {
            let bins = count_by_condition(&rows, key);
            assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), rows.len());
        }

        let by_model = count_by_condition(&rows, GroupKey::Model);
        assert!(by_model.contains(&HistogramBin {
            value: "good".to_string(),
            color: "f-150".to_string(),
            count: 2
        }));
    }
}
