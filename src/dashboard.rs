//! One request/response cycle of the dashboard.
//!
//! Every control change builds a fresh [`DashboardRequest`]; [`respond`]
//! re-runs preparation and aggregation from the raw rows and returns a
//! [`RenderPayload`] the UI draws as-is. Nothing from a previous cycle is
//! reused.

use std::collections::BTreeMap;

use crate::data::aggregate::{
    HistogramBin, MedianPricePoint, count_by_condition, count_by_days_listed, median_price_by_year,
};
use crate::data::filter::{FilterSelection, distinct_values};
use crate::data::model::{GroupKey, RawListing};
use crate::data::prepare::{PrepareOptions, PreparationReport, prepare_with_report};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Which optional chart sections are drawn. The type scatter always is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartVisibility {
    pub make_scatter: bool,
    pub days_listed: bool,
    pub condition: bool,
}

impl ChartVisibility {
    pub fn all(visible: bool) -> Self {
        Self {
            make_scatter: visible,
            days_listed: visible,
            condition: visible,
        }
    }
}

impl Default for ChartVisibility {
    fn default() -> Self {
        Self::all(true)
    }
}

/// The full state of the controls at the time of one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardRequest {
    /// The two vehicle-type pickers.
    pub selection: FilterSelection,
    /// "Show by Make": colour the condition histogram by make instead of model.
    pub show_by_make: bool,
    pub visibility: ChartVisibility,
}

/// Parse the column the condition histogram is coloured by. Only `make`
/// and `model` are accepted.
pub fn parse_condition_color_key(s: &str) -> Result<GroupKey> {
    match s.trim().to_ascii_lowercase().parse::<GroupKey>()? {
        GroupKey::Type => Err(DataError::UnknownGroupKey { key: s.to_string() }),
        key => Ok(key),
    }
}

impl DashboardRequest {
    pub fn condition_color_key(&self) -> GroupKey {
        if self.show_by_make {
            GroupKey::Make
        } else {
            GroupKey::Model
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub label: String,
    /// `[model_year, median_price]`
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub heading: &'static str,
    pub title: &'static str,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub caption: &'static str,
    pub series: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarMode {
    /// Series stacked on top of each other at each x.
    Stacked,
    /// Series side by side at each x.
    Grouped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub label: String,
    /// `(x, count)`; for categorical charts `x` indexes `x_labels`.
    pub bars: Vec<(f64, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramChart {
    pub heading: String,
    pub title: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub caption: &'static str,
    pub mode: BarMode,
    /// Category names for a categorical x axis, empty for a numeric one.
    pub x_labels: Vec<String>,
    pub series: Vec<HistogramSeries>,
}

impl HistogramChart {
    /// Sum of every bar, equal to the number of rows counted.
    pub fn total(&self) -> usize {
        self.series
            .iter()
            .flat_map(|s| s.bars.iter().map(|(_, n)| n))
            .sum()
    }
}

/// Everything the UI needs to draw one frame of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPayload {
    pub median_by_type: ScatterChart,
    pub median_by_make: Option<ScatterChart>,
    pub days_listed: Option<HistogramChart>,
    pub condition: Option<HistogramChart>,
    pub conclusion: &'static str,
    /// Distinct vehicle types of the known-year view, for the pickers.
    pub type_choices: Vec<String>,
    pub total_listings: usize,
    pub known_year_listings: usize,
    pub report: PreparationReport,
}

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

pub const PAGE_HEADER: &str = "Car Sales Advertisements";

const TYPE_CAPTION: &str = "The median price of vehicles has increased over time since about 2000. \
As a vehicle gets older than 2000, the price also generally increased. Additionally, it appears \
that SUVs, pickup, trucks, and off-roads have the highest median prices, while sedans, hatchbacks, \
and vans have the lowest median prices.";

const MAKE_CAPTION: &str = "The median price of vehicles generally increases with the model year \
since around 2000. Luxury brands such as mercedes-benz and cadillac tend to have higher median \
prices than others, which indicates that the make of the vehicle has significant influence on its \
price.";

const DAYS_CAPTION: &str = "From this plot, it appears that the number of vehicles listed decreases \
as the number of days the vehicle is listed increases. This suggests that most vehicles are sold or \
removed from the listing within a short period of time. Most listings being there between 10 and 35 \
days.";

const CONDITION_CAPTION: &str = "Most people would consider the vehicle that they list as good or \
excellent condition. The highest number of listings seems to be for pickup trucks such as the \
F-150, Silverado 1500 and Ram 1500.";

const CONCLUSION: &str = "The median price of vehicles are significantly affected by its model year \
and make. Luxury vehicles tend to have a higher median price vs non-luxury makes. Vehicles are \
mostly advertised for a short period of time. Trucks tend to be listed as excellent or good \
condition.";

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Run preparation and aggregation for one request.
pub fn respond(
    raw: &[RawListing],
    request: &DashboardRequest,
    options: &PrepareOptions,
) -> Result<RenderPayload> {
    let (dataset, report) = prepare_with_report(raw, options)?;
    let known = &dataset.known_year_listings;

    let median_by_type = ScatterChart {
        heading: "A scatterplot showing the median price of vehicles by type and model year",
        title: "Median Price by Vehicle Type and Model Year",
        x_title: "Model Year",
        y_title: "Median Price",
        caption: TYPE_CAPTION,
        series: scatter_series(median_price_by_year(known, GroupKey::Type, &request.selection)),
    };

    let median_by_make = request.visibility.make_scatter.then(|| ScatterChart {
        heading: "A scatterplot showing the median price of vehicles by make and model year",
        title: "Median Price by Vehicle Make and Model Year",
        x_title: "Model Year",
        y_title: "Median Price",
        caption: MAKE_CAPTION,
        series: scatter_series(median_price_by_year(
            known,
            GroupKey::Make,
            &FilterSelection::default(),
        )),
    });

    let days_listed = request.visibility.days_listed.then(|| {
        let bins = count_by_days_listed(&dataset.all_listings, GroupKey::Make);
        HistogramChart {
            heading: "A histogram of days a vehicle is listed based on the car's make".to_string(),
            title: "Days Vehicle is Listed by Vehicle Make".to_string(),
            x_title: "Days Listed",
            y_title: "Number of Vehicles",
            caption: DAYS_CAPTION,
            mode: BarMode::Stacked,
            x_labels: Vec::new(),
            series: histogram_series(bins.iter().map(|b| (b.value as f64, b))),
        }
    });

    let condition = request.visibility.condition.then(|| {
        let key = request.condition_color_key();
        let bins = count_by_condition(&dataset.all_listings, key);
        let x_labels = condition_labels(&bins);
        let series = histogram_series(bins.iter().map(|b| {
            let x = x_labels.iter().position(|c| *c == b.value).unwrap_or(0);
            (x as f64, b)
        }));
        let noun = match key {
            GroupKey::Make => "Make",
            _ => "Model",
        };
        HistogramChart {
            heading: format!(
                "A histogram of vehicle conditions based on the vehicle's {}",
                key.as_str()
            ),
            title: format!("Vehicle Condition by {noun}"),
            x_title: "Condition",
            y_title: "Number of Vehicles",
            caption: CONDITION_CAPTION,
            mode: BarMode::Grouped,
            x_labels,
            series,
        }
    });

    log::debug!(
        "Rendered request {:?}: {} type series",
        request,
        median_by_type.series.len()
    );

    Ok(RenderPayload {
        median_by_type,
        median_by_make,
        days_listed,
        condition,
        conclusion: CONCLUSION,
        type_choices: distinct_values(known, GroupKey::Type),
        total_listings: dataset.all_listings.len(),
        known_year_listings: known.len(),
        report,
    })
}

/// One series per group, in group order.
fn scatter_series(points: Vec<MedianPricePoint>) -> Vec<ScatterSeries> {
    let mut series: Vec<ScatterSeries> = Vec::new();
    for p in points {
        let xy = [p.model_year.as_f64(), p.median_price];
        match series.last_mut() {
            Some(s) if s.label == p.group => s.points.push(xy),
            _ => series.push(ScatterSeries {
                label: p.group,
                points: vec![xy],
            }),
        }
    }
    series
}

/// One series per colour value, sorted by label.
///
/// Every series carries a bar at every x seen in `bins`, zero where it has
/// no rows. `BarChart::stack_on` pairs bars by index, so stacked series must
/// line up position for position.
fn histogram_series<'a, K: 'a>(
    bins: impl Iterator<Item = (f64, &'a HistogramBin<K>)>,
) -> Vec<HistogramSeries> {
    let bins: Vec<(f64, &HistogramBin<K>)> = bins.collect();
    let mut xs: Vec<f64> = bins.iter().map(|(x, _)| *x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();

    let mut by_color: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &(x, b) in &bins {
        let slot = xs.partition_point(|p| *p < x);
        by_color
            .entry(b.color.as_str())
            .or_insert_with(|| vec![0; xs.len()])[slot] += b.count;
    }
    by_color
        .into_iter()
        .map(|(label, counts)| HistogramSeries {
            label: label.to_string(),
            bars: xs.iter().copied().zip(counts).collect(),
        })
        .collect()
}

/// Bins arrive sorted by condition, so consecutive duplicates are all there is.
fn condition_labels(bins: &[HistogramBin<String>]) -> Vec<String> {
    let mut labels: Vec<String> = bins.iter().map(|b| b.value.clone()).collect();
    labels.dedup();
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::raw;

    fn sample() -> Vec<RawListing> {
        let mut rows = vec![
            raw("ford f-150", Some(2011.0), 10_000, "truck"),
            raw("ford f-150", Some(2011.0), 20_000, "truck"),
            raw("bmw x5", Some(2012.0), 30_000, "SUV"),
            raw("honda civic", Some(2013.0), 5_000, "sedan"),
            raw("chevrolet silverado", None, 15_000, "pickup"),
        ];
        rows[3].condition = "excellent".to_string();
        rows[4].days_listed = 3;
        rows
    }

    #[test]
    fn default_request_draws_every_chart() {
        let payload =
            respond(&sample(), &DashboardRequest::default(), &PrepareOptions::default()).unwrap();

        assert_eq!(payload.total_listings, 5);
        assert_eq!(payload.known_year_listings, 4);
        // pickup only has an unknown year, so it is not offered
        assert_eq!(payload.type_choices, vec!["SUV", "sedan", "truck"]);

        let labels: Vec<_> = payload
            .median_by_type
            .series
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["SUV", "sedan", "truck"]);
        assert_eq!(payload.median_by_type.series[2].points, vec![[2011.0, 15_000.0]]);

        assert!(payload.median_by_make.is_some());
        let days = payload.days_listed.as_ref().unwrap();
        assert_eq!(days.total(), 5);
        assert_eq!(days.y_title, "Number of Vehicles");
        let condition = payload.condition.unwrap();
        assert_eq!(condition.total(), 5);
        assert_eq!(condition.x_labels, vec!["excellent", "good"]);
        assert_eq!(condition.title, "Vehicle Condition by Model");
    }

    #[test]
    fn selection_only_narrows_type_chart() {
        let request = DashboardRequest {
            selection: FilterSelection::new("truck", "SUV"),
            ..Default::default()
        };
        let payload = respond(&sample(), &request, &PrepareOptions::default()).unwrap();

        let labels: Vec<_> = payload
            .median_by_type
            .series
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["SUV", "truck"]);
        assert_eq!(payload.median_by_make.unwrap().series.len(), 3);
    }

    #[test]
    fn show_by_make_switches_condition_colours() {
        let request = DashboardRequest {
            show_by_make: true,
            ..Default::default()
        };
        let payload = respond(&sample(), &request, &PrepareOptions::default()).unwrap();
        let condition = payload.condition.unwrap();

        assert_eq!(condition.title, "Vehicle Condition by Make");
        let labels: Vec<_> = condition.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["bmw", "chevrolet", "ford", "honda"]);
    }

    #[test]
    fn hidden_sections_are_not_built() {
        let request = DashboardRequest {
            visibility: ChartVisibility::all(false),
            ..Default::default()
        };
        let payload = respond(&sample(), &request, &PrepareOptions::default()).unwrap();
        assert!(payload.median_by_make.is_none());
        assert!(payload.days_listed.is_none());
        assert!(payload.condition.is_none());
        assert!(!payload.median_by_type.series.is_empty());
    }

    #[test]
    fn preparation_errors_reach_the_caller() {
        let mut rows = sample();
        rows[1].date_posted = "yesterday".to_string();
        let err = respond(&rows, &DashboardRequest::default(), &PrepareOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataError::MalformedDate { row: 1, .. }));
    }

    #[test]
    fn stacked_series_share_every_x() {
        let mut rows = vec![
            raw("bmw x5", Some(2012.0), 30_000, "SUV"),
            raw("bmw x3", Some(2013.0), 25_000, "SUV"),
            raw("ford f-150", Some(2011.0), 10_000, "truck"),
        ];
        rows[0].days_listed = 1;
        rows[1].days_listed = 2;
        rows[2].days_listed = 2;
        let payload = respond(&rows, &DashboardRequest::default(), &PrepareOptions::default()).unwrap();
        let days = payload.days_listed.unwrap();

        assert_eq!(days.mode, BarMode::Stacked);
        assert_eq!(days.series[0].label, "bmw");
        assert_eq!(days.series[0].bars, vec![(1.0, 1), (2.0, 1)]);
        assert_eq!(days.series[1].label, "ford");
        assert_eq!(days.series[1].bars, vec![(1.0, 0), (2.0, 1)]);
        for s in &days.series {
            let xs: Vec<f64> = s.bars.iter().map(|(x, _)| *x).collect();
            assert_eq!(xs, vec![1.0, 2.0]);
        }
        assert_eq!(days.total(), 3);
    }

    #[test]
    fn condition_color_key_accepts_make_and_model() {
        assert_eq!(parse_condition_color_key("make"), Ok(GroupKey::Make));
        assert_eq!(parse_condition_color_key(" Model"), Ok(GroupKey::Model));
        assert_eq!(
            parse_condition_color_key("type"),
            Err(DataError::UnknownGroupKey {
                key: "type".to_string()
            })
        );
        assert!(matches!(
            parse_condition_color_key("price"),
            Err(DataError::UnknownGroupKey { .. })
        ));
    }

    #[test]
    fn empty_dataset_gives_empty_charts() {
        let payload =
            respond(&[], &DashboardRequest::default(), &PrepareOptions::default()).unwrap();
        assert!(payload.median_by_type.series.is_empty());
        assert_eq!(payload.condition.unwrap().total(), 0);
        assert!(payload.type_choices.is_empty());
    }
}
