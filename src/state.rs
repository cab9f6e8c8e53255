use std::path::{Path, PathBuf};

use crate::dashboard::{ChartVisibility, DashboardRequest, RenderPayload, respond};
use crate::data::loader::{DatasetSummary, load_file};
use crate::data::model::RawListing;
use crate::data::prepare::PrepareOptions;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Raw rows of the loaded file (None until a file loads).
    pub raw: Option<Vec<RawListing>>,

    /// Where `raw` came from.
    pub source: Option<PathBuf>,

    /// Column counts of the raw table, for the info panel.
    pub summary: Option<DatasetSummary>,

    /// Current control values; every change is sent through `respond`.
    pub request: DashboardRequest,

    /// How preparation treats blank model fields.
    pub options: PrepareOptions,

    /// Charts produced by the last successful request.
    pub payload: Option<RenderPayload>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(options: PrepareOptions, visibility: ChartVisibility) -> Self {
        Self {
            options,
            request: DashboardRequest {
                visibility,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load a file and render it, reporting failures in `status_message`.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(rows) => {
                log::info!("Loaded {} listings from {}", rows.len(), path.display());
                self.set_raw(rows, path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest newly loaded rows; picker values from the old file are dropped.
    pub fn set_raw(&mut self, rows: Vec<RawListing>, source: PathBuf) {
        self.summary = Some(DatasetSummary::from_rows(&rows));
        self.raw = Some(rows);
        self.source = Some(source);
        self.request.selection.reset();
        self.refresh();
    }

    /// Answer the current request from scratch.
    pub fn refresh(&mut self) {
        let Some(raw) = &self.raw else {
            return;
        };
        match respond(raw, &self.request, &self.options) {
            Ok(payload) => {
                self.payload = Some(payload);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to render dashboard: {e}");
                self.payload = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn set_first_type(&mut self, value: Option<String>) {
        self.request.selection.first = value;
        self.refresh();
    }

    pub fn set_second_type(&mut self, value: Option<String>) {
        self.request.selection.second = value;
        self.refresh();
    }

    /// The "Show All" button.
    pub fn reset_selection(&mut self) {
        self.request.selection.reset();
        self.refresh();
    }

    pub fn set_show_by_make(&mut self, on: bool) {
        self.request.show_by_make = on;
        self.refresh();
    }

    /// Show or hide the three optional chart sections together.
    pub fn set_show_optional(&mut self, on: bool) {
        self.request.visibility = ChartVisibility::all(on);
        self.refresh();
    }

    /// What the side panel says while there is no payload to control.
    pub fn no_charts_message(&self) -> &'static str {
        if self.raw.is_some() {
            "The loaded file could not be prepared; see the error message."
        } else {
            "No dataset loaded."
        }
    }

    pub fn optional_visible(&self) -> bool {
        self.request.visibility != ChartVisibility::all(false)
    }
}
