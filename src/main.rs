mod app;
mod color;
mod dashboard;
mod data;
mod error;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use app::CarSalesApp;
use clap::Parser;
use dashboard::{ChartVisibility, parse_condition_color_key};
use data::model::GroupKey;
use data::prepare::{BlankModelPolicy, PrepareOptions};
use eframe::egui;
use state::AppState;

/// File opened at start-up when no path is given, if it exists.
const DEFAULT_DATA_PATH: &str = "vehicles_us.csv";

#[derive(Parser, Debug)]
#[command(name = "car-sales-dashboard")]
#[command(about = "Interactive charts over a table of used-vehicle listings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Listings file to open (.csv, .json or .parquet); defaults to ./vehicles_us.csv
    #[arg(value_name = "DATA_PATH")]
    data_path: Option<PathBuf>,

    /// Drop rows with an empty model field instead of refusing the file
    #[arg(long)]
    drop_blank_models: bool,

    /// Start with the optional chart sections hidden
    #[arg(long)]
    hide_optional: bool,

    /// Column the condition histogram is coloured by at start-up (make or model)
    #[arg(long, value_name = "KEY", default_value = "model", value_parser = parse_condition_color_key)]
    condition_color: GroupKey,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let options = PrepareOptions {
        blank_model: if args.drop_blank_models {
            BlankModelPolicy::Drop
        } else {
            BlankModelPolicy::Reject
        },
    };
    let mut state = AppState::new(options, ChartVisibility::all(!args.hide_optional));
    state.request.show_by_make = args.condition_color == GroupKey::Make;

    match &args.data_path {
        Some(path) => state.load_path(path),
        None if Path::new(DEFAULT_DATA_PATH).exists() => {
            state.load_path(Path::new(DEFAULT_DATA_PATH))
        }
        None => log::info!("No {DEFAULT_DATA_PATH} in the working directory; starting empty"),
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Car Sales Advertisements",
        native_options,
        Box::new(|_cc| Ok(Box::new(CarSalesApp::new(state)))),
    )
}
