//! egui rendering of the dashboard: controls on the left, charts in the middle.

pub mod panels;
pub mod plot;
