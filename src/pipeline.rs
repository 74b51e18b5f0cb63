//! End-to-end analysis run

use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::bins::{assign_bins, summarize_bins, BinSummary};
use crate::clean::{clean_snapshots, CleaningSummary};
use crate::config::AnalysisConfig;
use crate::data::{load_snapshots, profile, DatasetProfile};
use crate::effectiveness::{
    discount_effectiveness, fit_booking_regression, regression_inputs, DiscountEffect,
    RegressionSummary,
};
use crate::error::Result;
use crate::features::add_discount_pct;
use crate::model::{hotel_features, segment_hotels, HotelSegment, SegmentationModel};
use crate::snapshot::{booking_changes, reduce_snapshots, BookingChange};
use crate::viz::{generate_charts, ChartPaths};

/// Result of every stage of one run.
#[derive(Debug)]
pub struct AnalysisReport {
    /// Profile of the raw dataset, before cleaning
    pub profile: DatasetProfile,
    pub cleaning: CleaningSummary,
    /// Cleaned snapshots with `discount_pct`
    pub snapshots: DataFrame,
    /// One row per (hotel, check-in) window with first/last columns
    pub book: DataFrame,
    pub windows: Vec<BookingChange>,
    /// `discount_bin` of each window, parallel to `windows`
    pub discount_bins: Vec<Option<usize>>,
    pub effectiveness: Vec<DiscountEffect>,
    pub regression: RegressionSummary,
    pub bins: Vec<BinSummary>,
    pub hotels: Vec<HotelSegment>,
    pub segmentation: SegmentationModel,
    /// `None` when chart rendering is disabled
    pub charts: Option<ChartPaths>,
}

/// Run the analysis described by `config`.
///
/// Stages run in order and the first failure aborts the run.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let start = Instant::now();

    let raw = load_snapshots(&config.input)?;
    let profile = profile(&raw)?;

    let (cleaned, cleaning) = clean_snapshots(&raw)?;
    let snapshots = add_discount_pct(&cleaned)?;

    let book = reduce_snapshots(&snapshots)?;
    let windows = booking_changes(&book)?;

    let effectiveness = discount_effectiveness(&book)?;
    let regression = fit_booking_regression(&windows)?;
    debug!(
        coefficient = regression.coefficient,
        intercept = regression.intercept,
        r2 = regression.r2,
        rmse = regression.rmse,
        "fitted booking regression"
    );

    let discount_bins = assign_bins(&windows, &config.bins);
    let bins = summarize_bins(&windows, &config.bins);

    let features = hotel_features(&snapshots)?;
    let segmentation = segment_hotels(&features, &config.segments)?;
    let hotels = segmentation.segments(&features);

    let charts = if config.render_charts {
        let (discounts, changes) = regression_inputs(&windows);
        Some(generate_charts(
            &bins,
            &discounts,
            &changes,
            &config.output_dir,
        )?)
    } else {
        debug!("chart rendering disabled");
        None
    };

    info!(
        elapsed_secs = start.elapsed().as_secs_f64(),
        windows = windows.len(),
        hotels = hotels.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        profile,
        cleaning,
        snapshots,
        book,
        windows,
        discount_bins,
        effectiveness,
        regression,
        bins,
        hotels,
        segmentation,
        charts,
    })
}
