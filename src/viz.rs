//! Chart rendering using Plotters

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::bins::BinSummary;
use crate::error::{AnalysisError, Result};

pub const SWEET_SPOT_FILE: &str = "sweet_spot.png";
pub const REVENUE_FILE: &str = "revenue_by_bin.png";
pub const SCATTER_FILE: &str = "discount_vs_booking.png";

const BAR_SIZE: (u32, u32) = (600, 400);
const SCATTER_SIZE: (u32, u32) = (600, 400);

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Where each rendered chart was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPaths {
    pub sweet_spot: PathBuf,
    pub revenue: PathBuf,
    pub scatter: PathBuf,
}

/// Axis bounds covering every finite value with 10% padding.
///
/// With `include_zero` the range always reaches zero, so bars have a
/// baseline; the zero side is not padded.
pub fn padded_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }

    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.1 } else { 1.0 };
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    let hi = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
    (lo, hi)
}

fn draw_bars(
    path: &Path,
    title: &str,
    y_desc: &str,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
) -> DrawResult {
    let (y_min, y_max) = padded_range(values.iter().copied(), true);

    let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..labels.len()).into_segmented(), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Discount bin")
        .y_desc(y_desc)
        .x_labels(labels.len())
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(index) => labels.get(*index).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(color.filled())
            .margin(10)
            .data(values.iter().copied().enumerate()),
    )?;

    root.present()?;
    Ok(())
}

fn draw_scatter(path: &Path, discounts: &[f64], changes: &[f64]) -> DrawResult {
    let (x_min, x_max) = padded_range(discounts.iter().copied(), false);
    let (y_min, y_max) = padded_range(changes.iter().copied(), false);

    let root = BitMapBackend::new(path, SCATTER_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Discount % vs Booking Change", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Discount %")
        .y_desc("Booking Change")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        discounts
            .iter()
            .zip(changes.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| Circle::new((x, y), 3, GREEN.mix(0.5).filled())),
    )?;

    root.present()?;
    Ok(())
}

fn render_error(path: &Path, err: Box<dyn Error>) -> AnalysisError {
    AnalysisError::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Bar chart of mean booking change per discount bin
pub fn render_sweet_spot(bins: &[BinSummary], path: &Path) -> Result<()> {
    let labels: Vec<String> = bins.iter().map(|b| b.label.clone()).collect();
    let values: Vec<f64> = bins
        .iter()
        .map(|b| b.mean_booking_change.unwrap_or(0.0))
        .collect();
    draw_bars(
        path,
        "Discount Sweet Spot Analysis",
        "Avg Booking Change",
        &labels,
        &values,
        RGBColor(135, 206, 235),
    )
    .map_err(|e| render_error(path, e))
}

/// Bar chart of mean revenue per discount bin
pub fn render_revenue_by_bin(bins: &[BinSummary], path: &Path) -> Result<()> {
    let labels: Vec<String> = bins.iter().map(|b| b.label.clone()).collect();
    let values: Vec<f64> = bins.iter().map(|b| b.mean_revenue.unwrap_or(0.0)).collect();
    draw_bars(
        path,
        "Revenue by Discount Level",
        "Avg Revenue",
        &labels,
        &values,
        RGBColor(255, 165, 0),
    )
    .map_err(|e| render_error(path, e))
}

/// Scatter plot of last-snapshot discount against booking change
pub fn render_discount_scatter(discounts: &[f64], changes: &[f64], path: &Path) -> Result<()> {
    draw_scatter(path, discounts, changes).map_err(|e| render_error(path, e))
}

/// Render all three charts into `output_dir`, creating it if needed.
pub fn generate_charts(
    bins: &[BinSummary],
    discounts: &[f64],
    changes: &[f64],
    output_dir: &Path,
) -> Result<ChartPaths> {
    std::fs::create_dir_all(output_dir).map_err(|source| AnalysisError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let paths = ChartPaths {
        sweet_spot: output_dir.join(SWEET_SPOT_FILE),
        revenue: output_dir.join(REVENUE_FILE),
        scatter: output_dir.join(SCATTER_FILE),
    };

    render_sweet_spot(bins, &paths.sweet_spot)?;
    render_revenue_by_bin(bins, &paths.revenue)?;
    render_discount_scatter(discounts, changes, &paths.scatter)?;

    info!(dir = %output_dir.display(), "charts written");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_bins() -> Vec<BinSummary> {
        vec![
            BinSummary {
                label: "(0, 0.1]".to_string(),
                windows: 2,
                mean_booking_change: Some(4.0),
                mean_revenue: Some(900.0),
            },
            BinSummary {
                label: "(0.1, 0.2]".to_string(),
                windows: 1,
                mean_booking_change: Some(6.0),
                mean_revenue: Some(600.0),
            },
            BinSummary {
                label: "(0.2, 0.3]".to_string(),
                windows: 0,
                mean_booking_change: None,
                mean_revenue: None,
            },
        ]
    }

    #[test]
    fn test_generate_charts() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("plots");

        let paths = generate_charts(
            &sample_bins(),
            &[0.1, 0.2, 0.5, 0.1],
            &[5.0, 6.0, 0.0, 3.0],
            &output_dir,
        )
        .unwrap();

        assert_eq!(paths.sweet_spot, output_dir.join(SWEET_SPOT_FILE));
        for path in [&paths.sweet_spot, &paths.revenue, &paths.scatter] {
            assert!(path.exists());
            assert!(std::fs::metadata(path).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_render_discount_scatter_with_no_points() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(SCATTER_FILE);

        let result = render_discount_scatter(&[], &[], &path);
        assert!(result.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_padded_range_for_bars() {
        let (lo, hi) = padded_range([2.0, 4.0, 10.0], true);
        assert_eq!(lo, 0.0);
        assert!((hi - 11.0).abs() < 1e-12);

        let (lo, hi) = padded_range([-5.0, 5.0], true);
        assert!((lo + 6.0).abs() < 1e-12);
        assert!((hi - 6.0).abs() < 1e-12);

        let (lo, hi) = padded_range([-4.0, -2.0], true);
        assert!((lo + 4.4).abs() < 1e-12);
        assert_eq!(hi, 0.0);
    }

    #[test]
    fn test_padded_range_for_scatter() {
        let (lo, hi) = padded_range([0.1, 0.3, f64::NAN], false);
        assert!((lo - 0.08).abs() < 1e-12);
        assert!((hi - 0.32).abs() < 1e-12);

        assert_eq!(padded_range([3.0], false), (2.0, 4.0));
        assert_eq!(padded_range(Vec::<f64>::new(), false), (0.0, 1.0));
    }
}
