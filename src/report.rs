//! Console report of every pipeline stage

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::bins::BinSummary;
use crate::clean::CleaningSummary;
use crate::data::{DatasetProfile, PREVIEW_ROWS};
use crate::effectiveness::{DiscountEffect, RegressionSummary};
use crate::model::{HotelSegment, SegmentationModel};
use crate::pipeline::AnalysisReport;

/// Print the whole report to stdout, stage by stage.
pub fn print_report(report: &AnalysisReport) {
    print_profile(&report.profile);
    print_cleaning(&report.cleaning);

    println!("\nDiscount Effectiveness (avg booking change):");
    println!("{}", effectiveness_table(&report.effectiveness, PREVIEW_ROWS));

    println!("\nRegression Results:");
    println!("{}", regression_table(&report.regression));

    println!("\nAverage Bookings by Discount Bin:");
    println!("{}", bin_table(&report.bins, BinMetric::BookingChange));

    println!("\nAverage Revenue by Discount Bin:");
    println!("{}", bin_table(&report.bins, BinMetric::Revenue));

    println!("\nHotel Clusters:");
    println!("{}", segment_table(&report.hotels, PREVIEW_ROWS));
    println!("{}", cluster_size_table(&report.segmentation));

    if let Some(charts) = &report.charts {
        println!("\nCharts:");
        println!("  {}", charts.sweet_spot.display());
        println!("  {}", charts.revenue.display());
        println!("  {}", charts.scatter.display());
    }
}

/// Head, shape, columns, null counts and summary statistics.
pub fn print_profile(profile: &DatasetProfile) {
    println!("First {PREVIEW_ROWS} rows of data:");
    println!("{}", profile.head);
    println!("\nData shape: ({}, {})", profile.rows, profile.width);

    let mut columns = styled_table(vec!["Column", "Type", "Missing"]);
    for column in &profile.columns {
        columns.add_row(vec![
            Cell::new(&column.name),
            Cell::new(&column.dtype),
            Cell::new(column.nulls),
        ]);
    }
    align_column(&mut columns, 2, CellAlignment::Right);
    println!("\nColumns and missing values:");
    println!("{columns}");

    let mut describe = styled_table(vec!["Column", "count", "mean", "std", "min", "50%", "max"]);
    for summary in &profile.numeric {
        describe.add_row(vec![
            Cell::new(&summary.name),
            Cell::new(summary.count),
            Cell::new(format_value(summary.mean, 4)),
            Cell::new(format_value(summary.std, 4)),
            Cell::new(format_value(summary.min, 4)),
            Cell::new(format_value(summary.median, 4)),
            Cell::new(format_value(summary.max, 4)),
        ]);
    }
    for index in 1..7 {
        align_column(&mut describe, index, CellAlignment::Right);
    }
    println!("\nData description:");
    println!("{describe}");
}

pub fn print_cleaning(summary: &CleaningSummary) {
    println!(
        "\nCleaning: {} rows in, {} sentinel values nulled, {} incomplete rows dropped, \
         {} duplicates dropped, {} rows out",
        summary.input_rows,
        summary.sentinels_replaced,
        summary.incomplete_dropped,
        summary.duplicates_dropped,
        summary.output_rows
    );
}

/// Best `limit` discount codes.
pub fn effectiveness_table(effects: &[DiscountEffect], limit: usize) -> Table {
    let mut table = styled_table(vec!["Discount Code_last", "windows", "booking_change"]);
    for effect in effects.iter().take(limit) {
        table.add_row(vec![
            Cell::new(effect.code.as_deref().unwrap_or("NaN")),
            Cell::new(effect.windows),
            Cell::new(format_value(effect.mean_booking_change, 4)),
        ]);
    }
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table
}

pub fn regression_table(fit: &RegressionSummary) -> Table {
    let mut table = styled_table(vec!["Statistic", "Value"]);
    table.add_row(vec![Cell::new("Samples"), Cell::new(fit.samples)]);
    table.add_row(vec![
        Cell::new("Coefficient for discount %"),
        Cell::new(format_value(Some(fit.coefficient), 6)),
    ]);
    table.add_row(vec![
        Cell::new("Intercept"),
        Cell::new(format_value(Some(fit.intercept), 6)),
    ]);
    table.add_row(vec![
        Cell::new("R2 Score"),
        Cell::new(format_value(Some(fit.r2), 6)),
    ]);
    table.add_row(vec![
        Cell::new("RMSE"),
        Cell::new(format_value(Some(fit.rmse), 6)),
    ]);
    align_column(&mut table, 1, CellAlignment::Right);
    table
}

/// Which per-bin mean a bin table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinMetric {
    BookingChange,
    Revenue,
}

pub fn bin_table(bins: &[BinSummary], metric: BinMetric) -> Table {
    let header = match metric {
        BinMetric::BookingChange => "booking_change",
        BinMetric::Revenue => "revenue",
    };
    let mut table = styled_table(vec!["discount_bin", "windows", header]);
    for bin in bins {
        let value = match metric {
            BinMetric::BookingChange => bin.mean_booking_change,
            BinMetric::Revenue => bin.mean_revenue,
        };
        table.add_row(vec![
            Cell::new(&bin.label),
            Cell::new(bin.windows),
            Cell::new(format_value(value, 4)),
        ]);
    }
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table
}

/// First `limit` hotels with their features and cluster.
pub fn segment_table(segments: &[HotelSegment], limit: usize) -> Table {
    let mut table = styled_table(vec!["Hotel Name", "avg_price", "avg_discount", "stars", "cluster"]);
    for segment in segments.iter().take(limit) {
        let features = &segment.features;
        table.add_row(vec![
            Cell::new(features.hotel.as_deref().unwrap_or("NaN")),
            Cell::new(format_value(Some(features.avg_price), 2)),
            Cell::new(format_value(Some(features.avg_discount), 4)),
            Cell::new(format_value(Some(features.stars), 1)),
            Cell::new(segment.cluster).add_attribute(Attribute::Bold),
        ]);
    }
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table
}

pub fn cluster_size_table(model: &SegmentationModel) -> Table {
    let sizes = model.cluster_sizes();
    let total: usize = sizes.iter().sum();
    let mut table = styled_table(vec!["Cluster", "Hotels", "Share"]);
    for (cluster, &size) in sizes.iter().enumerate() {
        let share = if total > 0 {
            size as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(cluster),
            Cell::new(size),
            Cell::new(format!("{share:.1}%")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Inertia").add_attribute(Attribute::Bold),
        Cell::new(format_value(Some(model.inertia), 2)),
        Cell::new(""),
    ]);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table
}

/// Fixed-precision number, `NaN` for missing values.
pub fn format_value(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        Some(v) => v.to_string(),
        None => "NaN".to_string(),
    }
}

fn styled_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        header
            .into_iter()
            .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
