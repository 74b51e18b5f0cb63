//! Sentinel normalization, required-value filtering and de-duplication

use polars::prelude::*;
use tracing::info;

use crate::data::{
    is_numeric_dtype, require_columns, AVAILABLE_ROOMS, DISCOUNT_PRICE, HOTEL_STARS,
    ORIGINAL_PRICE,
};
use crate::error::{AnalysisError, Result};

/// Placeholder the raw data uses for "no value".
pub const SENTINEL: i32 = -1;

/// Columns a row must carry to survive cleaning.
pub const REQUIRED_VALUES: [&str; 3] = [ORIGINAL_PRICE, DISCOUNT_PRICE, AVAILABLE_ROOMS];

/// Row counts through each cleaning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningSummary {
    pub input_rows: usize,
    pub sentinels_replaced: usize,
    pub incomplete_dropped: usize,
    pub duplicates_dropped: usize,
    pub output_rows: usize,
}

/// Clean a raw snapshot table.
///
/// Steps, in order:
/// 1. `-1` in any numeric column becomes null
/// 2. price, room and star columns are cast to `f64`
/// 3. rows missing a price or the room count are dropped
/// 4. exact duplicates are dropped, keeping the first occurrence
pub fn clean_snapshots(df: &DataFrame) -> Result<(DataFrame, CleaningSummary)> {
    require_columns(df, &REQUIRED_VALUES)?;

    let input_rows = df.height();
    let sentinels_replaced = count_sentinels(df)?;

    let mut replacements = Vec::new();
    for column in df.get_columns() {
        if !is_numeric_dtype(column.dtype()) {
            continue;
        }
        let name = column.name().as_str();
        replacements.push(
            when(col(name).eq(lit(SENTINEL)))
                .then(lit(NULL).cast(column.dtype().clone()))
                .otherwise(col(name))
                .alias(name),
        );
    }

    let mut casts = vec![
        col(ORIGINAL_PRICE).cast(DataType::Float64),
        col(DISCOUNT_PRICE).cast(DataType::Float64),
        col(AVAILABLE_ROOMS).cast(DataType::Float64),
    ];
    if df.column(HOTEL_STARS).is_ok() {
        casts.push(col(HOTEL_STARS).cast(DataType::Float64));
    }

    let complete = REQUIRED_VALUES
        .iter()
        .map(|name| col(*name).is_not_null().and(col(*name).is_not_nan()))
        .reduce(|acc, expr| acc.and(expr))
        .unwrap_or_else(|| lit(true));

    let filtered = df
        .clone()
        .lazy()
        .with_columns(replacements)
        .with_columns(casts)
        .filter(complete)
        .collect()?;
    let incomplete_dropped = input_rows - filtered.height();

    let deduped = filtered
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let duplicates_dropped = filtered.height() - deduped.height();

    if deduped.height() == 0 {
        return Err(AnalysisError::EmptyDataset { stage: "cleaning" });
    }

    let summary = CleaningSummary {
        input_rows,
        sentinels_replaced,
        incomplete_dropped,
        duplicates_dropped,
        output_rows: deduped.height(),
    };
    info!(
        rows = summary.output_rows,
        sentinels = summary.sentinels_replaced,
        incomplete = summary.incomplete_dropped,
        duplicates = summary.duplicates_dropped,
        "cleaned snapshots"
    );

    Ok((deduped, summary))
}

fn count_sentinels(df: &DataFrame) -> Result<usize> {
    let sentinel = f64::from(SENTINEL);
    let mut total = 0;
    for column in df.get_columns() {
        if !is_numeric_dtype(column.dtype()) {
            continue;
        }
        let values = column.cast(&DataType::Float64)?;
        total += values
            .f64()?
            .into_iter()
            .filter(|value| *value == Some(sentinel))
            .count();
    }
    Ok(total)
}
