//! Per-row derived features

use polars::prelude::*;
use tracing::debug;

use crate::data::{require_columns, DISCOUNT_PRICE, ORIGINAL_PRICE};
use crate::error::Result;

pub const DISCOUNT_PCT: &str = "discount_pct";

/// Append `discount_pct = (original - discounted) / original`.
///
/// A zero original price yields NaN or ±inf rather than an error, and
/// negative values (price increases) are kept as is.
pub fn add_discount_pct(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[ORIGINAL_PRICE, DISCOUNT_PRICE])?;

    let original = col(ORIGINAL_PRICE).cast(DataType::Float64);
    let discounted = col(DISCOUNT_PRICE).cast(DataType::Float64);

    let out = df
        .clone()
        .lazy()
        .with_column(((original.clone() - discounted) / original).alias(DISCOUNT_PCT))
        .collect()?;

    debug!(rows = out.height(), "derived discount_pct");
    Ok(out)
}
