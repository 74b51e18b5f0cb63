//! First/last snapshot reduction per (hotel, check-in date)

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{info, warn};

use crate::data::{
    column_f64, column_string, require_columns, AVAILABLE_ROOMS, CHECKIN_DATE, DISCOUNT_CODE,
    DISCOUNT_PRICE, HOTEL_NAME, SNAPSHOT_DATE,
};
use crate::error::{AnalysisError, Result};
use crate::features::DISCOUNT_PCT;

pub const FIRST_SUFFIX: &str = "_first";
pub const LAST_SUFFIX: &str = "_last";
pub const BOOKING_CHANGE: &str = "booking_change";
pub const REVENUE: &str = "revenue";

/// Columns identifying one booking window.
pub const GROUP_KEYS: [&str; 2] = [HOTEL_NAME, CHECKIN_DATE];

const DATETIME_LAYOUTS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// One (hotel, check-in date) window reduced to its first and last snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingChange {
    pub hotel: Option<String>,
    pub checkin: Option<String>,
    pub discount_code_last: Option<String>,
    pub discount_pct_last: Option<f64>,
    pub discount_price_last: Option<f64>,
    /// Rooms at the first snapshot minus rooms at the last; positive means sold.
    pub booking_change: Option<f64>,
    pub revenue: Option<f64>,
}

/// `name` with the first-snapshot suffix.
pub fn first_of(name: &str) -> String {
    format!("{name}{FIRST_SUFFIX}")
}

/// `name` with the last-snapshot suffix.
pub fn last_of(name: &str) -> String {
    format!("{name}{LAST_SUFFIX}")
}

/// Parse one snapshot timestamp in any of the accepted layouts.
pub fn parse_snapshot_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(parsed);
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, layout) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Replace the `Snapshot Date` text column with a millisecond `Datetime`.
pub fn parse_snapshot_dates(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[SNAPSHOT_DATE])?;

    if matches!(
        df.column(SNAPSHOT_DATE)?.dtype(),
        DataType::Datetime(_, _) | DataType::Date
    ) {
        let mut out = df.clone();
        let parsed = out
            .column(SNAPSHOT_DATE)?
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        out.with_column(parsed)?;
        return Ok(out);
    }

    let raw = column_string(df, SNAPSHOT_DATE)?;
    let mut millis = Vec::with_capacity(raw.len());
    for value in raw {
        match value {
            None => millis.push(None),
            Some(text) => {
                let parsed = parse_snapshot_timestamp(&text)
                    .ok_or(AnalysisError::InvalidSnapshotDate { value: text })?;
                millis.push(Some(parsed.and_utc().timestamp_millis()));
            }
        }
    }

    let parsed = Series::new(SNAPSHOT_DATE.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let mut out = df.clone();
    out.with_column(parsed)?;
    Ok(out)
}

/// Reduce snapshots to one row per (hotel, check-in date).
///
/// Rows missing the hotel, the check-in date or the snapshot date belong to
/// no window and are skipped. The rest are stable-sorted by snapshot date,
/// so the first row of a group is its earliest snapshot and the last row
/// its latest, with ties kept in input order. Every non-key column appears
/// twice, suffixed `_first` and `_last`, followed by `booking_change` and
/// `revenue`.
pub fn reduce_snapshots(df: &DataFrame) -> Result<DataFrame> {
    require_columns(
        df,
        &[
            HOTEL_NAME,
            CHECKIN_DATE,
            SNAPSHOT_DATE,
            AVAILABLE_ROOMS,
            DISCOUNT_PRICE,
        ],
    )?;

    let parsed = parse_snapshot_dates(df)?
        .lazy()
        .filter(
            col(HOTEL_NAME)
                .is_not_null()
                .and(col(CHECKIN_DATE).is_not_null())
                .and(col(SNAPSHOT_DATE).is_not_null()),
        )
        .collect()?;
    let skipped = df.height() - parsed.height();
    if skipped > 0 {
        warn!(skipped, "skipped snapshots without hotel, check-in or snapshot date");
    }

    let value_columns: Vec<String> = parsed
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| !GROUP_KEYS.contains(&name.as_str()))
        .collect();

    let mut aggregations = Vec::with_capacity(value_columns.len() * 2);
    for name in &value_columns {
        aggregations.push(col(name.as_str()).first().alias(first_of(name)));
    }
    for name in &value_columns {
        aggregations.push(col(name.as_str()).last().alias(last_of(name)));
    }

    let rooms_first = first_of(AVAILABLE_ROOMS);
    let rooms_last = last_of(AVAILABLE_ROOMS);
    let price_last = last_of(DISCOUNT_PRICE);

    let book = parsed
        .lazy()
        .sort(
            [SNAPSHOT_DATE],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .group_by_stable([col(HOTEL_NAME), col(CHECKIN_DATE)])
        .agg(aggregations)
        .sort(
            GROUP_KEYS,
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .with_column(
            (col(rooms_first.as_str()).cast(DataType::Float64)
                - col(rooms_last.as_str()).cast(DataType::Float64))
            .alias(BOOKING_CHANGE),
        )
        .with_column(
            (col(BOOKING_CHANGE) * col(price_last.as_str()).cast(DataType::Float64)).alias(REVENUE),
        )
        .collect()?;

    info!(
        snapshots = df.height(),
        windows = book.height(),
        "reduced snapshots to booking windows"
    );
    Ok(book)
}

/// Typed view over the reduced table.
pub fn booking_changes(book: &DataFrame) -> Result<Vec<BookingChange>> {
    let code_last = last_of(DISCOUNT_CODE);
    let pct_last = last_of(DISCOUNT_PCT);
    let price_last = last_of(DISCOUNT_PRICE);
    require_columns(
        book,
        &[
            HOTEL_NAME,
            CHECKIN_DATE,
            code_last.as_str(),
            pct_last.as_str(),
            price_last.as_str(),
            BOOKING_CHANGE,
            REVENUE,
        ],
    )?;

    let hotels = column_string(book, HOTEL_NAME)?;
    let checkins = column_string(book, CHECKIN_DATE)?;
    let codes = column_string(book, &code_last)?;
    let pcts = column_f64(book, &pct_last)?;
    let prices = column_f64(book, &price_last)?;
    let changes = column_f64(book, BOOKING_CHANGE)?;
    let revenues = column_f64(book, REVENUE)?;

    let records = hotels
        .into_iter()
        .zip(checkins)
        .zip(codes)
        .zip(pcts)
        .zip(prices)
        .zip(changes)
        .zip(revenues)
        .map(
            |((((((hotel, checkin), code), pct), price), change), revenue)| BookingChange {
                hotel,
                checkin,
                discount_code_last: code,
                discount_pct_last: pct,
                discount_price_last: price,
                booking_change: change,
                revenue,
            },
        )
        .collect();

    Ok(records)
}
