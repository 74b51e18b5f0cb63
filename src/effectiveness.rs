//! Discount-code effectiveness and the booking-change regression

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::data::{column_f64, column_string, require_columns, DISCOUNT_CODE};
use crate::error::{AnalysisError, Result};
use crate::snapshot::{last_of, BookingChange, BOOKING_CHANGE};

const MEAN_BOOKING_CHANGE: &str = "mean_booking_change";
const WINDOWS: &str = "windows";

/// Mean booking change observed under one (last-snapshot) discount code.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountEffect {
    /// `None` groups the windows whose last snapshot had no code.
    pub code: Option<String>,
    pub windows: usize,
    pub mean_booking_change: Option<f64>,
}

/// Descriptive OLS fit of booking change on discount percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionSummary {
    pub samples: usize,
    pub coefficient: f64,
    pub intercept: f64,
    pub r2: f64,
    pub rmse: f64,
}

/// Mean booking change per last discount code, best code first.
pub fn discount_effectiveness(book: &DataFrame) -> Result<Vec<DiscountEffect>> {
    let code_last = last_of(DISCOUNT_CODE);
    require_columns(book, &[code_last.as_str(), BOOKING_CHANGE])?;

    let grouped = book
        .clone()
        .lazy()
        .with_column(col(code_last.as_str()).cast(DataType::String))
        .group_by_stable([col(code_last.as_str())])
        .agg([
            col(BOOKING_CHANGE).mean().alias(MEAN_BOOKING_CHANGE),
            col(BOOKING_CHANGE).len().alias(WINDOWS),
        ])
        .sort(
            [MEAN_BOOKING_CHANGE],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let codes = column_string(&grouped, &code_last)?;
    let means = column_f64(&grouped, MEAN_BOOKING_CHANGE)?;
    let windows = column_f64(&grouped, WINDOWS)?;

    let effects: Vec<DiscountEffect> = codes
        .into_iter()
        .zip(means)
        .zip(windows)
        .map(|((code, mean), windows)| DiscountEffect {
            code,
            windows: windows.unwrap_or(0.0) as usize,
            mean_booking_change: mean,
        })
        .collect();

    info!(codes = effects.len(), "computed discount effectiveness");
    Ok(effects)
}

/// Regression inputs with missing or non-finite values replaced by zero.
pub fn regression_inputs(records: &[BookingChange]) -> (Vec<f64>, Vec<f64>) {
    records
        .iter()
        .map(|record| {
            (
                zero_filled(record.discount_pct_last),
                zero_filled(record.booking_change),
            )
        })
        .unzip()
}

fn zero_filled(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Fit `booking_change ≈ coefficient * discount_pct_last + intercept`.
///
/// Scores are computed on the training rows; this is a descriptive fit.
pub fn fit_booking_regression(records: &[BookingChange]) -> Result<RegressionSummary> {
    let (discounts, changes) = regression_inputs(records);
    fit_linear(&discounts, &changes)
}

/// Ordinary least squares on a single feature.
///
/// # Arguments
/// * `x` - Predictor values
/// * `y` - Targets, same length as `x`
///
/// # Returns
/// * Coefficient, intercept, R² and RMSE over the same rows
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<RegressionSummary> {
    if x.is_empty() {
        return Err(AnalysisError::EmptyDataset {
            stage: "snapshot reduction",
        });
    }
    if x.len() != y.len() {
        return Err(AnalysisError::Model {
            message: format!("{} predictor values for {} targets", x.len(), y.len()),
        });
    }

    let records = Array2::from_shape_vec((x.len(), 1), x.to_vec())?;
    let targets = Array1::from(y.to_vec());

    let (coefficient, intercept, predicted) = if x.iter().any(|value| *value != x[0]) {
        let dataset = Dataset::new(records.clone(), targets.clone());
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| AnalysisError::Model {
                message: e.to_string(),
            })?;
        let predicted: Array1<f64> = fitted.predict(&records);
        (fitted.params()[0], fitted.intercept(), predicted)
    } else {
        // A constant predictor carries no signal: the best fit is the mean.
        warn!(value = x[0], "discount_pct_last is constant, regression is flat");
        let mean = targets.mean().unwrap_or(0.0);
        (0.0, mean, Array1::from_elem(x.len(), mean))
    };

    let r2 = predicted.r2(&targets).map_err(|e| AnalysisError::Model {
        message: e.to_string(),
    })?;
    let mse = predicted
        .mean_squared_error(&targets)
        .map_err(|e| AnalysisError::Model {
            message: e.to_string(),
        })?;

    let summary = RegressionSummary {
        samples: x.len(),
        coefficient,
        intercept,
        r2,
        rmse: mse.sqrt(),
    };
    debug!(?summary, "fitted booking regression");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: Option<&str>, pct: Option<f64>, change: Option<f64>) -> BookingChange {
        BookingChange {
            hotel: Some("A".to_string()),
            checkin: Some("2024-01-01".to_string()),
            discount_code_last: code.map(str::to_string),
            discount_pct_last: pct,
            discount_price_last: Some(100.0),
            booking_change: change,
            revenue: change.map(|c| c * 100.0),
        }
    }

    #[test]
    fn test_discount_effectiveness_sorted_descending() {
        let book = df!(
            "Discount Code_last" => [Some(1i64), Some(2), Some(1), None, Some(2)],
            "booking_change" => [2.0, 8.0, 4.0, 5.0, 6.0]
        )
        .unwrap();

        let effects = discount_effectiveness(&book).unwrap();
        assert_eq!(effects.len(), 3);

        assert_eq!(effects[0].code.as_deref(), Some("2"));
        assert_eq!(effects[0].mean_booking_change, Some(7.0));
        assert_eq!(effects[0].windows, 2);

        // Missing codes form their own group.
        assert_eq!(effects[1].code, None);
        assert_eq!(effects[1].mean_booking_change, Some(5.0));

        assert_eq!(effects[2].code.as_deref(), Some("1"));
        assert_eq!(effects[2].mean_booking_change, Some(3.0));
    }

    #[test]
    fn test_perfect_linear_fit() {
        let x = [0.05, 0.1, 0.2, 0.3, 0.45];
        let y: Vec<f64> = x.iter().map(|v| 50.0 * v).collect();

        let fit = fit_linear(&x, &y).unwrap();
        assert_eq!(fit.samples, 5);
        assert!((fit.coefficient - 50.0).abs() < 1e-6);
        assert!(fit.intercept.abs() < 1e-6);
        assert!((fit.r2 - 1.0).abs() < 1e-6);
        assert!(fit.rmse < 1e-6);
    }

    #[test]
    fn test_missing_inputs_are_zero_filled() {
        let records = vec![
            record(Some("1"), None, Some(3.0)),
            record(Some("1"), Some(f64::NAN), None),
            record(Some("2"), Some(0.2), Some(5.0)),
        ];

        let (x, y) = regression_inputs(&records);
        assert_eq!(x, vec![0.0, 0.0, 0.2]);
        assert_eq!(y, vec![3.0, 0.0, 5.0]);

        let fit = fit_booking_regression(&records).unwrap();
        assert_eq!(fit.samples, 3);
    }

    #[test]
    fn test_constant_predictor() {
        let fit = fit_linear(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(fit.coefficient, 0.0);
        assert!((fit.intercept - 2.0).abs() < 1e-12);
        assert!((fit.rmse - (2.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_regression_is_an_error() {
        assert!(fit_booking_regression(&[]).is_err());
    }
}
