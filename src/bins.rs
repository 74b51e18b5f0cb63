//! Discount "sweet spot" binning and revenue per discount level

use tracing::{info, warn};

use crate::snapshot::BookingChange;

/// Bin boundaries used when none are configured.
pub const DEFAULT_BIN_EDGES: [f64; 6] = [0.0, 0.1, 0.2, 0.3, 0.5, 1.0];

/// Right-closed, left-open discount bins: `(e0, e1], (e1, e2], ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountBins {
    edges: Vec<f64>,
}

impl Default for DiscountBins {
    fn default() -> Self {
        Self {
            edges: DEFAULT_BIN_EDGES.to_vec(),
        }
    }
}

impl DiscountBins {
    /// Build bins from strictly increasing edges; `None` otherwise.
    pub fn new(edges: Vec<f64>) -> Option<Self> {
        let increasing = edges.windows(2).all(|pair| pair[0] < pair[1]);
        if edges.len() < 2 || !increasing {
            return None;
        }
        Some(Self { edges })
    }

    /// Number of bins, one fewer than the edges.
    pub fn count(&self) -> usize {
        self.edges.len() - 1
    }

    /// Index of the bin `(lo, hi]` holding `value`; values on or below the
    /// first edge, above the last, or NaN fall into no bin.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        self.edges
            .windows(2)
            .position(|pair| value > pair[0] && value <= pair[1])
    }

    /// Interval label in the `(0.1, 0.2]` form.
    pub fn label(&self, index: usize) -> String {
        format!("({}, {}]", self.edges[index], self.edges[index + 1])
    }
}

/// Booking and revenue outcome of one discount bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSummary {
    pub label: String,
    pub windows: usize,
    pub mean_booking_change: Option<f64>,
    pub mean_revenue: Option<f64>,
}

#[derive(Default)]
struct Accumulator {
    windows: usize,
    change_sum: f64,
    change_count: usize,
    revenue_sum: f64,
    revenue_count: usize,
}

impl Accumulator {
    fn push(&mut self, record: &BookingChange) {
        self.windows += 1;
        if let Some(change) = record.booking_change.filter(|v| !v.is_nan()) {
            self.change_sum += change;
            self.change_count += 1;
        }
        if let Some(revenue) = record.revenue.filter(|v| !v.is_nan()) {
            self.revenue_sum += revenue;
            self.revenue_count += 1;
        }
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

/// Assign each window its `discount_bin` by `discount_pct_last`.
pub fn assign_bins(records: &[BookingChange], bins: &DiscountBins) -> Vec<Option<usize>> {
    records
        .iter()
        .map(|record| {
            record
                .discount_pct_last
                .and_then(|value| bins.bin_index(value))
        })
        .collect()
}

/// Mean booking change and mean revenue per bin, in bin order.
///
/// Windows outside every bin are left out; empty bins report `None` means.
pub fn summarize_bins(records: &[BookingChange], bins: &DiscountBins) -> Vec<BinSummary> {
    let mut accumulators: Vec<Accumulator> =
        (0..bins.count()).map(|_| Accumulator::default()).collect();

    let assignments = assign_bins(records, bins);
    for (record, bin) in records.iter().zip(&assignments) {
        if let Some(index) = bin {
            accumulators[*index].push(record);
        }
    }

    let binned: usize = accumulators.iter().map(|acc| acc.windows).sum();
    if binned == 0 {
        warn!("no booking window fell into a discount bin");
    }
    info!(
        bins = bins.count(),
        binned,
        unbinned = records.len() - binned,
        "summarized discount bins"
    );

    accumulators
        .into_iter()
        .enumerate()
        .map(|(index, acc)| BinSummary {
            label: bins.label(index),
            windows: acc.windows,
            mean_booking_change: mean(acc.change_sum, acc.change_count),
            mean_revenue: mean(acc.revenue_sum, acc.revenue_count),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(pct: Option<f64>, change: f64, price: f64) -> BookingChange {
        BookingChange {
            hotel: Some("A".to_string()),
            checkin: Some("2024-01-01".to_string()),
            discount_code_last: Some("1".to_string()),
            discount_pct_last: pct,
            discount_price_last: Some(price),
            booking_change: Some(change),
            revenue: Some(change * price),
        }
    }

    #[test]
    fn test_bin_edges_are_right_closed() {
        let bins = DiscountBins::default();
        assert_eq!(bins.count(), 5);
        assert_eq!(bins.bin_index(0.1), Some(0));
        assert_eq!(bins.bin_index(0.10001), Some(1));
        assert_eq!(bins.bin_index(0.0), None);
        assert_eq!(bins.bin_index(-0.05), None);
        assert_eq!(bins.bin_index(1.0), Some(4));
        assert_eq!(bins.bin_index(1.2), None);
        assert_eq!(bins.bin_index(f64::NAN), None);
    }

    #[test]
    fn test_labels() {
        let bins = DiscountBins::default();
        assert_eq!(bins.label(0), "(0, 0.1]");
        assert_eq!(bins.label(3), "(0.3, 0.5]");
    }

    #[test]
    fn test_invalid_edges() {
        assert!(DiscountBins::new(vec![0.0]).is_none());
        assert!(DiscountBins::new(vec![0.0, 0.2, 0.1]).is_none());
        assert_eq!(DiscountBins::new(vec![0.0, 0.5]).map(|b| b.count()), Some(1));
    }

    #[test]
    fn test_summarize_bins_preserves_bin_order() {
        let records = vec![
            window(Some(0.4), 2.0, 50.0),
            window(Some(0.05), 6.0, 100.0),
            window(Some(0.1), 4.0, 100.0),
            window(Some(0.0), 9.0, 100.0),
            window(None, 9.0, 100.0),
        ];

        let summary = summarize_bins(&records, &DiscountBins::default());
        assert_eq!(summary.len(), 5);

        assert_eq!(summary[0].label, "(0, 0.1]");
        assert_eq!(summary[0].windows, 2);
        assert_eq!(summary[0].mean_booking_change, Some(5.0));
        assert_eq!(summary[0].mean_revenue, Some(500.0));

        assert_eq!(summary[1].windows, 0);
        assert_eq!(summary[1].mean_booking_change, None);

        assert_eq!(summary[3].mean_booking_change, Some(2.0));
        assert_eq!(summary[3].mean_revenue, Some(100.0));
    }

    #[test]
    fn test_assign_bins() {
        let records = vec![window(Some(0.25), 1.0, 1.0), window(Some(0.0), 1.0, 1.0)];
        assert_eq!(
            assign_bins(&records, &DiscountBins::default()),
            vec![Some(2), None]
        );
    }
}
