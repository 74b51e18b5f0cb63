//! Hotel segmentation with K-Means clustering

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::data::{
    column_f64, column_string, require_columns, HOTEL_NAME, HOTEL_STARS, ORIGINAL_PRICE,
};
use crate::error::{AnalysisError, Result};
use crate::features::DISCOUNT_PCT;

const AVG_PRICE: &str = "avg_price";
const AVG_DISCOUNT: &str = "avg_discount";
const STARS: &str = "stars";

/// Number of features per hotel fed to K-Means.
pub const N_FEATURES: usize = 3;

/// Pricing profile of one hotel over all of its snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelFeatures {
    pub hotel: Option<String>,
    /// Mean original price
    pub avg_price: f64,
    /// Mean discount_pct
    pub avg_discount: f64,
    /// Median star rating
    pub stars: f64,
}

impl HotelFeatures {
    fn as_row(&self) -> [f64; N_FEATURES] {
        [self.avg_price, self.avg_discount, self.stars]
    }
}

/// A hotel with its assigned cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelSegment {
    pub features: HotelFeatures,
    pub cluster: usize,
}

/// K-Means hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iters: usize,
    pub tolerance: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            seed: 42,
            max_iters: 300,
            tolerance: 1e-4,
        }
    }
}

/// K-Means model wrapper with fitted parameters
#[derive(Debug)]
pub struct SegmentationModel {
    /// Fitted K-Means model from linfa
    pub model: KMeans<f64, L2Dist>,
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignments, one per hotel in feature order
    pub labels: Array1<usize>,
    /// Cluster centroids in raw feature space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
}

impl SegmentationModel {
    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Pair each hotel with its cluster label.
    pub fn segments(&self, features: &[HotelFeatures]) -> Vec<HotelSegment> {
        features
            .iter()
            .zip(self.labels.iter())
            .map(|(features, &cluster)| HotelSegment {
                features: features.clone(),
                cluster,
            })
            .collect()
    }
}

/// Per-hotel mean price, mean discount and median stars, sorted by hotel.
///
/// Computed over every cleaned snapshot (not the reduced windows) that
/// names a hotel. NaN discounts are skipped by the mean; empty or non-finite
/// aggregates become 0.
pub fn hotel_features(data: &DataFrame) -> Result<Vec<HotelFeatures>> {
    require_columns(data, &[HOTEL_NAME, ORIGINAL_PRICE, DISCOUNT_PCT, HOTEL_STARS])?;

    let grouped = data
        .clone()
        .lazy()
        .filter(col(HOTEL_NAME).is_not_null())
        .group_by([col(HOTEL_NAME)])
        .agg([
            col(ORIGINAL_PRICE)
                .cast(DataType::Float64)
                .mean()
                .alias(AVG_PRICE),
            col(DISCOUNT_PCT)
                .fill_nan(lit(NULL))
                .mean()
                .alias(AVG_DISCOUNT),
            col(HOTEL_STARS)
                .cast(DataType::Float64)
                .median()
                .alias(STARS),
        ])
        .sort([HOTEL_NAME], SortMultipleOptions::default())
        .collect()?;

    let hotels = column_string(&grouped, HOTEL_NAME)?;
    let prices = column_f64(&grouped, AVG_PRICE)?;
    let discounts = column_f64(&grouped, AVG_DISCOUNT)?;
    let stars = column_f64(&grouped, STARS)?;

    let features: Vec<HotelFeatures> = hotels
        .into_iter()
        .zip(prices)
        .zip(discounts)
        .zip(stars)
        .map(|(((hotel, price), discount), stars)| HotelFeatures {
            hotel,
            avg_price: finite_or_zero(price),
            avg_discount: finite_or_zero(discount),
            stars: finite_or_zero(stars),
        })
        .collect();

    info!(hotels = features.len(), "built hotel features");
    Ok(features)
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Stack hotel features into an `(n_hotels, 3)` matrix.
pub fn feature_matrix(features: &[HotelFeatures]) -> Result<Array2<f64>> {
    let mut raw = Vec::with_capacity(features.len() * N_FEATURES);
    for hotel in features {
        raw.extend_from_slice(&hotel.as_row());
    }
    Ok(Array2::from_shape_vec((features.len(), N_FEATURES), raw)?)
}

/// Fit K-Means on unscaled hotel features
///
/// # Arguments
/// * `features` - One row per hotel, as returned by [`hotel_features`]
/// * `params` - Cluster count, seed and convergence settings
///
/// # Returns
/// * Fitted `SegmentationModel`; the same input and seed always yield the
///   same labels
pub fn segment_hotels(
    features: &[HotelFeatures],
    params: &SegmentParams,
) -> Result<SegmentationModel> {
    if params.n_clusters == 0 || features.len() < params.n_clusters {
        return Err(AnalysisError::TooFewHotels {
            hotels: features.len(),
            clusters: params.n_clusters,
        });
    }

    let records = feature_matrix(features)?;
    let n_samples = records.nrows();
    let targets: Array1<usize> = Array1::zeros(n_samples);
    let dataset = Dataset::new(records.clone(), targets);

    let rng = StdRng::seed_from_u64(params.seed);
    let model = KMeans::params_with(params.n_clusters, rng, L2Dist)
        .max_n_iterations(params.max_iters as u64)
        .tolerance(params.tolerance)
        .fit(&dataset)
        .map_err(|e| AnalysisError::Model {
            message: e.to_string(),
        })?;

    let labels: Array1<usize> = model.predict(&records);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(&records, &labels, &centroids);

    info!(
        hotels = n_samples,
        clusters = params.n_clusters,
        inertia,
        "segmented hotels"
    );

    Ok(SegmentationModel {
        model,
        n_clusters: params.n_clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: &Array2<f64>,
) -> f64 {
    let mut inertia = 0.0;

    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let point = features.row(i);
            let centroid = centroids.row(cluster);
            inertia += point
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
        }
    }

    inertia
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel(name: &str, price: f64, discount: f64, stars: f64) -> HotelFeatures {
        HotelFeatures {
            hotel: Some(name.to_string()),
            avg_price: price,
            avg_discount: discount,
            stars,
        }
    }

    fn three_tiers() -> Vec<HotelFeatures> {
        vec![
            hotel("Budget 1", 80.0, 0.05, 2.0),
            hotel("Budget 2", 85.0, 0.06, 2.0),
            hotel("Mid 1", 200.0, 0.10, 3.0),
            hotel("Mid 2", 210.0, 0.12, 3.0),
            hotel("Lux 1", 600.0, 0.20, 5.0),
            hotel("Lux 2", 620.0, 0.25, 5.0),
        ]
    }

    #[test]
    fn test_hotel_features() {
        let data = df!(
            "Hotel Name" => ["B", "A", "A", "A", "B"],
            "Original Price" => [300.0, 100.0, 200.0, 150.0, 100.0],
            "discount_pct" => [0.1, 0.2, f64::NAN, 0.4, 0.3],
            "Hotel Stars" => [None, Some(3.0), Some(4.0), Some(5.0), None]
        )
        .unwrap();

        let features = hotel_features(&data).unwrap();
        assert_eq!(features.len(), 2);

        let a = &features[0];
        assert_eq!(a.hotel.as_deref(), Some("A"));
        assert!((a.avg_price - 150.0).abs() < 1e-12);
        assert!((a.avg_discount - 0.3).abs() < 1e-12);
        assert_eq!(a.stars, 4.0);

        // Stars are all missing for B, so the median is filled with 0.
        let b = &features[1];
        assert_eq!(b.hotel.as_deref(), Some("B"));
        assert!((b.avg_discount - 0.2).abs() < 1e-12);
        assert_eq!(b.stars, 0.0);
    }

    #[test]
    fn test_unnamed_rows_are_not_a_hotel() {
        let data = df!(
            "Hotel Name" => [Some("A"), Some("A"), Some("B"), None],
            "Original Price" => [100.0, 200.0, 300.0, 5000.0],
            "discount_pct" => [0.1, 0.1, 0.2, 0.9],
            "Hotel Stars" => [3.0, 3.0, 4.0, 1.0]
        )
        .unwrap();

        let features = hotel_features(&data).unwrap();
        let names: Vec<Option<&str>> = features.iter().map(|f| f.hotel.as_deref()).collect();
        assert_eq!(names, vec![Some("A"), Some("B")]);
        assert!((features[0].avg_price - 150.0).abs() < 1e-12);

        let result = segment_hotels(&features, &SegmentParams::default());
        assert!(matches!(result, Err(AnalysisError::TooFewHotels { hotels: 2, .. })));
    }

    #[test]
    fn test_segment_hotels() {
        let features = three_tiers();
        let model = segment_hotels(&features, &SegmentParams::default()).unwrap();

        assert_eq!(model.n_clusters, 3);
        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.centroids.shape(), &[3, N_FEATURES]);
        assert!(model.labels.iter().all(|&label| label < 3));

        // Price dominates the unscaled features, so tiers stay together.
        assert_eq!(model.labels[0], model.labels[1]);
        assert_eq!(model.labels[2], model.labels[3]);
        assert_eq!(model.labels[4], model.labels[5]);
        assert_ne!(model.labels[0], model.labels[2]);
        assert_ne!(model.labels[2], model.labels[4]);
        assert_ne!(model.labels[0], model.labels[4]);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let features = three_tiers();
        let params = SegmentParams::default();

        let first = segment_hotels(&features, &params).unwrap();
        let second = segment_hotels(&features, &params).unwrap();
        assert_eq!(first.labels, second.labels);
    }

    #[test]
    fn test_cluster_sizes() {
        let model = segment_hotels(&three_tiers(), &SegmentParams::default()).unwrap();

        let sizes = model.cluster_sizes();
        assert_eq!(sizes, vec![2, 2, 2]);
        assert!(model.inertia >= 0.0 && model.inertia.is_finite());
    }

    #[test]
    fn test_segments_pair_labels() {
        let features = three_tiers();
        let model = segment_hotels(&features, &SegmentParams::default()).unwrap();

        let segments = model.segments(&features);
        assert_eq!(segments.len(), 6);
        assert_eq!(segments[5].features.hotel.as_deref(), Some("Lux 2"));
        assert_eq!(segments[5].cluster, model.labels[5]);
    }

    #[test]
    fn test_too_few_hotels() {
        let features = vec![hotel("A", 100.0, 0.1, 3.0), hotel("B", 120.0, 0.1, 3.0)];
        let result = segment_hotels(&features, &SegmentParams::default());
        assert!(matches!(
            result,
            Err(AnalysisError::TooFewHotels {
                hotels: 2,
                clusters: 3
            })
        ));
    }
}
