//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::bins::DiscountBins;
use crate::config::AnalysisConfig;
use crate::model::SegmentParams;

/// Hotel discount analysis: booking change, revenue by discount level and
/// hotel segmentation from pricing snapshots
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the snapshot CSV file
    #[arg(short, long, default_value = "hotels_data.csv")]
    pub input: String,

    /// Directory the PNG charts are written to
    #[arg(short, long, default_value = "plots")]
    pub output_dir: String,

    /// Number of hotel clusters for K-Means
    #[arg(short = 'k', long, default_value = "3")]
    pub clusters: usize,

    /// Random seed for K-Means initialisation
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value = "300")]
    pub max_iters: usize,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value = "1e-4")]
    pub tolerance: f64,

    /// Discount bin edges, comma separated and strictly increasing
    #[arg(long, value_delimiter = ',', default_value = "0,0.1,0.2,0.3,0.5,1.0")]
    pub bin_edges: Vec<f64>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_plots: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Convert parsed flags into the pipeline configuration
    pub fn to_config(&self) -> crate::Result<AnalysisConfig> {
        if self.clusters == 0 {
            return Err(crate::AnalysisError::Model {
                message: "number of clusters must be at least 1".to_string(),
            });
        }

        let bins = DiscountBins::new(self.bin_edges.clone()).ok_or_else(|| {
            crate::AnalysisError::Model {
                message: format!(
                    "bin edges must be at least two increasing values, got {:?}",
                    self.bin_edges
                ),
            }
        })?;

        Ok(AnalysisConfig {
            input: PathBuf::from(&self.input),
            output_dir: PathBuf::from(&self.output_dir),
            bins,
            segments: SegmentParams {
                n_clusters: self.clusters,
                seed: self.seed,
                max_iters: self.max_iters,
                tolerance: self.tolerance,
            },
            render_charts: !self.no_plots,
        })
    }
}
