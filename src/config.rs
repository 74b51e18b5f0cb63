//! Analysis configuration

use std::path::PathBuf;

use crate::bins::DiscountBins;
use crate::model::SegmentParams;

/// Default location of the snapshot dataset.
pub const DEFAULT_INPUT: &str = "hotels_data.csv";

/// Default chart directory.
pub const DEFAULT_OUTPUT_DIR: &str = "plots";

/// Everything a pipeline run needs; defaults reproduce the standard analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub bins: DiscountBins,
    pub segments: SegmentParams,
    pub render_charts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            bins: DiscountBins::default(),
            segments: SegmentParams::default(),
            render_charts: true,
        }
    }
}

impl AnalysisConfig {
    /// Read `input` instead of the default path.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    /// Write charts to `dir`.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enable or disable chart rendering.
    #[must_use]
    pub fn with_charts(mut self, enable: bool) -> Self {
        self.render_charts = enable;
        self
    }
}
