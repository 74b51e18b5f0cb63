//! rateforge: hotel discount analysis over pricing snapshots
//!
//! Loads a snapshot dataset, measures how room availability changes between
//! the first and last snapshot of each stay window, relates that change to
//! the discount offered, and segments hotels with K-Means.

pub mod bins;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod effectiveness;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod snapshot;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use pipeline::{run, AnalysisReport};
