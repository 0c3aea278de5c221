//! REST front end for error analysis and ticket content generation.

mod routes;
mod server;

pub use routes::api_router;
pub use server::{router, run, serve};

use crate::analyzer::Analyzer;
use crate::config::Config;

/// Shared handler state.
pub struct ApiState {
    pub analyzer: Analyzer,
    pub lookback_days: u32,
    pub max_files: usize,
}

impl ApiState {
    pub fn new(analyzer: Analyzer, config: &Config) -> Self {
        Self {
            analyzer,
            lookback_days: config.lookback_days,
            max_files: config.max_files,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(Analyzer::from_config(config)?, config))
    }
}
