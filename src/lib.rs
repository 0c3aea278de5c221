//! faultline library crate
//!
//! Exposes the analysis pipeline and its building blocks so the CLI, the REST
//! front end and the benchmarks share one implementation.

pub mod analyzer;
pub mod api;
pub mod config;
pub mod devops;
pub mod keyring;
pub mod llm;
pub mod logging;
pub mod story;
pub mod util;
