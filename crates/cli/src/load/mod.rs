//! Synthetic load runs.

mod generator;
mod runner;
mod stats;

pub use generator::{BatchGenerator, Synthetic};
pub use runner::{LoadRunConfig, LoadRunner};
pub use stats::RunStats;
