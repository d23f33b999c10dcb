//! Stats module - correlation and regression

mod calculator;

pub use calculator::{CorrelationMatrix, LinearFit, StatsCalculator, MIN_FIT_POINTS};
