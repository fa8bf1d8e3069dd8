//! Metrics collection and export for phoso.
//!
//! Metric names are recorded through the `metrics` crate facade. Without an
//! installed recorder every macro is a no-op; with the `prometheus` feature
//! the gateway renders them on `/metrics`.
//!
//! ```rust,ignore
//! use phoso_metrics::{counter, webhook};
//!
//! counter!(webhook::CALLS_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
