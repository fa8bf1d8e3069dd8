//! HTTP front end for the photo intake pipeline.
//!
//! Routes:
//! - the inbound webhook (default `/images-by-sms`, `GET` and `POST`)
//! - `/health`
//! - `/metrics` with the `prometheus` feature

#[cfg(feature = "metrics")]
pub mod metrics_middleware;
pub mod server;
pub mod twiml;
pub mod webhook;

pub use {
    server::{AppState, build_app, start},
    webhook::{ParseError, parse_event},
};
