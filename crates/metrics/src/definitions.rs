//! Metric name and label definitions.
//!
//! Every metric the pipeline and gateway emit is named here so the exported
//! set is documented in one place.

/// HTTP request metrics
pub mod http {
    /// Total number of HTTP requests handled
    pub const REQUESTS_TOTAL: &str = "phoso_http_requests_total";
    /// Duration of HTTP requests in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "phoso_http_request_duration_seconds";
}

/// Inbound webhook metrics
pub mod webhook {
    /// Webhook calls received
    pub const CALLS_TOTAL: &str = "phoso_webhook_calls_total";
    /// Replies sent, by kind (long, short, empty)
    pub const REPLIES_TOTAL: &str = "phoso_webhook_replies_total";
    /// Calls that ended in an error converted to an empty reply
    pub const FAILURES_TOTAL: &str = "phoso_webhook_failures_total";
    /// End-to-end processing time of one call in seconds
    pub const PROCESSING_DURATION_SECONDS: &str = "phoso_webhook_processing_duration_seconds";
}

/// Media retrieval metrics
pub mod media {
    /// Attachments fetched successfully
    pub const FETCHED_TOTAL: &str = "phoso_media_fetched_total";
    /// Attachment fetches that failed
    pub const FETCH_FAILURES_TOTAL: &str = "phoso_media_fetch_failures_total";
    /// Bytes staged to disk
    pub const FETCHED_BYTES_TOTAL: &str = "phoso_media_fetched_bytes_total";
    /// Attachments whose dimensions could not be read
    pub const DECODE_FAILURES_TOTAL: &str = "phoso_media_decode_failures_total";
}

/// Fan-out dispatch metrics
pub mod dispatch {
    /// Fan-out step outcomes, labelled by step and success
    pub const STEPS_TOTAL: &str = "phoso_dispatch_steps_total";
    /// Duration of each fan-out step in seconds
    pub const STEP_DURATION_SECONDS: &str = "phoso_dispatch_step_duration_seconds";
}

/// Common label keys
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD: &str = "method";
    pub const STATUS: &str = "status";
    pub const STEP: &str = "step";
    pub const SUCCESS: &str = "success";
    pub const KIND: &str = "kind";
    pub const DESTINATION: &str = "destination";
}

/// Standard histogram buckets for different metric types
pub mod buckets {
    use once_cell::sync::Lazy;

    /// HTTP request duration buckets (in seconds)
    /// Covers 1ms to 60s
    pub static HTTP_DURATION: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]
    });

    /// Fan-out step buckets (in seconds). Uploads of large photos dominate the
    /// upper end.
    pub static STEP_DURATION: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0]
    });
}
