//! Structured record store access.
//!
//! [`RecordStore`] is the narrow interface the pipeline writes through.
//! [`AirtableStore`] talks to the Airtable REST API and [`MemoryRecordStore`]
//! keeps rows in process for tests and local runs.

pub mod airtable;
pub mod error;
pub mod memory;
pub mod store;
pub mod upsert;

pub use {
    airtable::{AirtableOptions, AirtableStore},
    error::{Error, Result},
    memory::MemoryRecordStore,
    store::{Fields, RecordStore, Row},
    upsert::{find_or_insert, upsert_with_merge},
};
