//! The inbound photo message pipeline.
//!
//! One [`InboundEvent`](phoso_common::InboundEvent) flows through: sender
//! identity, destination lookup, then per attachment filename assembly,
//! media retrieval, the long/short reply throttle and the fan-out to the
//! record store, cloud storage and chat. [`Pipeline::respond`] never fails;
//! anything unexpected becomes [`Reply::Empty`](phoso_common::Reply::Empty).

pub mod destination;
pub mod dispatch;
pub mod error;
pub mod fields;
pub mod filename;
pub mod identity;
pub mod orchestrator;
pub mod throttle;

pub use {
    destination::{DestinationSource, RecordDestinations, StaticDestinations},
    dispatch::{CallContext, DispatchReport, Dispatcher, PhotoContext, Step, StepOutcome},
    error::{Error, Result},
    filename::{assemble_filename, assemble_filename_with_digits},
    identity::{SENDER_ID_LEN, sender_id},
    orchestrator::{CallSummary, Pipeline, PipelineSettings},
    throttle::{LastLongResponse, ThrottleDecision, evaluate},
};
