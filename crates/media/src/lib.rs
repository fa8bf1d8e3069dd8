//! Media retrieval: download an attachment, stage it as a temporary file and
//! read its pixel dimensions.

pub mod error;
pub mod fetch;
pub mod image_ops;
pub mod mime;

pub use {
    error::{Error, Result},
    fetch::{Artifact, MediaRetriever, RetrieverOptions},
    image_ops::{ImageMetadata, get_image_metadata, read_dimensions},
    mime::extension_for,
};
