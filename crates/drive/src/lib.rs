//! Cloud file destination.
//!
//! [`CloudFileStore`] uploads a staged artifact into a folder and can make it
//! readable by anyone holding the link. [`GoogleDriveStore`] implements it
//! over the Drive v3 REST API; [`MemoryFileStore`] keeps uploads in process.

pub mod auth;
pub mod error;
pub mod google;
pub mod memory;
pub mod store;

pub use {
    auth::OAuthCredentials,
    error::{Error, Result},
    google::{GoogleDriveOptions, GoogleDriveStore, strip_sdk_suffix},
    memory::{MemoryFile, MemoryFileStore},
    store::{CloudFileStore, NewFile, StoredFile},
};
