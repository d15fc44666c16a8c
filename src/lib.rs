//! cmis-browser - A Rust client for the CMIS browser binding
//!
//! CMIS (Content Management Interoperability Services) models documents,
//! folders and links held by a content repository, with versioning,
//! querying and ACL management on top. This crate speaks the browser
//! binding: multipart form POSTs discriminated by `cmisaction`, GETs
//! discriminated by `cmisselector`, and the succinct property
//! representation on the way back.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`core`] - Domain types: identifiers, objects, property bags, config
//! - [`encoding`] - The two wire encodings and the parameter merger
//! - [`transport`] - Transport seam, HTTP implementation, in-memory mock
//! - [`client`] - Session, repository registry and operation dispatch
//! - [`versioning`] - Checkout/checkin workflow with compensation
//! - [`error`] - Crate error type
//!
//! # Correctness Invariants
//!
//! 1. Property iteration order is preserved onto the wire; id/value
//!    pairs are never reordered independently
//! 2. Merged field sets resolve collisions caller > computed > defaults
//! 3. Validation failures are raised before any network call
//! 4. Remote failures propagate unretried, with status and message
//!    intact

pub mod client;
pub mod core;
pub mod encoding;
pub mod error;
pub mod transport;
pub mod versioning;

pub use client::{CmisSession, RepositoryHandle};
pub use error::CmisError;
