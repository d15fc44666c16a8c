//! core
//!
//! Core domain types for the CMIS object model.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepositoryId, ObjectId, TypeId, CmisObject
//! - [`properties`] - Semantic property values and ordered property bags
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Property cardinality is decided once, at the boundary
//! - Iteration order of property bags is part of the contract

pub mod config;
pub mod properties;
pub mod types;
