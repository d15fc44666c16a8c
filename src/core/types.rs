//! core::types
//!
//! Strong types for the CMIS object model.
//!
//! # Types
//!
//! - [`RepositoryId`] - Validated repository identifier
//! - [`ObjectId`] - Repository-assigned object identifier
//! - [`TypeId`] - Object-type identifier (e.g. `cmis:document`)
//! - [`BaseType`] - Base type discriminator for returned objects
//! - [`CmisObject`] - A document, folder or link as returned by the repository
//! - [`Repository`] - Repository descriptor from the service document
//! - [`ContentStream`] - Caller-owned content for uploads
//!
//! # Validation
//!
//! Identifier types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use cmis_browser::core::types::{ObjectId, RepositoryId, TypeId};
//!
//! // Valid constructions
//! let repo = RepositoryId::new("A1").unwrap();
//! let id = ObjectId::new("idd7c5ce6c91c7437").unwrap();
//! let ty = TypeId::new("cmis:document").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(ObjectId::new("").is_err());
//! assert!(RepositoryId::new("has\ncontrol").is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::properties::PropertyBag;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository id: {0}")]
    InvalidRepositoryId(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid type id: {0}")]
    InvalidTypeId(String),
}

/// Identifiers are opaque but must be non-empty and printable.
///
/// The repository assigns ids; the client only needs to rule out values
/// that would corrupt a form field or URL path segment.
fn validate_id(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("id cannot be empty".into());
    }
    if value.chars().any(|c| c.is_control()) {
        return Err("id cannot contain control characters".into());
    }
    Ok(())
}

/// A validated repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Create a new validated repository id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepositoryId` if the id is empty or
    /// contains control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        validate_id(&id).map_err(TypeError::InvalidRepositoryId)?;
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.0
    }
}

/// A validated, repository-assigned object identifier.
///
/// Object ids are opaque and immutable once created. A private working
/// copy has its own id, distinct from the id it was checked out from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectId` if the id is empty or
    /// contains control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        validate_id(&id).map_err(TypeError::InvalidObjectId)?;
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// A validated object-type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeId(String);

impl TypeId {
    /// Create a new validated type id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTypeId` if the id is empty or contains
    /// control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        validate_id(&id).map_err(TypeError::InvalidTypeId)?;
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TypeId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeId> for String {
    fn from(id: TypeId) -> Self {
        id.0
    }
}

/// Base type of a returned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    /// A versionable document, optionally carrying a content stream.
    Document,
    /// A folder containing other objects.
    Folder,
    /// A link object pointing at an external URL.
    Link,
    /// Any other base type (relationship, policy, item).
    Other,
}

impl BaseType {
    /// Classify a base-type id as returned by the repository.
    pub fn from_type_id(id: &str) -> Self {
        match id {
            "cmis:document" => BaseType::Document,
            "cmis:folder" => BaseType::Folder,
            "cmis:item" | "cmis:link" => BaseType::Link,
            _ => BaseType::Other,
        }
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseType::Document => write!(f, "document"),
            BaseType::Folder => write!(f, "folder"),
            BaseType::Link => write!(f, "link"),
            BaseType::Other => write!(f, "other"),
        }
    }
}

/// Repository descriptor from the service document.
///
/// Fetched once by the registry and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Repository identifier.
    pub id: RepositoryId,
    /// Human-readable repository name.
    pub name: String,
    /// Identifier of the repository's root folder.
    pub root_folder_id: ObjectId,
    /// Capability flags reported by the repository.
    pub capabilities: Capabilities,
}

/// Capability flags relevant to this client.
///
/// The repository reports many more; only the ones the dispatcher
/// consults are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Whether content of an existing document can be overwritten.
    pub content_stream_updatability: bool,
    /// Whether PWC documents are searchable/updatable.
    pub pwc_updatable: bool,
    /// Whether the repository supports `getDescendants`/`deleteTree`.
    pub get_descendants: bool,
}

/// Content-stream metadata attached to a returned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStreamInfo {
    /// Original filename.
    pub file_name: String,
    /// Media type reported by the repository.
    pub mime_type: String,
    /// Stream length in bytes, when reported.
    pub length: Option<u64>,
}

/// Caller-owned content for an upload.
///
/// The client never buffers content beyond the single request that
/// carries it.
///
/// # Example
///
/// ```
/// use cmis_browser::core::types::ContentStream;
///
/// let stream = ContentStream::new("report.txt", b"hello".to_vec());
/// assert_eq!(stream.mime_type(), "text/plain");
///
/// let declared = ContentStream::with_mime_type("data.bin", b"\x00".to_vec(), "application/x-custom");
/// assert_eq!(declared.mime_type(), "application/x-custom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStream {
    /// Filename carried on the binary multipart part.
    pub file_name: String,
    /// Raw bytes. May be empty; an empty stream is a valid document body.
    pub bytes: Vec<u8>,
    /// Declared media type, if any. When absent the type is inferred
    /// from the filename extension.
    pub declared_mime_type: Option<String>,
}

impl ContentStream {
    /// Create a content stream with an inferred media type.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            declared_mime_type: None,
        }
    }

    /// Create a content stream with an explicitly declared media type.
    pub fn with_mime_type(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            declared_mime_type: Some(mime_type.into()),
        }
    }

    /// The effective media type: declared if present, otherwise inferred
    /// from the filename extension, with `application/octet-stream` as
    /// the fallback.
    pub fn mime_type(&self) -> &str {
        if let Some(ref declared) = self.declared_mime_type {
            return declared;
        }
        infer_mime_type(&self.file_name)
    }
}

/// Minimal extension table for the formats the binding commonly carries.
fn infer_mime_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// An object as returned by the repository.
///
/// Covers documents, folders and links; document-only fields are `None`
/// for other base types. The client holds no cache of these beyond the
/// current call's response.
#[derive(Debug, Clone)]
pub struct CmisObject {
    /// Repository-assigned identifier.
    pub id: ObjectId,
    /// Object-type identifier.
    pub type_id: TypeId,
    /// Base type discriminator.
    pub base_type: BaseType,
    /// Decoded property bag (succinct representation).
    pub properties: PropertyBag,
    /// Version series the document belongs to.
    pub version_series_id: Option<String>,
    /// Version label (e.g. "1.0").
    pub version_label: Option<String>,
    /// Whether this object is a private working copy.
    pub is_private_working_copy: bool,
    /// Content-stream metadata, when the document has content.
    pub content: Option<ContentStreamInfo>,
    /// Creation timestamp, when reported.
    pub created_at: Option<DateTime<Utc>>,
    /// Last-modification timestamp, when reported.
    pub modified_at: Option<DateTime<Utc>>,
}

impl CmisObject {
    /// Convenience accessor for the `cmis:name` property.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("cmis:name").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_id_rejects_empty() {
        assert_eq!(
            RepositoryId::new(""),
            Err(TypeError::InvalidRepositoryId("id cannot be empty".into()))
        );
    }

    #[test]
    fn object_id_rejects_control_characters() {
        assert!(ObjectId::new("abc\u{0}def").is_err());
        assert!(ObjectId::new("abc\ndef").is_err());
    }

    #[test]
    fn ids_round_trip_serde() {
        let id = ObjectId::new("idabc123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn invalid_id_fails_serde() {
        let parsed: Result<ObjectId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn base_type_classification() {
        assert_eq!(BaseType::from_type_id("cmis:document"), BaseType::Document);
        assert_eq!(BaseType::from_type_id("cmis:folder"), BaseType::Folder);
        assert_eq!(BaseType::from_type_id("cmis:item"), BaseType::Link);
        assert_eq!(BaseType::from_type_id("cmis:policy"), BaseType::Other);
    }

    #[test]
    fn content_stream_mime_inference() {
        assert_eq!(ContentStream::new("a.txt", vec![]).mime_type(), "text/plain");
        assert_eq!(ContentStream::new("a.PDF", vec![]).mime_type(), "application/pdf");
        assert_eq!(
            ContentStream::new("no-extension", vec![]).mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn declared_mime_type_wins() {
        let stream = ContentStream::with_mime_type("a.txt", vec![], "text/markdown");
        assert_eq!(stream.mime_type(), "text/markdown");
    }
}
