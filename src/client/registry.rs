//! client::registry
//!
//! Repository descriptor cache and default-repository resolution.
//!
//! # Design
//!
//! The registry is a session-scoped value with a single writer: only
//! [`fetch_all`](RepositoryRegistry::fetch_all) and
//! [`set_default`](RepositoryRegistry::set_default) mutate it, both
//! through `&mut self`, so a fetch is always complete and visible
//! before any dependent call starts. Dispatch never fetches
//! implicitly: an operation that needs repository context before a
//! successful fetch fails fast with `RepositoryNotInitialized`.
//!
//! Descriptors are immutable after fetch. The first repository of a
//! fetch becomes the default when none is set; the order observed is
//! the order the service document returned.

use serde_json::Value;

use crate::core::types::{Capabilities, ObjectId, Repository, RepositoryId};
use crate::encoding::FormFields;
use crate::error::CmisError;
use crate::transport::{Endpoint, Transport, Verb, WireRequest};

/// Cached repository descriptors plus the default pointer.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRegistry {
    repositories: Vec<Repository>,
    default: Option<RepositoryId>,
    initialized: bool,
}

impl RepositoryRegistry {
    /// Create an empty, uninitialized registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the service document and replace the cached map.
    ///
    /// If no default is currently set, the first fetched repository
    /// becomes the default.
    ///
    /// # Errors
    ///
    /// Transport failures surface as `Remote`/`Network`; a service
    /// document that cannot be decoded is `MalformedResponse`. The
    /// cache is left untouched on failure.
    pub async fn fetch_all(
        &mut self,
        transport: &dyn Transport,
    ) -> Result<&[Repository], CmisError> {
        let response = transport
            .execute(WireRequest {
                verb: Verb::Get,
                endpoint: Endpoint::Service,
                fields: FormFields::new(),
                content: None,
            })
            .await?;

        let repositories = parse_service_document(response.json()?)?;

        self.repositories = repositories;
        self.initialized = true;
        if self.default.is_none() {
            self.default = self.repositories.first().map(|r| r.id.clone());
        }
        Ok(&self.repositories)
    }

    /// Whether a fetch has ever succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// All cached descriptors, in fetch order.
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Set the default repository.
    ///
    /// # Errors
    ///
    /// `RepositoryNotFound` if `id` is absent from the cached map.
    pub fn set_default(&mut self, id: &RepositoryId) -> Result<(), CmisError> {
        if self.repositories.iter().any(|r| &r.id == id) {
            self.default = Some(id.clone());
            Ok(())
        } else {
            Err(CmisError::RepositoryNotFound(id.clone()))
        }
    }

    /// Look up a descriptor by id.
    ///
    /// # Errors
    ///
    /// `RepositoryNotInitialized` before the first successful fetch;
    /// `RepositoryNotFound` for an unknown id.
    pub fn get(&self, id: &RepositoryId) -> Result<&Repository, CmisError> {
        if !self.initialized {
            return Err(CmisError::RepositoryNotInitialized);
        }
        self.repositories
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| CmisError::RepositoryNotFound(id.clone()))
    }

    /// The default repository's descriptor.
    ///
    /// # Errors
    ///
    /// `RepositoryNotInitialized` before the first successful fetch, or
    /// when a fetch returned no repositories at all.
    pub fn default_repository(&self) -> Result<&Repository, CmisError> {
        if !self.initialized {
            return Err(CmisError::RepositoryNotInitialized);
        }
        match &self.default {
            Some(id) => self.get(id),
            None => Err(CmisError::RepositoryNotInitialized),
        }
    }
}

/// Decode the service document: a JSON object keyed by repository id,
/// in service order.
fn parse_service_document(document: &Value) -> Result<Vec<Repository>, CmisError> {
    let map = document
        .as_object()
        .ok_or_else(|| malformed("service document is not an object"))?;

    let mut repositories = Vec::with_capacity(map.len());
    for (key, entry) in map {
        let id = entry
            .get("repositoryId")
            .and_then(Value::as_str)
            .unwrap_or(key);
        let name = entry
            .get("repositoryName")
            .and_then(Value::as_str)
            .unwrap_or(id)
            .to_string();
        let root_folder_id = entry
            .get("rootFolderId")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("repository entry is missing rootFolderId"))?;

        let capabilities = entry
            .get("capabilities")
            .map(parse_capabilities)
            .unwrap_or_default();

        repositories.push(Repository {
            id: RepositoryId::new(id).map_err(|e| malformed(e.to_string()))?,
            name,
            root_folder_id: ObjectId::new(root_folder_id)
                .map_err(|e| malformed(e.to_string()))?,
            capabilities,
        });
    }
    Ok(repositories)
}

fn parse_capabilities(value: &Value) -> Capabilities {
    Capabilities {
        content_stream_updatability: value
            .get("capabilityContentStreamUpdatability")
            .and_then(Value::as_str)
            .map(|v| v != "none")
            .unwrap_or(false),
        pwc_updatable: value
            .get("capabilityPWCUpdatable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        get_descendants: value
            .get("capabilityGetDescendants")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn malformed(message: impl Into<String>) -> CmisError {
    CmisError::MalformedResponse(message.into())
}
