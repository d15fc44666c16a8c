//! transport::mock
//!
//! In-memory repository transport for deterministic testing.
//!
//! # Design
//!
//! `MockRepository` implements the `Transport` trait against an
//! in-memory object store with just enough repository semantics for
//! tests: create/read/update/delete, children and query reads,
//! checkout/checkin/cancel with one-PWC-per-series enforcement and
//! monotone version labels, content append, ACL storage and type
//! creation. Failure scenarios can be injected per action or selector,
//! and every executed request is recorded for verification.
//!
//! # Example
//!
//! ```
//! use cmis_browser::transport::mock::MockRepository;
//! use cmis_browser::transport::Transport;
//!
//! # tokio_test::block_on(async {
//! let repository = MockRepository::new();
//! assert_eq!(repository.name(), "mock");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{Endpoint, ResponseBody, Transport, TransportError, Verb, WireRequest, WireResponse};
use crate::encoding::{decode_property_pairs, FormFields};
use crate::core::properties::PropertyValue;

/// Mock repository transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockRepository {
    /// Internal state shared across clones.
    inner: Arc<Mutex<Inner>>,
}

/// Configuration for which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail the named `cmisaction` with the given error.
    Action(String, TransportError),
    /// Fail the named `cmisselector` with the given error.
    Selector(String, TransportError),
}

/// A repository advertised in the mock's service document.
#[derive(Debug, Clone)]
struct RepoEntry {
    id: String,
    name: String,
    root_folder_id: String,
}

/// One stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    id: String,
    type_id: String,
    base_type: String,
    /// Custom properties beyond the system-maintained ones.
    properties: Vec<(String, Value)>,
    parent_id: Option<String>,
    /// Absolute path for folders and path-addressable documents.
    path: Option<String>,
    content: Option<StoredContent>,
    version_series_id: Option<String>,
    version_label: Option<String>,
    is_pwc: bool,
    /// For a PWC, the id of the document it was checked out from.
    checked_out_from: Option<String>,
    aces: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Clone)]
struct StoredContent {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct Inner {
    repositories: Vec<RepoEntry>,
    objects: HashMap<String, StoredObject>,
    /// version series id -> PWC object id
    checked_out: HashMap<String, String>,
    types: HashMap<String, Value>,
    fail_on: Option<FailOn>,
    requests: Vec<WireRequest>,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepository {
    /// Create a mock with a single repository `A1`.
    pub fn new() -> Self {
        Self::with_repositories(vec![("A1", "Mock Repository")])
    }

    /// Create a mock advertising the given repositories, in order.
    ///
    /// The service document lists them in exactly this order, which is
    /// what the registry's default-selection rule observes.
    pub fn with_repositories(repos: Vec<(&str, &str)>) -> Self {
        let mut objects = HashMap::new();
        let repositories = repos
            .into_iter()
            .map(|(id, name)| {
                let root_id = format!("root-{}", id);
                objects.insert(
                    root_id.clone(),
                    StoredObject {
                        id: root_id.clone(),
                        type_id: "cmis:folder".into(),
                        base_type: "cmis:folder".into(),
                        properties: vec![("cmis:name".into(), json!("root"))],
                        parent_id: None,
                        path: Some("/".into()),
                        content: None,
                        version_series_id: None,
                        version_label: None,
                        is_pwc: false,
                        checked_out_from: None,
                        aces: Vec::new(),
                    },
                );
                RepoEntry {
                    id: id.to_string(),
                    name: name.to_string(),
                    root_folder_id: root_id,
                }
            })
            .collect();

        Self {
            inner: Arc::new(Mutex::new(Inner {
                repositories,
                objects,
                checked_out: HashMap::new(),
                types: HashMap::new(),
                fail_on: None,
                requests: Vec::new(),
            })),
        }
    }

    /// Configure the mock to fail one kind of call.
    ///
    /// # Example
    ///
    /// ```
    /// use cmis_browser::transport::mock::{FailOn, MockRepository};
    /// use cmis_browser::transport::TransportError;
    ///
    /// let repository = MockRepository::new().fail_on(FailOn::Action(
    ///     "appendContentStream".into(),
    ///     TransportError::Remote { status: 500, message: "storage full".into() },
    /// ));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Configure a failure on an already-shared mock.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// All requests executed so far, in order.
    pub fn requests(&self) -> Vec<WireRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Executed requests whose `cmisaction` matches `action`.
    pub fn requests_for_action(&self, action: &str) -> Vec<WireRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.fields.get("cmisaction") == Some(action))
            .collect()
    }

    /// Whether any version series is currently checked out.
    pub fn has_open_checkout(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        !inner.checked_out.is_empty()
    }

    fn next_id(prefix: &str) -> String {
        format!("{}{}", prefix, Uuid::new_v4().simple())
    }

    fn not_found(what: &str) -> TransportError {
        TransportError::Remote {
            status: 404,
            message: format!("{} not found", what),
        }
    }

    fn invalid(message: impl Into<String>) -> TransportError {
        TransportError::Remote {
            status: 400,
            message: message.into(),
        }
    }

    fn ok(value: Value) -> WireResponse {
        WireResponse {
            status: 200,
            body: ResponseBody::Json(value),
        }
    }
}

// =============================================================================
// Request handling
// =============================================================================

impl Inner {
    fn repo(&self, id: &str) -> Result<&RepoEntry, TransportError> {
        self.repositories
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| MockRepository::not_found("repository"))
    }

    fn object(&self, id: &str) -> Result<&StoredObject, TransportError> {
        self.objects
            .get(id)
            .ok_or_else(|| MockRepository::not_found("object"))
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut StoredObject, TransportError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| MockRepository::not_found("object"))
    }

    fn object_by_path(&self, path: &str) -> Option<&StoredObject> {
        let normalized = format!("/{}", path.trim_matches('/'));
        self.objects
            .values()
            .find(|o| o.path.as_deref() == Some(normalized.as_str()))
    }

    /// Resolve the folder a write at `endpoint` targets.
    fn target_folder(&self, repo: &RepoEntry, endpoint: &Endpoint) -> Result<String, TransportError> {
        match endpoint {
            Endpoint::Root(_) => Ok(repo.root_folder_id.clone()),
            Endpoint::Path(_, path) => self
                .object_by_path(path)
                .filter(|o| o.base_type == "cmis:folder")
                .map(|o| o.id.clone())
                .ok_or_else(|| MockRepository::not_found("folder")),
            _ => Err(MockRepository::invalid("action requires an object endpoint")),
        }
    }

    fn folder_path(&self, folder_id: &str) -> String {
        self.objects
            .get(folder_id)
            .and_then(|o| o.path.clone())
            .unwrap_or_else(|| "/".into())
    }

    fn child_path(&self, folder_id: &str, name: &str) -> String {
        let base = self.folder_path(folder_id);
        if base == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", base, name)
        }
    }

    /// Apply decoded property-pair fields to an object's custom bag.
    ///
    /// An empty multi clears the property.
    fn apply_properties(object: &mut StoredObject, fields: &FormFields) {
        let bag = decode_property_pairs(fields);
        for (name, value) in bag.iter() {
            match value {
                PropertyValue::Multi(elements) if elements.is_empty() => {
                    object.properties.retain(|(n, _)| n != name);
                }
                PropertyValue::Multi(elements) => {
                    let rendered: Vec<Value> =
                        elements.iter().map(|s| json!(s.to_wire())).collect();
                    Self::upsert(&mut object.properties, name, json!(rendered));
                }
                PropertyValue::Single(scalar) => {
                    Self::upsert(&mut object.properties, name, json!(scalar.to_wire()));
                }
            }
        }
    }

    fn upsert(properties: &mut Vec<(String, Value)>, name: &str, value: Value) {
        if let Some(entry) = properties.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            properties.push((name.to_string(), value));
        }
    }

    /// Render an object in the succinct response shape.
    fn succinct(&self, object: &StoredObject) -> Value {
        let mut props = Map::new();
        props.insert("cmis:objectId".into(), json!(object.id));
        props.insert("cmis:baseTypeId".into(), json!(object.base_type));
        props.insert("cmis:objectTypeId".into(), json!(object.type_id));
        for (name, value) in &object.properties {
            props.insert(name.clone(), value.clone());
        }
        if object.base_type == "cmis:document" {
            props.insert(
                "cmis:versionSeriesId".into(),
                json!(object.version_series_id),
            );
            props.insert("cmis:versionLabel".into(), json!(object.version_label));
            props.insert(
                "cmis:isPrivateWorkingCopy".into(),
                json!(object.is_pwc),
            );
            let checked_out = object
                .version_series_id
                .as_ref()
                .map(|s| self.checked_out.contains_key(s))
                .unwrap_or(false);
            props.insert("cmis:isVersionSeriesCheckedOut".into(), json!(checked_out));
            if let Some(content) = &object.content {
                props.insert(
                    "cmis:contentStreamFileName".into(),
                    json!(content.file_name),
                );
                props.insert(
                    "cmis:contentStreamMimeType".into(),
                    json!(content.mime_type),
                );
                props.insert(
                    "cmis:contentStreamLength".into(),
                    json!(content.bytes.len()),
                );
            }
        }
        if let Some(path) = &object.path {
            props.insert("cmis:path".into(), json!(path));
        }
        json!({ "succinctProperties": Value::Object(props) })
    }

    fn service_document(&self) -> Value {
        let mut doc = Map::new();
        for repo in &self.repositories {
            doc.insert(
                repo.id.clone(),
                json!({
                    "repositoryId": repo.id,
                    "repositoryName": repo.name,
                    "rootFolderId": repo.root_folder_id,
                    "capabilities": {
                        "capabilityContentStreamUpdatability": "anytime",
                        "capabilityPWCUpdatable": true,
                        "capabilityGetDescendants": true,
                    },
                }),
            );
        }
        Value::Object(doc)
    }
}

impl MockRepository {
    fn handle_action(
        inner: &mut Inner,
        request: &WireRequest,
        repo_id: &str,
        action: &str,
    ) -> Result<WireResponse, TransportError> {
        let repo = inner.repo(repo_id)?.clone();
        let fields = &request.fields;

        match action {
            "createDocument" | "createFolder" | "createItem" => {
                let folder_id = inner.target_folder(&repo, &request.endpoint)?;
                let bag = decode_property_pairs(fields);
                let name = bag
                    .get("cmis:name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Self::invalid("cmis:name is required"))?
                    .to_string();
                let (base_type, default_type) = match action {
                    "createDocument" => ("cmis:document", "cmis:document"),
                    "createFolder" => ("cmis:folder", "cmis:folder"),
                    _ => ("cmis:item", "cmis:item"),
                };
                let type_id = bag
                    .get("cmis:objectTypeId")
                    .and_then(|v| v.as_str())
                    .unwrap_or(default_type)
                    .to_string();

                let id = Self::next_id("id");
                let mut object = StoredObject {
                    id: id.clone(),
                    type_id,
                    base_type: base_type.into(),
                    properties: Vec::new(),
                    parent_id: Some(folder_id.clone()),
                    path: Some(inner.child_path(&folder_id, &name)),
                    content: None,
                    version_series_id: (base_type == "cmis:document")
                        .then(|| Self::next_id("series")),
                    version_label: (base_type == "cmis:document").then(|| "1.0".into()),
                    is_pwc: false,
                    checked_out_from: None,
                    aces: Vec::new(),
                };
                Inner::apply_properties(&mut object, fields);
                if let Some(content) = &request.content {
                    object.content = Some(StoredContent {
                        file_name: content.file_name.clone(),
                        mime_type: content.mime_type.clone(),
                        bytes: content.bytes.clone(),
                    });
                }
                let response = inner.succinct(&object);
                inner.objects.insert(id, object);
                Ok(Self::ok(response))
            }

            "createDocumentFromSource" => {
                let folder_id = inner.target_folder(&repo, &request.endpoint)?;
                let source_id = fields
                    .get("sourceId")
                    .ok_or_else(|| Self::invalid("sourceId is required"))?;
                let source = inner.object(source_id)?.clone();
                let bag = decode_property_pairs(fields);
                let name = bag
                    .get("cmis:name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .or_else(|| source.content.as_ref().map(|c| c.file_name.clone()))
                    .ok_or_else(|| Self::invalid("cmis:name is required"))?;

                let id = Self::next_id("id");
                let mut object = StoredObject {
                    id: id.clone(),
                    parent_id: Some(folder_id.clone()),
                    path: Some(inner.child_path(&folder_id, &name)),
                    version_series_id: Some(Self::next_id("series")),
                    version_label: Some("1.0".into()),
                    is_pwc: false,
                    checked_out_from: None,
                    ..source
                };
                Inner::upsert(&mut object.properties, "cmis:name", json!(name));
                Inner::apply_properties(&mut object, fields);
                let response = inner.succinct(&object);
                inner.objects.insert(id, object);
                Ok(Self::ok(response))
            }

            "checkOut" => {
                let object_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                let source = inner.object(&object_id)?.clone();
                let series = source
                    .version_series_id
                    .clone()
                    .ok_or_else(|| Self::invalid("object is not versionable"))?;
                if inner.checked_out.contains_key(&series) {
                    return Err(TransportError::Remote {
                        status: 409,
                        message: "version series is already checked out".into(),
                    });
                }
                let pwc_id = Self::next_id("pwc");
                let pwc = StoredObject {
                    id: pwc_id.clone(),
                    is_pwc: true,
                    checked_out_from: Some(object_id),
                    version_label: None,
                    path: None,
                    ..source
                };
                inner.checked_out.insert(series, pwc_id.clone());
                let response = inner.succinct(&pwc);
                inner.objects.insert(pwc_id, pwc);
                Ok(Self::ok(response))
            }

            "cancelCheckOut" => {
                let pwc_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                let pwc = inner.object(&pwc_id)?.clone();
                if !pwc.is_pwc {
                    return Err(Self::invalid("object is not a private working copy"));
                }
                if let Some(series) = &pwc.version_series_id {
                    inner.checked_out.remove(series);
                }
                inner.objects.remove(&pwc_id);
                Ok(WireResponse {
                    status: 200,
                    body: ResponseBody::Empty,
                })
            }

            "checkIn" => {
                let pwc_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                let pwc = inner.object(&pwc_id)?.clone();
                let original_id = pwc
                    .checked_out_from
                    .clone()
                    .ok_or_else(|| Self::invalid("object is not a private working copy"))?;
                let major = fields.get("major").map(|v| v == "true").unwrap_or(true);

                let new_label = {
                    let original = inner.object(&original_id)?;
                    bump_label(original.version_label.as_deref().unwrap_or("1.0"), major)
                };

                inner.objects.remove(&pwc_id);
                if let Some(series) = &pwc.version_series_id {
                    inner.checked_out.remove(series);
                }

                let comment = fields.get("checkinComment").map(str::to_string);
                let original = inner.object_mut(&original_id)?;
                original.version_label = Some(new_label);
                if pwc.content.is_some() {
                    original.content = pwc.content;
                }
                if let Some(comment) = comment {
                    Inner::upsert(
                        &mut original.properties,
                        "cmis:checkinComment",
                        json!(comment),
                    );
                }
                Inner::apply_properties(original, fields);
                let response = inner.succinct(inner.object(&original_id)?);
                Ok(Self::ok(response))
            }

            "appendContentStream" | "setContentStream" => {
                let object_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                let content = request
                    .content
                    .as_ref()
                    .ok_or_else(|| Self::invalid("content part is required"))?;
                let object = inner.object_mut(&object_id)?;
                match (&mut object.content, action) {
                    (Some(existing), "appendContentStream") => {
                        existing.bytes.extend_from_slice(&content.bytes);
                        existing.file_name = content.file_name.clone();
                    }
                    (slot, _) => {
                        *slot = Some(StoredContent {
                            file_name: content.file_name.clone(),
                            mime_type: content.mime_type.clone(),
                            bytes: content.bytes.clone(),
                        });
                    }
                }
                let response = inner.succinct(inner.object(&object_id)?);
                Ok(Self::ok(response))
            }

            "update" => {
                let object_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                Inner::apply_properties(inner.object_mut(&object_id)?, fields);
                let response = inner.succinct(inner.object(&object_id)?);
                Ok(Self::ok(response))
            }

            "bulkUpdate" => {
                let mut updated = Vec::new();
                for i in 0.. {
                    let Some(object_id) = fields.get(&format!("objectId[{}]", i)) else {
                        break;
                    };
                    let object_id = object_id.to_string();
                    Inner::apply_properties(inner.object_mut(&object_id)?, fields);
                    updated.push(json!({ "objectId": object_id }));
                }
                Ok(Self::ok(json!({ "objects": updated })))
            }

            "delete" => {
                let object_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                let object = inner.object(&object_id)?.clone();
                if let Some(series) = &object.version_series_id {
                    if let Some(pwc_id) = inner.checked_out.remove(series) {
                        inner.objects.remove(&pwc_id);
                    }
                }
                inner.objects.remove(&object_id);
                Ok(WireResponse {
                    status: 200,
                    body: ResponseBody::Empty,
                })
            }

            "deleteTree" => {
                let folder_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                inner.object(&folder_id)?;
                let mut doomed = vec![folder_id];
                // Transitive children by parent links.
                loop {
                    let next: Vec<String> = inner
                        .objects
                        .values()
                        .filter(|o| {
                            o.parent_id
                                .as_ref()
                                .map(|p| doomed.contains(p))
                                .unwrap_or(false)
                                && !doomed.contains(&o.id)
                        })
                        .map(|o| o.id.clone())
                        .collect();
                    if next.is_empty() {
                        break;
                    }
                    doomed.extend(next);
                }
                for id in &doomed {
                    inner.objects.remove(id);
                }
                Ok(WireResponse {
                    status: 200,
                    body: ResponseBody::Empty,
                })
            }

            "createType" => {
                let definition: Value = serde_json::from_str(
                    fields
                        .get("type")
                        .ok_or_else(|| Self::invalid("type is required"))?,
                )
                .map_err(|e| Self::invalid(format!("malformed type definition: {}", e)))?;
                let type_id = definition
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Self::invalid("type definition requires an id"))?
                    .to_string();
                inner.types.insert(type_id, definition.clone());
                Ok(Self::ok(definition))
            }

            "applyACL" => {
                let object_id = fields
                    .get("objectId")
                    .ok_or_else(|| Self::invalid("objectId is required"))?
                    .to_string();
                let additions = decode_aces(fields, "addACEPrincipal", "addACEPermission");
                let removals = decode_aces(fields, "removeACEPrincipal", "removeACEPermission");
                let object = inner.object_mut(&object_id)?;
                for (principal, _) in &removals {
                    object.aces.retain(|(p, _)| p != principal);
                }
                for (principal, permissions) in additions {
                    object.aces.retain(|(p, _)| *p != principal);
                    object.aces.push((principal, permissions));
                }
                Ok(Self::ok(acl_json(&inner.object(&object_id)?.aces)))
            }

            other => Err(Self::invalid(format!("unknown cmisaction '{}'", other))),
        }
    }

    fn handle_selector(
        inner: &Inner,
        request: &WireRequest,
        repo_id: &str,
        selector: &str,
    ) -> Result<WireResponse, TransportError> {
        let repo = inner.repo(repo_id)?;
        let fields = &request.fields;

        // Path-addressed reads resolve the object from the endpoint.
        let addressed = match &request.endpoint {
            Endpoint::Path(_, path) => Some(
                inner
                    .object_by_path(path)
                    .ok_or_else(|| Self::not_found("object"))?,
            ),
            _ => match fields.get("objectId") {
                Some(id) => Some(inner.object(id)?),
                None => None,
            },
        };

        match selector {
            "object" => {
                let object = addressed.ok_or_else(|| Self::invalid("objectId is required"))?;
                Ok(Self::ok(inner.succinct(object)))
            }

            "children" => {
                let folder = addressed
                    .map(|o| o.id.clone())
                    .unwrap_or_else(|| repo.root_folder_id.clone());
                let mut children: Vec<&StoredObject> = inner
                    .objects
                    .values()
                    .filter(|o| o.parent_id.as_deref() == Some(folder.as_str()))
                    .collect();
                children.sort_by(|a, b| a.id.cmp(&b.id));
                let (page, has_more, total) = paginate(&children, fields);
                let objects: Vec<Value> = page
                    .iter()
                    .map(|o| json!({ "object": inner.succinct(o) }))
                    .collect();
                Ok(Self::ok(json!({
                    "objects": objects,
                    "hasMoreItems": has_more,
                    "numItems": total,
                })))
            }

            "query" => {
                let statement = fields
                    .get("q")
                    .ok_or_else(|| Self::invalid("q is required"))?;
                let name_filter = extract_name_filter(statement);
                let mut results: Vec<&StoredObject> = inner
                    .objects
                    .values()
                    .filter(|o| o.base_type == "cmis:document" && !o.is_pwc)
                    .filter(|o| match &name_filter {
                        Some(name) => {
                            o.properties
                                .iter()
                                .any(|(n, v)| n == "cmis:name" && v.as_str() == Some(name))
                        }
                        None => true,
                    })
                    .collect();
                results.sort_by(|a, b| a.id.cmp(&b.id));
                let (page, has_more, total) = paginate(&results, fields);
                let rendered: Vec<Value> = page.iter().map(|o| inner.succinct(o)).collect();
                Ok(Self::ok(json!({
                    "results": rendered,
                    "hasMoreItems": has_more,
                    "numItems": total,
                })))
            }

            "acl" => {
                let object = addressed.ok_or_else(|| Self::invalid("objectId is required"))?;
                Ok(Self::ok(acl_json(&object.aces)))
            }

            "allowableActions" => {
                let object = addressed.ok_or_else(|| Self::invalid("objectId is required"))?;
                let is_document = object.base_type == "cmis:document";
                Ok(Self::ok(json!({
                    "allowableActions": {
                        "canGetProperties": true,
                        "canUpdateProperties": true,
                        "canDeleteObject": true,
                        "canCheckOut": is_document,
                        "canGetContentStream": is_document && object.content.is_some(),
                    }
                })))
            }

            "parent" => {
                let object = addressed.ok_or_else(|| Self::invalid("objectId is required"))?;
                let parent_id = object
                    .parent_id
                    .as_ref()
                    .ok_or_else(|| Self::not_found("parent"))?;
                Ok(Self::ok(inner.succinct(inner.object(parent_id)?)))
            }

            "content" => {
                let object = addressed.ok_or_else(|| Self::invalid("objectId is required"))?;
                let content = object
                    .content
                    .as_ref()
                    .ok_or_else(|| Self::not_found("content stream"))?;
                Ok(WireResponse {
                    status: 200,
                    body: ResponseBody::Binary(content.bytes.clone()),
                })
            }

            "typeDefinition" => {
                let type_id = fields
                    .get("typeId")
                    .ok_or_else(|| Self::invalid("typeId is required"))?;
                let definition = inner
                    .types
                    .get(type_id)
                    .ok_or_else(|| Self::not_found("type"))?;
                Ok(Self::ok(definition.clone()))
            }

            other => Err(Self::invalid(format!("unknown cmisselector '{}'", other))),
        }
    }
}

#[async_trait]
impl Transport for MockRepository {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());

        let action = request.fields.get("cmisaction").map(str::to_string);
        let selector = request.fields.get("cmisselector").map(str::to_string);

        match (&inner.fail_on, &action, &selector) {
            (Some(FailOn::Action(name, err)), Some(a), _) if name == a => {
                return Err(err.clone());
            }
            (Some(FailOn::Selector(name, err)), _, Some(s)) if name == s => {
                return Err(err.clone());
            }
            _ => {}
        }

        match &request.endpoint {
            Endpoint::Service => Ok(Self::ok(inner.service_document())),
            Endpoint::Repository(repo) | Endpoint::Root(repo) | Endpoint::Path(repo, _) => {
                let repo_id = repo.as_str().to_string();
                match (request.verb, action, selector) {
                    (Verb::Post, Some(action), _) => {
                        Self::handle_action(&mut inner, &request, &repo_id, &action)
                    }
                    (Verb::Get, _, Some(selector)) => {
                        Self::handle_selector(&inner, &request, &repo_id, &selector)
                    }
                    (Verb::Get, _, None) => {
                        // GET on a repository URL without a selector returns
                        // the service document entry, like the real binding.
                        inner.repo(&repo_id)?;
                        Ok(Self::ok(inner.service_document()))
                    }
                    _ => Err(Self::invalid("request names no cmisaction")),
                }
            }
        }
    }
}

/// Bump a `major.minor` version label.
fn bump_label(label: &str, major: bool) -> String {
    let (maj, min) = label
        .split_once('.')
        .and_then(|(a, b)| Some((a.parse::<u32>().ok()?, b.parse::<u32>().ok()?)))
        .unwrap_or((1, 0));
    if major {
        format!("{}.0", maj + 1)
    } else {
        format!("{}.{}", maj, min + 1)
    }
}

/// Decode indexed ACE fields: `prefix[i]` principals with
/// `perm_prefix[i][j]` permissions.
fn decode_aces(
    fields: &FormFields,
    principal_prefix: &str,
    permission_prefix: &str,
) -> Vec<(String, Vec<String>)> {
    let mut aces = Vec::new();
    for i in 0.. {
        let Some(principal) = fields.get(&format!("{}[{}]", principal_prefix, i)) else {
            break;
        };
        let mut permissions = Vec::new();
        for j in 0.. {
            match fields.get(&format!("{}[{}][{}]", permission_prefix, i, j)) {
                Some(permission) => permissions.push(permission.to_string()),
                None => break,
            }
        }
        aces.push((principal.to_string(), permissions));
    }
    aces
}

fn acl_json(aces: &[(String, Vec<String>)]) -> Value {
    let rendered: Vec<Value> = aces
        .iter()
        .map(|(principal, permissions)| {
            json!({
                "principal": { "principalId": principal },
                "permissions": permissions,
                "isDirect": true,
            })
        })
        .collect();
    json!({ "acl": { "aces": rendered }, "exact": true })
}

/// Extract the name an equality filter pins, if the statement has one.
fn extract_name_filter(statement: &str) -> Option<String> {
    let idx = statement.find("cmis:name = '")?;
    let rest = &statement[idx + "cmis:name = '".len()..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

/// Apply `maxItems`/`skipCount` paging to a result list.
fn paginate<'a>(
    items: &[&'a StoredObject],
    fields: &FormFields,
) -> (Vec<&'a StoredObject>, bool, usize) {
    let skip = fields
        .get("skipCount")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let max = fields
        .get("maxItems")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let total = items.len();
    let page: Vec<&StoredObject> = items.iter().skip(skip).take(max).copied().collect();
    let has_more = skip.saturating_add(page.len()) < total;
    (page, has_more, total)
}
