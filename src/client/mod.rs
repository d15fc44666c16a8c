//! client
//!
//! The operation dispatcher: one method per protocol action.
//!
//! # Design
//!
//! Every action follows the same template: validate required inputs,
//! resolve the target repository, build the payload through the action
//! table and the parameter merger, hand it to the transport, map the
//! response back to a semantic result or typed error. Validation
//! failures never reach the network.
//!
//! [`CmisSession`] owns the transport, the per-call defaults and the
//! repository registry. Repository context is explicit: callers obtain
//! a [`RepositoryHandle`] — for the default repository or a named one —
//! and dispatch through it. Resolution happens at handle creation, so a
//! missing registry fetch fails fast, once.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cmis_browser::client::CmisSession;
//! use cmis_browser::client::options::WriteOptions;
//! use cmis_browser::core::types::ContentStream;
//! use cmis_browser::transport::http::BrowserTransport;
//! use cmis_browser::transport::StaticDestination;
//!
//! let resolver = Arc::new(StaticDestination::unauthenticated(
//!     "https://ecm.example.com/cmis/browser",
//! ));
//! let mut session = CmisSession::new(Arc::new(BrowserTransport::new(resolver)));
//! session.connect().await?;
//!
//! let repo = session.default_repository()?;
//! let doc = repo
//!     .create_document(
//!         "a.txt",
//!         ContentStream::new("a.txt", b"hello".to_vec()),
//!         &WriteOptions::default(),
//!     )
//!     .await?;
//! println!("created {}", doc.id);
//! ```

pub mod actions;
pub mod options;
pub mod registry;
pub mod response;

pub use registry::RepositoryRegistry;
pub use response::{AclResult, ObjectList};

use std::sync::Arc;

use serde_json::Value;

use crate::core::config::Config;
use crate::core::properties::{PropertyBag, PropertyValue, Scalar};
use crate::core::types::{CmisObject, ContentStream, ObjectId, Repository, RepositoryId, TypeId};
use crate::encoding::params::GlobalDefaults;
use crate::encoding::{encode_indexed, encode_property_pairs, FormFields};
use crate::error::CmisError;
use crate::transport::{ContentPart, ResponseBody, Transport, WireRequest, WireResponse};

use actions::{ActionRequest, CmisAction, CmisSelector, SelectorRequest};
use options::{AclChanges, CheckInOptions, DeleteTreeOptions, Paging, QueryOptions, WriteOptions};

/// A client session: transport, defaults and repository registry.
///
/// The registry is session state with a single writer; all mutation
/// goes through `&mut self` methods, so a fetch completes and is
/// visible before any dependent call starts.
pub struct CmisSession {
    transport: Arc<dyn Transport>,
    defaults: GlobalDefaults,
    registry: RepositoryRegistry,
    preferred_default: Option<RepositoryId>,
}

impl std::fmt::Debug for CmisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmisSession")
            .field("transport", &self.transport.name())
            .field("defaults", &self.defaults)
            .field("registry", &self.registry)
            .finish()
    }
}

impl CmisSession {
    /// Create a session with built-in defaults.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_defaults(transport, GlobalDefaults::default())
    }

    /// Create a session with explicit per-call defaults.
    pub fn with_defaults(transport: Arc<dyn Transport>, defaults: GlobalDefaults) -> Self {
        Self {
            transport,
            defaults,
            registry: RepositoryRegistry::new(),
            preferred_default: None,
        }
    }

    /// Create a session from loaded configuration.
    ///
    /// The config's charset and succinct flag become the session
    /// defaults; a configured repository id is applied as the default
    /// repository once [`connect`](CmisSession::connect) has fetched
    /// the descriptor map.
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let defaults = GlobalDefaults {
            charset: config.charset().to_string(),
            succinct: config.succinct(),
        };
        let preferred_default = config
            .default_repository()
            .and_then(|id| RepositoryId::new(id).ok());
        Self {
            transport,
            defaults,
            registry: RepositoryRegistry::new(),
            preferred_default,
        }
    }

    /// Fetch the repository map and apply the configured default, if any.
    ///
    /// # Errors
    ///
    /// Transport failures propagate; a configured default repository
    /// that the service does not advertise is `RepositoryNotFound`.
    pub async fn connect(&mut self) -> Result<(), CmisError> {
        self.registry.fetch_all(self.transport.as_ref()).await?;
        if let Some(id) = self.preferred_default.clone() {
            self.registry.set_default(&id)?;
        }
        Ok(())
    }

    /// The repository registry.
    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    /// Set the default repository for subsequent calls.
    pub fn set_default_repository(&mut self, id: &RepositoryId) -> Result<(), CmisError> {
        self.registry.set_default(id)
    }

    /// A handle on the default repository.
    pub fn default_repository(&self) -> Result<RepositoryHandle<'_>, CmisError> {
        let repository = self.registry.default_repository()?.clone();
        Ok(RepositoryHandle {
            session: self,
            repository,
        })
    }

    /// A handle on an explicitly named repository.
    pub fn repository(&self, id: &RepositoryId) -> Result<RepositoryHandle<'_>, CmisError> {
        let repository = self.registry.get(id)?.clone();
        Ok(RepositoryHandle {
            session: self,
            repository,
        })
    }
}

/// Dispatch methods bound to one resolved repository.
#[derive(Debug)]
pub struct RepositoryHandle<'a> {
    session: &'a CmisSession,
    repository: Repository,
}

impl RepositoryHandle<'_> {
    /// The resolved repository descriptor.
    pub fn descriptor(&self) -> &Repository {
        &self.repository
    }

    /// The repository id.
    pub fn id(&self) -> &RepositoryId {
        &self.repository.id
    }

    fn defaults(&self) -> &GlobalDefaults {
        &self.session.defaults
    }

    fn action(&self, action: CmisAction) -> ActionRequest {
        ActionRequest::new(action, self.repository.id.clone())
    }

    fn selector(&self, selector: CmisSelector) -> SelectorRequest {
        SelectorRequest::new(selector, self.repository.id.clone())
    }

    async fn execute(&self, request: WireRequest) -> Result<WireResponse, CmisError> {
        self.session
            .transport
            .execute(request)
            .await
            .map_err(CmisError::from)
    }

    async fn execute_for_object(&self, request: WireRequest) -> Result<CmisObject, CmisError> {
        let response = self.execute(request).await?;
        response::parse_object(response.json().map_err(CmisError::from)?)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a document, optionally inside a folder path.
    ///
    /// The content may be empty; an empty stream is a valid document
    /// body. With `options.folder_path` set the call targets the
    /// path-qualified endpoint, otherwise the repository root — the
    /// property payload is identical either way.
    pub async fn create_document(
        &self,
        name: &str,
        content: ContentStream,
        options: &WriteOptions,
    ) -> Result<CmisObject, CmisError> {
        require(name, "document name")?;
        let bag = base_properties("cmis:document", name, &options.properties);
        let mut request = self
            .action(CmisAction::CreateDocument)
            .fields(options.protocol_fields())
            .fields(encode_property_pairs(&bag))
            .content(content_part(content));
        if let Some(path) = &options.folder_path {
            request = request.in_folder(path.clone());
        }
        self.execute_for_object(request.into_wire(self.defaults()))
            .await
    }

    /// Create a folder, optionally inside a folder path.
    pub async fn create_folder(
        &self,
        name: &str,
        options: &WriteOptions,
    ) -> Result<CmisObject, CmisError> {
        require(name, "folder name")?;
        let bag = base_properties("cmis:folder", name, &options.properties);
        let mut request = self
            .action(CmisAction::CreateFolder)
            .fields(options.protocol_fields())
            .fields(encode_property_pairs(&bag));
        if let Some(path) = &options.folder_path {
            request = request.in_folder(path.clone());
        }
        self.execute_for_object(request.into_wire(self.defaults()))
            .await
    }

    /// Create a link object pointing at an external URL.
    pub async fn create_link(
        &self,
        name: &str,
        url: &str,
        options: &WriteOptions,
    ) -> Result<CmisObject, CmisError> {
        require(name, "link name")?;
        require(url, "link url")?;
        let mut bag = base_properties("cmis:item", name, &options.properties);
        bag.insert("url", PropertyValue::Single(Scalar::str(url)));
        let mut request = self
            .action(CmisAction::CreateItem)
            .fields(options.protocol_fields())
            .fields(encode_property_pairs(&bag));
        if let Some(path) = &options.folder_path {
            request = request.in_folder(path.clone());
        }
        self.execute_for_object(request.into_wire(self.defaults()))
            .await
    }

    /// Create a document as a copy of an existing one.
    pub async fn create_document_from_source(
        &self,
        source: &ObjectId,
        name: Option<&str>,
        options: &WriteOptions,
    ) -> Result<CmisObject, CmisError> {
        let mut bag = options.properties.clone();
        if let Some(name) = name {
            require(name, "document name")?;
            bag.insert("cmis:name", PropertyValue::Single(Scalar::str(name)));
        }
        let mut fields = FormFields::new();
        fields.insert("sourceId", source.as_str());
        let mut request = self
            .action(CmisAction::CreateDocumentFromSource)
            .fields(fields)
            .fields(options.protocol_fields())
            .fields(encode_property_pairs(&bag));
        if let Some(path) = &options.folder_path {
            request = request.in_folder(path.clone());
        }
        self.execute_for_object(request.into_wire(self.defaults()))
            .await
    }

    // =========================================================================
    // Versioning actions
    // =========================================================================

    /// Check out a document, producing its private working copy.
    ///
    /// # Errors
    ///
    /// `VersioningConflict` if the series already has an open PWC. That
    /// state is enforced by the remote repository; the client holds no
    /// local lock.
    pub async fn check_out(&self, document: &ObjectId) -> Result<CmisObject, CmisError> {
        let request = self
            .action(CmisAction::CheckOut)
            .for_object(document)
            .into_wire(self.defaults());
        match self.execute_for_object(request).await {
            Err(CmisError::Remote { status: 409, .. }) => Err(CmisError::VersioningConflict),
            other => other,
        }
    }

    /// Discard a private working copy.
    pub async fn cancel_check_out(&self, pwc: &ObjectId) -> Result<(), CmisError> {
        let request = self
            .action(CmisAction::CancelCheckOut)
            .for_object(pwc)
            .into_wire(self.defaults());
        self.execute(request).await.map(|_| ())
    }

    /// Check in a private working copy as a new version.
    pub async fn check_in(
        &self,
        pwc: &ObjectId,
        options: &CheckInOptions,
    ) -> Result<CmisObject, CmisError> {
        let mut fields = FormFields::new();
        fields.insert("major", options.major.to_string());
        if let Some(comment) = &options.comment {
            fields.insert("checkinComment", comment.clone());
        }
        let request = self
            .action(CmisAction::CheckIn)
            .for_object(pwc)
            .fields(fields)
            .fields(encode_property_pairs(&options.properties))
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Append a content chunk to a document (usually a PWC).
    pub async fn append_content_stream(
        &self,
        document: &ObjectId,
        content: ContentStream,
        is_last_chunk: bool,
    ) -> Result<CmisObject, CmisError> {
        require(&content.file_name, "content filename")?;
        let mut fields = FormFields::new();
        fields.insert("isLastChunk", is_last_chunk.to_string());
        let request = self
            .action(CmisAction::AppendContentStream)
            .for_object(document)
            .fields(fields)
            .content(content_part(content))
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    /// Replace a document's content stream.
    pub async fn set_content_stream(
        &self,
        document: &ObjectId,
        content: ContentStream,
        overwrite: bool,
    ) -> Result<CmisObject, CmisError> {
        require(&content.file_name, "content filename")?;
        let mut fields = FormFields::new();
        fields.insert("overwriteFlag", overwrite.to_string());
        let request = self
            .action(CmisAction::SetContentStream)
            .for_object(document)
            .fields(fields)
            .content(content_part(content))
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    /// Download a document's content stream.
    pub async fn download(&self, document: &ObjectId) -> Result<Vec<u8>, CmisError> {
        let request = self
            .selector(CmisSelector::Content)
            .for_object(document)
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        match response.body {
            ResponseBody::Binary(bytes) => Ok(bytes),
            ResponseBody::Empty => Ok(Vec::new()),
            ResponseBody::Json(_) => Err(CmisError::MalformedResponse(
                "expected content bytes, got JSON".into(),
            )),
        }
    }

    // =========================================================================
    // Update and delete
    // =========================================================================

    /// Update an object's properties.
    ///
    /// An empty multi-valued property clears the property on the
    /// repository side.
    pub async fn update_properties(
        &self,
        object: &ObjectId,
        properties: &PropertyBag,
    ) -> Result<CmisObject, CmisError> {
        let request = self
            .action(CmisAction::Update)
            .for_object(object)
            .fields(encode_property_pairs(properties))
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    /// Apply the same property changes to several objects at once.
    ///
    /// The object list travels in the indexed encoding; the property
    /// changes as one property-pair block.
    pub async fn bulk_update_properties(
        &self,
        objects: &[ObjectId],
        properties: &PropertyBag,
    ) -> Result<Vec<ObjectId>, CmisError> {
        if objects.is_empty() {
            return Err(CmisError::Validation(
                "bulk update requires at least one object id".into(),
            ));
        }
        let records: Vec<PropertyBag> = objects
            .iter()
            .map(|id| {
                let mut record = PropertyBag::new();
                record.insert("objectId", PropertyValue::Single(Scalar::str(id.as_str())));
                record
            })
            .collect();
        let request = self
            .action(CmisAction::BulkUpdate)
            .fields(encode_indexed(&records))
            .fields(encode_property_pairs(properties))
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        parse_bulk_ids(response.json().map_err(CmisError::from)?)
    }

    /// Delete an object.
    pub async fn delete_object(
        &self,
        object: &ObjectId,
        all_versions: bool,
    ) -> Result<(), CmisError> {
        let mut fields = FormFields::new();
        fields.insert("allVersions", all_versions.to_string());
        let request = self
            .action(CmisAction::Delete)
            .for_object(object)
            .fields(fields)
            .into_wire(self.defaults());
        self.execute(request).await.map(|_| ())
    }

    /// Delete a folder and everything beneath it.
    pub async fn delete_tree(
        &self,
        folder: &ObjectId,
        options: &DeleteTreeOptions,
    ) -> Result<(), CmisError> {
        let request = self
            .action(CmisAction::DeleteTree)
            .for_object(folder)
            .fields(options.to_fields())
            .into_wire(self.defaults());
        self.execute(request).await.map(|_| ())
    }

    // =========================================================================
    // Query and reads
    // =========================================================================

    /// Run a query statement.
    pub async fn query(
        &self,
        statement: &str,
        options: &QueryOptions,
    ) -> Result<ObjectList, CmisError> {
        require(statement, "query statement")?;
        let mut params = FormFields::new();
        params.insert("q", statement);
        params.extend(options.to_fields());
        let request = self
            .selector(CmisSelector::Query)
            .params(params)
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        response::parse_query_result(response.json().map_err(CmisError::from)?)
    }

    /// Fetch an object by id.
    pub async fn get_object(&self, object: &ObjectId) -> Result<CmisObject, CmisError> {
        let request = self
            .selector(CmisSelector::Object)
            .for_object(object)
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    /// Fetch an object by path under the repository root.
    pub async fn get_object_by_path(&self, path: &str) -> Result<CmisObject, CmisError> {
        require(path, "object path")?;
        let request = self
            .selector(CmisSelector::Object)
            .at_path(path)
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    /// List a folder's children.
    pub async fn get_children(
        &self,
        folder: &ObjectId,
        paging: &Paging,
    ) -> Result<ObjectList, CmisError> {
        let request = self
            .selector(CmisSelector::Children)
            .for_object(folder)
            .params(paging.to_fields())
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        response::parse_children(response.json().map_err(CmisError::from)?)
    }

    /// Fetch an object's parent folder.
    pub async fn get_parent(&self, object: &ObjectId) -> Result<CmisObject, CmisError> {
        let request = self
            .selector(CmisSelector::Parent)
            .for_object(object)
            .into_wire(self.defaults());
        self.execute_for_object(request).await
    }

    /// Fetch the actions the repository allows on an object.
    pub async fn get_allowable_actions(
        &self,
        object: &ObjectId,
    ) -> Result<Vec<(String, bool)>, CmisError> {
        let request = self
            .selector(CmisSelector::AllowableActions)
            .for_object(object)
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        response::parse_allowable_actions(response.json().map_err(CmisError::from)?)
    }

    // =========================================================================
    // ACL
    // =========================================================================

    /// Fetch an object's ACL.
    pub async fn get_acl(&self, object: &ObjectId) -> Result<AclResult, CmisError> {
        let request = self
            .selector(CmisSelector::Acl)
            .for_object(object)
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        response::parse_acl(response.json().map_err(CmisError::from)?)
    }

    /// Apply ACL changes to an object.
    ///
    /// Entry lists travel in the indexed encoding. Empty changes are a
    /// no-op that returns the current ACL without a write.
    pub async fn apply_acl(
        &self,
        object: &ObjectId,
        changes: &AclChanges,
    ) -> Result<AclResult, CmisError> {
        if changes.is_empty() {
            return self.get_acl(object).await;
        }
        let additions: Vec<PropertyBag> = changes
            .add
            .iter()
            .map(|ace| ace.to_record("addACEPrincipal", "addACEPermission"))
            .collect();
        let removals: Vec<PropertyBag> = changes
            .remove
            .iter()
            .map(|ace| ace.to_record("removeACEPrincipal", "removeACEPermission"))
            .collect();
        let request = self
            .action(CmisAction::ApplyAcl)
            .for_object(object)
            .fields(encode_indexed(&additions))
            .fields(encode_indexed(&removals))
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        response::parse_acl(response.json().map_err(CmisError::from)?)
    }

    // =========================================================================
    // Type management
    // =========================================================================

    /// Create an object type from a definition skeleton.
    ///
    /// Caller-supplied property definitions are deep-merged over the
    /// required defaults before serializing; the repository rejects
    /// incomplete definitions.
    pub async fn create_type(&self, definition: Value) -> Result<Value, CmisError> {
        let mut definition = definition;
        if definition.get("id").and_then(Value::as_str).is_none() {
            return Err(CmisError::Validation(
                "type definition requires an id".into(),
            ));
        }
        merge_type_defaults(&mut definition);
        let rendered = serde_json::to_string(&definition)
            .map_err(|e| CmisError::Validation(format!("unserializable type definition: {}", e)))?;
        let mut fields = FormFields::new();
        fields.insert("type", rendered);
        let request = self
            .action(CmisAction::CreateType)
            .fields(fields)
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        Ok(response.json().map_err(CmisError::from)?.clone())
    }

    /// Fetch a type definition.
    pub async fn get_type_definition(&self, type_id: &TypeId) -> Result<Value, CmisError> {
        let mut params = FormFields::new();
        params.insert("typeId", type_id.as_str());
        let request = self
            .selector(CmisSelector::TypeDefinition)
            .params(params)
            .into_wire(self.defaults());
        let response = self.execute(request).await?;
        Ok(response.json().map_err(CmisError::from)?.clone())
    }
}

/// Fail before dispatch when a required input is blank.
fn require(value: &str, what: &str) -> Result<(), CmisError> {
    if value.trim().is_empty() {
        Err(CmisError::Validation(format!("{} cannot be empty", what)))
    } else {
        Ok(())
    }
}

/// Base property bag for a create call: type id and name first, caller
/// overrides merged over them as one block.
fn base_properties(type_id: &str, name: &str, overrides: &PropertyBag) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.insert(
        "cmis:objectTypeId",
        PropertyValue::Single(Scalar::str(type_id)),
    );
    bag.insert("cmis:name", PropertyValue::Single(Scalar::str(name)));
    for (property, value) in overrides.iter() {
        bag.insert(property, value.clone());
    }
    bag
}

fn content_part(content: ContentStream) -> ContentPart {
    let mime_type = content.mime_type().to_string();
    ContentPart {
        file_name: content.file_name,
        mime_type,
        bytes: content.bytes,
    }
}

/// Required defaults for property definitions in `createType`.
fn property_definition_defaults() -> [(&'static str, Value); 5] {
    [
        ("inherited", Value::Bool(false)),
        ("openChoice", Value::Bool(true)),
        ("required", Value::Bool(false)),
        ("queryable", Value::Bool(true)),
        ("orderable", Value::Bool(false)),
    ]
}

/// Deep-merge the required defaults into every property definition of
/// a type skeleton. Caller-supplied values win.
fn merge_type_defaults(definition: &mut Value) {
    let Some(property_definitions) = definition
        .get_mut("propertyDefinitions")
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    for (_, property) in property_definitions.iter_mut() {
        if let Some(object) = property.as_object_mut() {
            for (key, default) in property_definition_defaults() {
                object.entry(key).or_insert(default);
            }
        }
    }
}

fn parse_bulk_ids(value: &Value) -> Result<Vec<ObjectId>, CmisError> {
    let entries = value
        .get("objects")
        .and_then(Value::as_array)
        .ok_or_else(|| CmisError::MalformedResponse("bulk response carries no objects".into()))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .get("objectId")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    CmisError::MalformedResponse("bulk entry carries no objectId".into())
                })
                .and_then(|id| {
                    ObjectId::new(id).map_err(|e| CmisError::MalformedResponse(e.to_string()))
                })
        })
        .collect()
}
