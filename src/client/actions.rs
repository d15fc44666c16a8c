//! client::actions
//!
//! Declarative action and selector tables, and the generic request
//! builders that replace per-endpoint request code.
//!
//! # Design
//!
//! Every write is described by a [`CmisAction`] plus a field set;
//! every read by a [`CmisSelector`] plus query parameters. One builder
//! each turns that description into a [`WireRequest`], computing the
//! discriminator field, the target endpoint (repository-level, root,
//! or path-qualified) and the three-tier field merge. The few actions
//! that branch on an optional path segment do so here, through data,
//! not through per-action request code.

use crate::core::types::{ObjectId, RepositoryId};
use crate::encoding::params::{merge, GlobalDefaults};
use crate::encoding::FormFields;
use crate::transport::{ContentPart, Endpoint, Verb, WireRequest};

/// A protocol write action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmisAction {
    CreateDocument,
    CreateDocumentFromSource,
    CreateFolder,
    CreateItem,
    CheckOut,
    CancelCheckOut,
    CheckIn,
    AppendContentStream,
    SetContentStream,
    Update,
    BulkUpdate,
    Delete,
    DeleteTree,
    CreateType,
    ApplyAcl,
}

impl CmisAction {
    /// The `cmisaction` discriminator value.
    pub fn wire_name(&self) -> &'static str {
        match self {
            CmisAction::CreateDocument => "createDocument",
            CmisAction::CreateDocumentFromSource => "createDocumentFromSource",
            CmisAction::CreateFolder => "createFolder",
            CmisAction::CreateItem => "createItem",
            CmisAction::CheckOut => "checkOut",
            CmisAction::CancelCheckOut => "cancelCheckOut",
            CmisAction::CheckIn => "checkIn",
            CmisAction::AppendContentStream => "appendContentStream",
            CmisAction::SetContentStream => "setContentStream",
            CmisAction::Update => "update",
            CmisAction::BulkUpdate => "bulkUpdate",
            CmisAction::Delete => "delete",
            CmisAction::DeleteTree => "deleteTree",
            CmisAction::CreateType => "createType",
            CmisAction::ApplyAcl => "applyACL",
        }
    }

    /// Whether the action targets the repository URL rather than an
    /// object endpoint under the root.
    fn is_repository_level(&self) -> bool {
        matches!(self, CmisAction::CreateType | CmisAction::BulkUpdate)
    }
}

impl std::fmt::Display for CmisAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// A protocol read selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmisSelector {
    Object,
    Children,
    Query,
    Acl,
    AllowableActions,
    Parent,
    Content,
    TypeDefinition,
}

impl CmisSelector {
    /// The `cmisselector` discriminator value.
    pub fn wire_name(&self) -> &'static str {
        match self {
            CmisSelector::Object => "object",
            CmisSelector::Children => "children",
            CmisSelector::Query => "query",
            CmisSelector::Acl => "acl",
            CmisSelector::AllowableActions => "allowableActions",
            CmisSelector::Parent => "parent",
            CmisSelector::Content => "content",
            CmisSelector::TypeDefinition => "typeDefinition",
        }
    }

    /// Whether the selector reads at the repository URL.
    fn is_repository_level(&self) -> bool {
        matches!(self, CmisSelector::Query | CmisSelector::TypeDefinition)
    }
}

impl std::fmt::Display for CmisSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Builder for one write request.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    action: CmisAction,
    repository: RepositoryId,
    folder_path: Option<String>,
    object_id: Option<ObjectId>,
    fields: FormFields,
    content: Option<ContentPart>,
}

impl ActionRequest {
    /// Start a request for `action` against `repository`.
    pub fn new(action: CmisAction, repository: RepositoryId) -> Self {
        Self {
            action,
            repository,
            folder_path: None,
            object_id: None,
            fields: FormFields::new(),
            content: None,
        }
    }

    /// Target a path-qualified endpoint under the repository root.
    pub fn in_folder(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }

    /// Name the target object (`objectId` field).
    pub fn for_object(mut self, id: &ObjectId) -> Self {
        self.object_id = Some(id.clone());
        self
    }

    /// Add caller-tier fields (options and encoded property blocks).
    pub fn fields(mut self, fields: FormFields) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach binary content.
    pub fn content(mut self, content: ContentPart) -> Self {
        self.content = Some(content);
        self
    }

    /// Materialize the wire request, merging the three field tiers.
    pub fn into_wire(self, defaults: &GlobalDefaults) -> WireRequest {
        let mut computed = FormFields::new();
        computed.insert("cmisaction", self.action.wire_name());
        if let Some(id) = &self.object_id {
            computed.insert("objectId", id.as_str());
        }

        let endpoint = if self.action.is_repository_level() {
            Endpoint::Repository(self.repository)
        } else {
            match self.folder_path {
                Some(path) => Endpoint::Path(self.repository, path),
                None => Endpoint::Root(self.repository),
            }
        };

        WireRequest {
            verb: Verb::Post,
            endpoint,
            fields: merge(defaults.to_fields(), computed, self.fields),
            content: self.content,
        }
    }
}

/// Builder for one read request.
#[derive(Debug, Clone)]
pub struct SelectorRequest {
    selector: CmisSelector,
    repository: RepositoryId,
    path: Option<String>,
    object_id: Option<ObjectId>,
    params: FormFields,
}

impl SelectorRequest {
    /// Start a request for `selector` against `repository`.
    pub fn new(selector: CmisSelector, repository: RepositoryId) -> Self {
        Self {
            selector,
            repository,
            path: None,
            object_id: None,
            params: FormFields::new(),
        }
    }

    /// Address the object by path instead of id.
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Address the object by id (`objectId` parameter).
    pub fn for_object(mut self, id: &ObjectId) -> Self {
        self.object_id = Some(id.clone());
        self
    }

    /// Add caller-tier query parameters.
    pub fn params(mut self, params: FormFields) -> Self {
        self.params.extend(params);
        self
    }

    /// Materialize the wire request, merging the three field tiers.
    pub fn into_wire(self, defaults: &GlobalDefaults) -> WireRequest {
        let mut computed = FormFields::new();
        computed.insert("cmisselector", self.selector.wire_name());
        if let Some(id) = &self.object_id {
            computed.insert("objectId", id.as_str());
        }

        let endpoint = if self.selector.is_repository_level() {
            Endpoint::Repository(self.repository)
        } else {
            match self.path {
                Some(path) => Endpoint::Path(self.repository, path),
                None => Endpoint::Root(self.repository),
            }
        };

        WireRequest {
            verb: Verb::Get,
            endpoint,
            fields: merge(defaults.to_fields(), computed, self.params),
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryId {
        RepositoryId::new("A1").unwrap()
    }

    #[test]
    fn action_wire_names() {
        assert_eq!(CmisAction::CreateDocument.wire_name(), "createDocument");
        assert_eq!(CmisAction::CancelCheckOut.wire_name(), "cancelCheckOut");
        assert_eq!(CmisAction::ApplyAcl.wire_name(), "applyACL");
        assert_eq!(format!("{}", CmisAction::DeleteTree), "deleteTree");
    }

    #[test]
    fn selector_wire_names() {
        assert_eq!(CmisSelector::Query.wire_name(), "query");
        assert_eq!(
            CmisSelector::AllowableActions.wire_name(),
            "allowableActions"
        );
    }

    #[test]
    fn action_without_path_targets_root() {
        let request =
            ActionRequest::new(CmisAction::CreateDocument, repo()).into_wire(&GlobalDefaults::default());

        assert_eq!(request.verb, Verb::Post);
        assert_eq!(request.endpoint, Endpoint::Root(repo()));
        assert_eq!(request.fields.get("cmisaction"), Some("createDocument"));
        assert_eq!(request.fields.get("succinct"), Some("true"));
        assert_eq!(request.fields.get("_charset_"), Some("UTF-8"));
    }

    #[test]
    fn action_with_path_targets_path_endpoint() {
        let request = ActionRequest::new(CmisAction::CreateDocument, repo())
            .in_folder("Sites/intranet")
            .into_wire(&GlobalDefaults::default());

        assert_eq!(
            request.endpoint,
            Endpoint::Path(repo(), "Sites/intranet".to_string())
        );
    }

    #[test]
    fn repository_level_action_ignores_path_branch() {
        let request =
            ActionRequest::new(CmisAction::CreateType, repo()).into_wire(&GlobalDefaults::default());
        assert_eq!(request.endpoint, Endpoint::Repository(repo()));
    }

    #[test]
    fn caller_fields_override_defaults() {
        let mut caller = FormFields::new();
        caller.insert("succinct", "false");

        let request = ActionRequest::new(CmisAction::Update, repo())
            .fields(caller)
            .into_wire(&GlobalDefaults::default());

        assert_eq!(request.fields.get("succinct"), Some("false"));
    }

    #[test]
    fn selector_carries_object_id() {
        let id = ObjectId::new("id123").unwrap();
        let request = SelectorRequest::new(CmisSelector::Object, repo())
            .for_object(&id)
            .into_wire(&GlobalDefaults::default());

        assert_eq!(request.verb, Verb::Get);
        assert_eq!(request.fields.get("cmisselector"), Some("object"));
        assert_eq!(request.fields.get("objectId"), Some("id123"));
    }

    #[test]
    fn query_is_repository_level() {
        let request = SelectorRequest::new(CmisSelector::Query, repo())
            .into_wire(&GlobalDefaults::default());
        assert_eq!(request.endpoint, Endpoint::Repository(repo()));
    }
}
