//! client::options
//!
//! Call-scoped option structs.
//!
//! Options are explicit and fully specified: each struct documents the
//! fields it contributes and `Default` gives the protocol's baseline.
//! Nothing here is persisted across calls.

use crate::core::properties::{PropertyBag, PropertyValue, Scalar};
use crate::encoding::FormFields;

/// Options for create and update calls.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Target folder path under the repository root. With a path the
    /// call targets the path-qualified endpoint; without one it targets
    /// the repository root. The property payload is identical either
    /// way.
    pub folder_path: Option<String>,
    /// Property overrides, merged over the call's base properties.
    pub properties: PropertyBag,
    /// Override the succinct flag for this call.
    pub succinct: Option<bool>,
    /// Request allowable actions in the response.
    pub include_allowable_actions: Option<bool>,
}

impl WriteOptions {
    /// Create options targeting a folder path.
    pub fn in_folder(path: impl Into<String>) -> Self {
        Self {
            folder_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Protocol-flag fields contributed by these options.
    pub(crate) fn protocol_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        if let Some(succinct) = self.succinct {
            fields.insert("succinct", succinct.to_string());
        }
        if let Some(include) = self.include_allowable_actions {
            fields.insert("includeAllowableActions", include.to_string());
        }
        fields
    }
}

/// Options for `checkIn`.
#[derive(Debug, Clone)]
pub struct CheckInOptions {
    /// Check in as a major version.
    pub major: bool,
    /// Checkin comment.
    pub comment: Option<String>,
    /// Property changes applied with the checkin.
    pub properties: PropertyBag,
}

impl Default for CheckInOptions {
    fn default() -> Self {
        Self {
            major: true,
            comment: None,
            properties: PropertyBag::new(),
        }
    }
}

impl CheckInOptions {
    /// Minor-version checkin with no comment.
    pub fn minor() -> Self {
        Self {
            major: false,
            ..Default::default()
        }
    }
}

/// Options for `query`.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum number of results to return.
    pub max_items: Option<u32>,
    /// Number of results to skip.
    pub skip_count: Option<u32>,
    /// Search all versions, not just the latest.
    pub search_all_versions: bool,
    /// Rendition filter expression.
    pub rendition_filter: Option<String>,
    /// Relationship inclusion mode.
    pub include_relationships: Option<String>,
}

impl QueryOptions {
    /// Paging shorthand.
    pub fn page(max_items: u32, skip_count: u32) -> Self {
        Self {
            max_items: Some(max_items),
            skip_count: Some(skip_count),
            ..Default::default()
        }
    }

    pub(crate) fn to_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert("searchAllVersions", self.search_all_versions.to_string());
        if let Some(max) = self.max_items {
            fields.insert("maxItems", max.to_string());
        }
        if let Some(skip) = self.skip_count {
            fields.insert("skipCount", skip.to_string());
        }
        if let Some(filter) = &self.rendition_filter {
            fields.insert("renditionFilter", filter.clone());
        }
        if let Some(mode) = &self.include_relationships {
            fields.insert("includeRelationships", mode.clone());
        }
        fields
    }
}

/// Options for `deleteTree`.
#[derive(Debug, Clone)]
pub struct DeleteTreeOptions {
    /// Delete all versions of contained documents.
    pub all_versions: bool,
    /// What to do with multi-filed objects.
    pub unfile_objects: Option<UnfileMode>,
    /// Continue deleting when an item fails.
    pub continue_on_failure: bool,
}

impl Default for DeleteTreeOptions {
    fn default() -> Self {
        Self {
            all_versions: true,
            unfile_objects: None,
            continue_on_failure: false,
        }
    }
}

impl DeleteTreeOptions {
    pub(crate) fn to_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert("allVersions", self.all_versions.to_string());
        if let Some(mode) = self.unfile_objects {
            fields.insert("unfileObjects", mode.wire_name());
        }
        fields.insert(
            "continueOnFailure",
            self.continue_on_failure.to_string(),
        );
        fields
    }
}

/// Unfiling mode for `deleteTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfileMode {
    /// Unfile objects from the deleted tree.
    Unfile,
    /// Delete objects filed only in this tree, unfile the rest.
    DeleteSingleFiled,
    /// Delete every contained object.
    Delete,
}

impl UnfileMode {
    fn wire_name(&self) -> &'static str {
        match self {
            UnfileMode::Unfile => "unfile",
            UnfileMode::DeleteSingleFiled => "deletesinglefiled",
            UnfileMode::Delete => "delete",
        }
    }
}

/// Paging for list reads (`children`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Paging {
    /// Maximum number of entries to return.
    pub max_items: Option<u32>,
    /// Number of entries to skip.
    pub skip_count: Option<u32>,
}

impl Paging {
    pub(crate) fn to_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        if let Some(max) = self.max_items {
            fields.insert("maxItems", max.to_string());
        }
        if let Some(skip) = self.skip_count {
            fields.insert("skipCount", skip.to_string());
        }
        fields
    }
}

/// One access-control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    /// Principal the entry grants to.
    pub principal: String,
    /// Granted permissions, in order.
    pub permissions: Vec<String>,
}

impl Ace {
    /// Create an entry.
    pub fn new(principal: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            principal: principal.into(),
            permissions,
        }
    }

    /// Render as an indexed-encoding record under the given prefixes.
    pub(crate) fn to_record(&self, principal_field: &str, permission_field: &str) -> PropertyBag {
        let mut record = PropertyBag::new();
        record.insert(
            principal_field,
            PropertyValue::Single(Scalar::str(self.principal.as_str())),
        );
        record.insert(
            permission_field,
            PropertyValue::Multi(
                self.permissions
                    .iter()
                    .map(|p| Scalar::str(p.as_str()))
                    .collect(),
            ),
        );
        record
    }
}

/// ACL changes for `applyACL`.
#[derive(Debug, Clone, Default)]
pub struct AclChanges {
    /// Entries to add.
    pub add: Vec<Ace>,
    /// Entries to remove.
    pub remove: Vec<Ace>,
}

impl AclChanges {
    /// Check if there is anything to apply.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Shorthand for additions only.
    pub fn grant(add: Vec<Ace>) -> Self {
        Self {
            add,
            remove: Vec::new(),
        }
    }
}
