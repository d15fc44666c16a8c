//! Integration tests for session dispatch against the in-memory mock
//! repository.
//!
//! These tests verify the full validate → resolve → encode → execute →
//! decode pipeline without a network. HTTP-level behavior is covered in
//! `http_transport_integration.rs`.

use std::sync::Arc;

use cmis_browser::client::options::{
    Ace, AclChanges, DeleteTreeOptions, Paging, QueryOptions, WriteOptions,
};
use cmis_browser::client::CmisSession;
use cmis_browser::core::properties::{PropertyBag, PropertyValue, Scalar};
use cmis_browser::core::types::{ContentStream, ObjectId, RepositoryId};
use cmis_browser::error::CmisError;
use cmis_browser::transport::mock::MockRepository;
use serde_json::json;

async fn connected_session(mock: &MockRepository) -> CmisSession {
    let mut session = CmisSession::new(Arc::new(mock.clone()));
    session.connect().await.unwrap();
    session
}

fn hello_txt() -> ContentStream {
    ContentStream::new("a.txt", b"hello".to_vec())
}

// =============================================================================
// Registry
// =============================================================================

mod registry {
    use super::*;

    #[tokio::test]
    async fn fetch_sets_default_to_first_repository() {
        let mock = MockRepository::with_repositories(vec![("R1", "First"), ("R2", "Second")]);
        let session = connected_session(&mock).await;

        let handle = session.default_repository().unwrap();
        assert_eq!(handle.id().as_str(), "R1");
        assert_eq!(session.registry().repositories().len(), 2);
    }

    #[tokio::test]
    async fn set_default_switches_repositories() {
        let mock = MockRepository::with_repositories(vec![("R1", "First"), ("R2", "Second")]);
        let mut session = connected_session(&mock).await;

        let r2 = RepositoryId::new("R2").unwrap();
        session.set_default_repository(&r2).unwrap();
        assert_eq!(session.default_repository().unwrap().id().as_str(), "R2");
    }

    #[tokio::test]
    async fn set_default_unknown_id_fails() {
        let mock = MockRepository::new();
        let mut session = connected_session(&mock).await;

        let r9 = RepositoryId::new("R9").unwrap();
        assert!(matches!(
            session.set_default_repository(&r9),
            Err(CmisError::RepositoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn operations_before_connect_fail_fast() {
        let mock = MockRepository::new();
        let session = CmisSession::new(Arc::new(mock.clone()));

        assert!(matches!(
            session.default_repository(),
            Err(CmisError::RepositoryNotInitialized)
        ));
        // Nothing reached the transport.
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn explicit_repository_lookup() {
        let mock = MockRepository::with_repositories(vec![("R1", "First"), ("R2", "Second")]);
        let session = connected_session(&mock).await;

        let r2 = RepositoryId::new("R2").unwrap();
        assert_eq!(session.repository(&r2).unwrap().id().as_str(), "R2");

        let r9 = RepositoryId::new("R9").unwrap();
        assert!(matches!(
            session.repository(&r9),
            Err(CmisError::RepositoryNotFound(_))
        ));
    }
}

// =============================================================================
// Create / read / delete lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_read_delete_round_trip() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let doc = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::default())
            .await
            .unwrap();

        assert!(!doc.id.as_str().is_empty());
        assert_eq!(doc.name(), Some("a.txt"));
        assert_eq!(doc.version_label.as_deref(), Some("1.0"));

        let bytes = repo.download(&doc.id).await.unwrap();
        assert_eq!(bytes, b"hello");

        repo.delete_object(&doc.id, true).await.unwrap();

        let err = repo.get_object(&doc.id).await.unwrap_err();
        assert!(err.is_not_found(), "expected not-found, got {:?}", err);
    }

    #[tokio::test]
    async fn empty_content_is_a_valid_document_body() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let doc = repo
            .create_document(
                "empty.txt",
                ContentStream::new("empty.txt", Vec::new()),
                &WriteOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(repo.download(&doc.id).await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn create_in_folder_path_and_at_root_send_identical_payloads() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        repo.create_folder("inbox", &WriteOptions::default())
            .await
            .unwrap();

        repo.create_document("a.txt", hello_txt(), &WriteOptions::default())
            .await
            .unwrap();
        repo.create_document("a.txt", hello_txt(), &WriteOptions::in_folder("inbox"))
            .await
            .unwrap();

        let requests = mock.requests_for_action("createDocument");
        assert_eq!(requests.len(), 2);
        // Different targets, identical field payloads.
        assert_ne!(requests[0].endpoint, requests[1].endpoint);
        assert_eq!(requests[0].fields, requests[1].fields);
        assert_eq!(requests[0].content, requests[1].content);
    }

    #[tokio::test]
    async fn created_document_lands_in_the_target_folder() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let folder = repo
            .create_folder("inbox", &WriteOptions::default())
            .await
            .unwrap();
        let doc = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::in_folder("inbox"))
            .await
            .unwrap();

        let children = repo.get_children(&folder.id, &Paging::default()).await.unwrap();
        assert_eq!(children.objects.len(), 1);
        assert_eq!(children.objects[0].id, doc.id);

        let parent = repo.get_parent(&doc.id).await.unwrap();
        assert_eq!(parent.id, folder.id);

        let by_path = repo.get_object_by_path("inbox/a.txt").await.unwrap();
        assert_eq!(by_path.id, doc.id);
    }

    #[tokio::test]
    async fn create_link_object() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let link = repo
            .create_link("docs", "https://example.com/docs", &WriteOptions::default())
            .await
            .unwrap();

        assert_eq!(link.name(), Some("docs"));
        assert_eq!(
            link.properties.get("url").and_then(|v| v.as_str()),
            Some("https://example.com/docs")
        );
    }

    #[tokio::test]
    async fn copy_from_source_duplicates_content() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let original = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::default())
            .await
            .unwrap();

        let copy = repo
            .create_document_from_source(&original.id, Some("b.txt"), &WriteOptions::default())
            .await
            .unwrap();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name(), Some("b.txt"));
        assert_eq!(repo.download(&copy.id).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn delete_tree_removes_descendants() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let folder = repo
            .create_folder("doomed", &WriteOptions::default())
            .await
            .unwrap();
        let doc = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::in_folder("doomed"))
            .await
            .unwrap();

        repo.delete_tree(&folder.id, &DeleteTreeOptions::default())
            .await
            .unwrap();

        assert!(repo.get_object(&folder.id).await.unwrap_err().is_not_found());
        assert!(repo.get_object(&doc.id).await.unwrap_err().is_not_found());
    }
}

// =============================================================================
// Validation (raised before dispatch)
// =============================================================================

mod validation {
    use super::*;

    #[tokio::test]
    async fn empty_name_never_reaches_the_transport() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();
        let before = mock.requests().len();

        let err = repo
            .create_document("", hello_txt(), &WriteOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CmisError::Validation(_)));
        assert_eq!(mock.requests().len(), before);
    }

    #[tokio::test]
    async fn blank_query_statement_is_rejected() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let err = repo
            .query("   ", &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CmisError::Validation(_)));
    }

    #[tokio::test]
    async fn bulk_update_requires_object_ids() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let err = repo
            .bulk_update_properties(&[], &PropertyBag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CmisError::Validation(_)));
    }
}

// =============================================================================
// Properties and query
// =============================================================================

mod properties {
    use super::*;

    #[tokio::test]
    async fn update_properties_and_clear_one() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let doc = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::default())
            .await
            .unwrap();

        let mut changes = PropertyBag::new();
        changes.insert(
            "cmis:description",
            PropertyValue::Single(Scalar::str("quarterly report")),
        );
        let updated = repo.update_properties(&doc.id, &changes).await.unwrap();
        assert_eq!(
            updated
                .properties
                .get("cmis:description")
                .and_then(|v| v.as_str()),
            Some("quarterly report")
        );

        // An empty multi clears the property.
        let mut clear = PropertyBag::new();
        clear.insert("cmis:description", PropertyValue::Multi(Vec::new()));
        let cleared = repo.update_properties(&doc.id, &clear).await.unwrap();
        assert!(cleared.properties.get("cmis:description").is_none());
    }

    #[tokio::test]
    async fn property_overrides_ride_along_on_create() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let mut options = WriteOptions::default();
        options.properties.insert(
            "cmis:description",
            PropertyValue::Single(Scalar::str("contract draft")),
        );
        options.properties.insert(
            "keywords",
            PropertyValue::Multi(vec![Scalar::str("legal"), Scalar::str("draft")]),
        );

        let doc = repo
            .create_document("c.txt", hello_txt(), &options)
            .await
            .unwrap();

        assert_eq!(
            doc.properties
                .get("cmis:description")
                .and_then(|v| v.as_str()),
            Some("contract draft")
        );
        match doc.properties.get("keywords").unwrap() {
            PropertyValue::Multi(elements) => assert_eq!(elements.len(), 2),
            other => panic!("expected multi value, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn query_filters_and_pages() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        for name in ["a.txt", "b.txt", "c.txt"] {
            repo.create_document(name, ContentStream::new(name, b"x".to_vec()), &WriteOptions::default())
                .await
                .unwrap();
        }

        let all = repo
            .query("SELECT * FROM cmis:document", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(all.objects.len(), 3);
        assert!(!all.has_more_items);
        assert_eq!(all.num_items, Some(3));

        let page = repo
            .query("SELECT * FROM cmis:document", &QueryOptions::page(2, 0))
            .await
            .unwrap();
        assert_eq!(page.objects.len(), 2);
        assert!(page.has_more_items);

        let filtered = repo
            .query(
                "SELECT * FROM cmis:document WHERE cmis:name = 'b.txt'",
                &QueryOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(filtered.objects.len(), 1);
        assert_eq!(filtered.objects[0].name(), Some("b.txt"));
    }

    #[tokio::test]
    async fn bulk_update_touches_every_object() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let mut ids: Vec<ObjectId> = Vec::new();
        for name in ["a.txt", "b.txt"] {
            let doc = repo
                .create_document(name, ContentStream::new(name, b"x".to_vec()), &WriteOptions::default())
                .await
                .unwrap();
            ids.push(doc.id);
        }

        let mut changes = PropertyBag::new();
        changes.insert(
            "cmis:description",
            PropertyValue::Single(Scalar::str("batch")),
        );
        let updated = repo.bulk_update_properties(&ids, &changes).await.unwrap();
        assert_eq!(updated.len(), 2);

        for id in &ids {
            let object = repo.get_object(id).await.unwrap();
            assert_eq!(
                object
                    .properties
                    .get("cmis:description")
                    .and_then(|v| v.as_str()),
                Some("batch")
            );
        }
    }
}

// =============================================================================
// ACL and type management
// =============================================================================

mod acl_and_types {
    use super::*;

    #[tokio::test]
    async fn apply_and_read_acl() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let doc = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::default())
            .await
            .unwrap();

        let changes = AclChanges::grant(vec![
            Ace::new("alice", vec!["cmis:read".into(), "cmis:write".into()]),
            Ace::new("bob", vec!["cmis:read".into()]),
        ]);
        let applied = repo.apply_acl(&doc.id, &changes).await.unwrap();
        assert_eq!(applied.aces.len(), 2);

        let acl = repo.get_acl(&doc.id).await.unwrap();
        assert_eq!(acl.aces[0].principal, "alice");
        assert_eq!(acl.aces[0].permissions, vec!["cmis:read", "cmis:write"]);

        // Removal leaves the other entry intact.
        let removal = AclChanges {
            add: Vec::new(),
            remove: vec![Ace::new("alice", Vec::new())],
        };
        let after = repo.apply_acl(&doc.id, &removal).await.unwrap();
        assert_eq!(after.aces.len(), 1);
        assert_eq!(after.aces[0].principal, "bob");
    }

    #[tokio::test]
    async fn empty_acl_changes_write_nothing() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let doc = repo
            .create_document("a.txt", hello_txt(), &WriteOptions::default())
            .await
            .unwrap();

        repo.apply_acl(&doc.id, &AclChanges::default()).await.unwrap();
        assert!(mock.requests_for_action("applyACL").is_empty());
    }

    #[tokio::test]
    async fn create_type_fills_required_defaults() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let created = repo
            .create_type(json!({
                "id": "custom:contract",
                "baseId": "cmis:document",
                "propertyDefinitions": {
                    "custom:counterparty": {
                        "id": "custom:counterparty",
                        "propertyType": "string",
                        "required": true,
                    },
                },
            }))
            .await
            .unwrap();

        let property = &created["propertyDefinitions"]["custom:counterparty"];
        // Caller-supplied values win; missing keys get the defaults.
        assert_eq!(property["required"], json!(true));
        assert_eq!(property["inherited"], json!(false));
        assert_eq!(property["openChoice"], json!(true));
        assert_eq!(property["queryable"], json!(true));
        assert_eq!(property["orderable"], json!(false));

        let fetched = repo
            .get_type_definition(&cmis_browser::core::types::TypeId::new("custom:contract").unwrap())
            .await
            .unwrap();
        assert_eq!(fetched["id"], json!("custom:contract"));
    }

    #[tokio::test]
    async fn create_type_without_id_is_rejected() {
        let mock = MockRepository::new();
        let session = connected_session(&mock).await;
        let repo = session.default_repository().unwrap();

        let err = repo.create_type(json!({ "baseId": "cmis:document" })).await.unwrap_err();
        assert!(matches!(err, CmisError::Validation(_)));
        assert!(mock.requests_for_action("createType").is_empty());
    }
}
