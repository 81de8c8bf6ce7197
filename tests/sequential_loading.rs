// tests/sequential_loading.rs
//! Sequential loading against the in-memory Anytype API.

mod common;

use anytype_loader::{
    AnytypeLoader, CollectingSink, Diagnostic, FetchOutcome, LoaderConfig, LoaderError, SpaceId,
};
use common::{
    fixture_ids, test_config, FakeAnytype, FakeConnector, OBJECT_OBJ_1, OBJECT_WITHOUT_MARKDOWN,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn loader(
    server: FakeAnytype,
    config: LoaderConfig,
) -> (AnytypeLoader, Arc<FakeConnector>, Arc<CollectingSink>) {
    let connector = FakeConnector::new(server);
    let sink = Arc::new(CollectingSink::new());
    let loader = AnytypeLoader::builder(config)
        .connector(connector.clone())
        .diagnostics(sink.clone())
        .build()
        .unwrap();
    (loader, connector, sink)
}

fn space(id: &str) -> SpaceId {
    SpaceId::new(id).unwrap()
}

#[test]
fn resolves_known_spaces() {
    let (loader, _, sink) = loader(FakeAnytype::new(), test_config(&["Personal", "Work"]));

    let ids: HashSet<String> = loader
        .space_ids()
        .into_iter()
        .map(SpaceId::into_string)
        .collect();
    assert_eq!(
        ids,
        HashSet::from(["space-1".to_string(), "space-2".to_string()])
    );
    assert_eq!(loader.space_name_map()[&space("space-1")], "Personal");
    assert_eq!(loader.space_name_map()[&space("space-2")], "Work");
    assert!(sink.is_empty());
}

#[test]
fn warns_once_for_unknown_spaces() {
    let (loader, _, sink) = loader(FakeAnytype::new(), test_config(&["Personal", "Travel"]));

    assert_eq!(loader.space_ids(), vec![space("space-1")]);
    let diagnostics = sink.snapshot();
    assert_eq!(
        diagnostics,
        vec![Diagnostic::UnknownSpaces {
            names: vec!["Travel".to_string()]
        }]
    );
    assert_eq!(diagnostics[0].to_string(), "Skipping unknown spaces: Travel");
}

#[test]
fn unresolvable_spaces_fail_construction() {
    let result = AnytypeLoader::builder(test_config(&["Travel"]))
        .connector(FakeConnector::new(FakeAnytype::new()))
        .diagnostics(Arc::new(CollectingSink::new()))
        .build();

    assert!(matches!(result, Err(LoaderError::Configuration(_))));
}

#[test]
fn rejected_key_fails_construction() {
    let server = FakeAnytype::new().with_spaces_response(401, r#"{"message": "invalid token"}"#);
    let result = AnytypeLoader::builder(test_config(&["Personal"]))
        .connector(FakeConnector::new(server))
        .build();

    match result {
        Err(LoaderError::Authentication { status, detail, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(detail, "invalid token");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[test]
fn fixture_object_becomes_a_record() {
    let server = FakeAnytype::new()
        .with_objects("space-1", ["obj-1"])
        .with_detail("obj-1", &[(200, OBJECT_OBJ_1)]);
    let (loader, _, _) = loader(server, test_config(&["Personal"]));

    let records = loader.load().unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].content.starts_with("# Doc 1"));
    assert_eq!(
        serde_json::to_value(&records[0].metadata).unwrap(),
        json!({
            "space_id": "space-1",
            "space_name": "Personal",
            "object_id": "obj-1",
            "id": "obj-1",
            "name": "Doc 1 - Availability",
            "archived": false,
            "type": "Page",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "last_opened_at": "2024-01-03T00:00:00Z",
            "tags": ["alpha"],
            "description": "Desc 1",
        })
    );
}

#[test]
fn pages_through_every_object_in_order() {
    let server = FakeAnytype::new().with_objects("space-1", fixture_ids());
    let config = test_config(&["Personal"]).with_page_size(3).unwrap();
    let (loader, connector, _) = loader(server, config);

    let loaded: Vec<String> = loader
        .load()
        .unwrap()
        .into_iter()
        .map(|record| record.metadata.object_id.into_string())
        .collect();

    assert_eq!(loaded, fixture_ids());
    assert_eq!(
        connector.server.listing_offsets(),
        vec![
            ("space-1".to_string(), 0),
            ("space-1".to_string(), 3),
            ("space-1".to_string(), 6),
            ("space-1".to_string(), 9),
        ]
    );
}

#[test]
fn object_ids_follow_pagination() {
    let server = FakeAnytype::new().with_objects("space-1", ["obj-1", "obj-2", "obj-3"]);
    let config = test_config(&["Personal"]).with_page_size(2).unwrap();
    let (loader, connector, _) = loader(server, config);

    let ids: Vec<String> = loader
        .object_ids(&space("space-1"))
        .unwrap()
        .map(|id| id.unwrap().into_string())
        .collect();

    assert_eq!(ids, vec!["obj-1", "obj-2", "obj-3"]);
    assert_eq!(
        connector.server.listing_offsets(),
        vec![("space-1".to_string(), 0), ("space-1".to_string(), 2)]
    );
}

#[test]
fn empty_space_reports_no_objects() {
    let (loader, _, sink) = loader(FakeAnytype::new(), test_config(&["Personal"]));

    assert!(loader.load().unwrap().is_empty());
    assert_eq!(
        sink.snapshot(),
        vec![Diagnostic::NoObjects {
            space_id: space("space-1")
        }]
    );
}

#[test]
fn query_switches_to_search() {
    let server = FakeAnytype::new().with_objects("space-1", ["obj-1"]);
    let config = test_config(&["Personal"]).with_query("availability");
    let (loader, connector, _) = loader(server, config);

    assert_eq!(loader.load().unwrap().len(), 1);

    let listing = &connector.server.requests()[1];
    assert_eq!(listing.method, reqwest::Method::POST);
    assert_eq!(listing.url, "http://anytype.test/v1/spaces/space-1/search");
    assert_eq!(listing.body, Some(json!({"query": "availability"})));
}

#[test]
fn objects_without_markdown_are_skipped() {
    let server = FakeAnytype::new()
        .with_objects("space-1", ["obj-1", "obj-empty", "obj-3"])
        .with_detail("obj-empty", &[(200, OBJECT_WITHOUT_MARKDOWN)]);
    let (loader, _, sink) = loader(server, test_config(&["Personal"]));

    let loaded: Vec<String> = loader
        .load()
        .unwrap()
        .into_iter()
        .map(|record| record.metadata.object_id.into_string())
        .collect();

    assert_eq!(loaded, vec!["obj-1", "obj-3"]);
    assert_eq!(
        sink.snapshot(),
        vec![Diagnostic::MissingMarkdown {
            object_id: anytype_loader::ObjectId::new("obj-empty").unwrap()
        }]
    );
}

#[test]
fn malformed_object_fails_only_that_object() {
    let server = FakeAnytype::new()
        .with_objects("space-1", ["obj-1", "obj-2", "obj-3"])
        .with_detail("obj-2", &[(200, r#"{"data": "not an object"}"#)]);
    let (loader, _, _) = loader(server, test_config(&["Personal"]));

    let results: Vec<_> = loader.lazy_load().unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(LoaderError::MalformedResponse { .. })
    ));
    assert!(results[2].is_ok());

    assert!(matches!(
        loader.load(),
        Err(LoaderError::MalformedResponse { .. })
    ));
}

#[test]
fn rate_limited_object_is_retried() {
    let server = FakeAnytype::new()
        .with_objects("space-1", ["obj-1"])
        .with_detail(
            "obj-1",
            &[(429, r#"{"message": "slow down"}"#), (200, OBJECT_OBJ_1)],
        );
    let (loader, connector, sink) = loader(server, test_config(&["Personal"]));

    let records = loader.load().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(connector.server.detail_requests(), 2);
    assert!(matches!(
        sink.snapshot().as_slice(),
        [Diagnostic::RetryScheduled {
            status: 429,
            attempt: 1,
            ..
        }]
    ));
}

#[test]
fn rejected_key_on_an_object_ends_the_run() {
    let server = (1..=20).fold(
        FakeAnytype::new().with_generated("space-1", "doc", 20),
        |server, i| {
            server.with_detail(&format!("doc-{i}"), &[(401, r#"{"message": "revoked"}"#)])
        },
    );
    let (loader, connector, _) = loader(server, test_config(&["Personal"]));

    let results: Vec<_> = loader.lazy_load().unwrap().collect();

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(LoaderError::Authentication { status: 401, .. })
    ));
    assert_eq!(connector.server.detail_requests(), 1);
}

#[test]
fn outcomes_expose_skips_and_failures() {
    let server = FakeAnytype::new()
        .with_objects("space-1", ["obj-1", "obj-empty", "obj-gone"])
        .with_detail("obj-empty", &[(200, OBJECT_WITHOUT_MARKDOWN)])
        .with_detail("obj-gone", &[(404, r#"{"error": "object not found"}"#)]);
    let (loader, _, _) = loader(server, test_config(&["Personal"]));

    let kinds: Vec<&str> = loader
        .lazy_outcomes()
        .unwrap()
        .map(|outcome| match outcome {
            FetchOutcome::Emitted(_) => "emitted",
            FetchOutcome::Skipped { .. } => "skipped",
            FetchOutcome::Failed { error, .. } => {
                assert_eq!(error.status(), Some(404));
                "failed"
            }
        })
        .collect();

    assert_eq!(kinds, vec!["emitted", "skipped", "failed"]);
}
