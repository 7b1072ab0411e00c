//! End-to-end tests for the tool pipeline against a local upstream.
//!
//! Each test starts its own upstream on an ephemeral port and dispatches
//! through [`ToolRegistry`], so validation, encoding, the HTTP call, and
//! sanitization all run for real.

mod common;

use common::{args, MockUpstream, TEST_KEY};
use insights_mcp::tools::{ToolRegistry, GET_AUDIENCE_BY_TYPE, GET_AUDIENCE_TYPES, GET_INSIGHTS};
use serde_json::{json, Map};
use std::time::Duration;

const ENTITIES_BODY: &str = r#"{
  "success": true,
  "results": {
    "entities": [
      {
        "name": "Arrival",
        "entity_id": "E1",
        "type": "urn:entity",
        "subtype": "urn:entity:movie",
        "popularity": 0.97,
        "tags": [{"id": "urn:tag:genre:media:drama"}],
        "external": {"imdb": [{"id": "tt2543164"}]},
        "properties": {
          "release_year": 2016,
          "content_rating": "PG-13",
          "akas": [{"value": "La llegada"}],
          "duration": 116,
          "description": "Linguist meets heptapods."
        }
      }
    ]
  }
}"#;

const AUDIENCES_BODY: &str = r#"{
  "results": {
    "audiences": [
      {
        "entity_id": "A1",
        "parents": ["urn:audience:movie"],
        "type": "urn:audience",
        "id": "urn:audience:movie:cinephiles",
        "disambiguation": "film",
        "tags": [],
        "name": "Cinephiles"
      }
    ]
  }
}"#;

const AUDIENCE_TYPES_BODY: &str = r#"{
  "results": {
    "audience_types": [
      {"id": "urn:audience:communities", "name": "Communities", "parents": []},
      {"id": "urn:audience:hobbies", "name": "Hobbies", "parents": ["x"]}
    ]
  }
}"#;

// ─── Audience by type ────────────────────────────────────────────────

#[tokio::test]
async fn test_audience_by_type_rejects_non_urn_without_request() {
    let upstream = MockUpstream::start(200, AUDIENCES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_AUDIENCE_BY_TYPE,
            &args(json!({"parent_type": "not-a-urn"})),
            &upstream.ctx(Some(TEST_KEY)),
        )
        .await;

    assert!(!env.ok);
    assert_eq!(
        env.error.as_deref(),
        Some("parent type must start with 'urn:audience:'")
    );
    assert!(upstream.hits().is_empty(), "no request should be sent");
}

#[tokio::test]
async fn test_audience_by_type_strips_record() {
    let upstream = MockUpstream::start(200, AUDIENCES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_AUDIENCE_BY_TYPE,
            &args(json!({"parent_type": "urn:audience:movie"})),
            &upstream.ctx(Some(TEST_KEY)),
        )
        .await;

    assert!(env.ok, "unexpected failure: {:?}", env.error);
    assert!(env.error.is_none());
    assert_eq!(
        env.data.unwrap(),
        json!({"results": {"audiences": [{"name": "Cinephiles"}]}})
    );

    let hits = upstream.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/v2/audiences");
    assert_eq!(
        hits[0].query.as_deref(),
        Some("filter.parents.types=urn%3Aaudience%3Amovie")
    );
    assert_eq!(hits[0].api_key.as_deref(), Some(TEST_KEY));
    assert_eq!(hits[0].accept.as_deref(), Some("application/json"));
}

// ─── Audience types ──────────────────────────────────────────────────

#[tokio::test]
async fn test_audience_types_drops_parents() {
    let upstream = MockUpstream::start(200, AUDIENCE_TYPES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(GET_AUDIENCE_TYPES, &Map::new(), &upstream.ctx(Some(TEST_KEY)))
        .await;

    assert!(env.ok);
    assert_eq!(
        env.data.unwrap(),
        json!({
            "results": {
                "audience_types": [
                    {"id": "urn:audience:communities", "name": "Communities"},
                    {"id": "urn:audience:hobbies", "name": "Hobbies"}
                ]
            }
        })
    );

    let hits = upstream.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/v2/audiences/types");
    assert!(hits[0].query.is_none());
}

// ─── Insights ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_insights_encodes_and_sanitizes() {
    let upstream = MockUpstream::start(200, ENTITIES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_INSIGHTS,
            &args(json!({
                "payload": {
                    "filter.type": "urn:entity:movie",
                    "filter.location.query": "New York",
                    "filter.release_year.min": 2000,
                    "filter.tags": ["urn:tag:genre:media:drama", "urn:tag:genre:media:sci_fi"],
                    "filter.content_rating": null
                }
            })),
            &upstream.ctx(Some(TEST_KEY)),
        )
        .await;

    assert!(env.ok, "unexpected failure: {:?}", env.error);
    assert_eq!(
        env.data.unwrap(),
        json!({
            "success": true,
            "results": {
                "entities": [{
                    "name": "Arrival",
                    "properties": {
                        "duration": 116,
                        "description": "Linguist meets heptapods."
                    }
                }]
            }
        })
    );

    let hits = upstream.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/v2/insights");
    assert_eq!(
        hits[0].query.as_deref(),
        Some(
            "filter.type=urn%3Aentity%3Amovie\
             &filter.location.query=New%20York\
             &filter.release_year.min=2000\
             &filter.tags=urn%3Atag%3Agenre%3Amedia%3Adrama,urn%3Atag%3Agenre%3Amedia%3Asci_fi\
             &take=10"
        )
    );
}

#[tokio::test]
async fn test_insights_accepts_json_text_and_entity_type() {
    let upstream = MockUpstream::start(200, ENTITIES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_INSIGHTS,
            &args(json!({
                "entity_type": "urn:entity:book",
                "payload": "{\"filter.type\": \"urn:entity:movie\", \"take\": 3}"
            })),
            &upstream.ctx(Some(TEST_KEY)),
        )
        .await;

    assert!(env.ok, "unexpected failure: {:?}", env.error);
    let hits = upstream.hits();
    assert_eq!(
        hits[0].query.as_deref(),
        Some("filter.type=urn%3Aentity%3Abook&take=3")
    );
}

#[tokio::test]
async fn test_insights_invalid_json_payload() {
    let upstream = MockUpstream::start(200, ENTITIES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_INSIGHTS,
            &args(json!({"payload": "{broken"})),
            &upstream.ctx(Some(TEST_KEY)),
        )
        .await;

    assert!(!env.ok);
    assert!(env.error.unwrap().starts_with("payload is not valid JSON"));
    assert!(upstream.hits().is_empty());
}

#[tokio::test]
async fn test_insights_non_string_entity_type_rejected() {
    let upstream = MockUpstream::start(200, ENTITIES_BODY).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_INSIGHTS,
            &args(json!({
                "payload": {"filter.type": "urn:entity:movie"},
                "entity_type": 42
            })),
            &upstream.ctx(Some(TEST_KEY)),
        )
        .await;

    assert!(!env.ok);
    assert_eq!(
        env.error.as_deref(),
        Some("payload must contain 'filter.type' starting with 'urn:entity:'")
    );
    assert!(upstream.hits().is_empty());
}

// ─── Credential ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let upstream = MockUpstream::start(200, ENTITIES_BODY).await;
    let registry = ToolRegistry::with_builtins();
    let ctx = upstream.ctx(None);

    let calls = [
        (
            GET_INSIGHTS,
            json!({"payload": {"filter.type": "urn:entity:movie"}}),
        ),
        (GET_AUDIENCE_TYPES, json!({})),
        (GET_AUDIENCE_BY_TYPE, json!({"parent_type": "urn:audience:movie"})),
    ];

    for (name, call_args) in calls {
        let env = registry.dispatch(name, &args(call_args), &ctx).await;
        assert!(!env.ok, "{} should fail", name);
        assert_eq!(env.error.as_deref(), Some("credential required"));
        assert!(env.status_code.is_none());
    }

    assert_eq!(upstream.hits().len(), 0);
}

// ─── Upstream failures ───────────────────────────────────────────────

#[tokio::test]
async fn test_non_200_returns_status_and_raw_body() {
    let upstream = MockUpstream::start(401, "{\"error\":\"bad key\"}").await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(GET_AUDIENCE_TYPES, &Map::new(), &upstream.ctx(Some(TEST_KEY)))
        .await;

    assert!(!env.ok);
    assert_eq!(env.status_code, Some(401));
    assert_eq!(env.error.as_deref(), Some("{\"error\":\"bad key\"}"));
    assert!(env.data.is_none());
}

#[tokio::test]
async fn test_non_json_200_is_invalid_upstream_response() {
    let upstream = MockUpstream::start(200, "<html>maintenance</html>").await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(GET_AUDIENCE_TYPES, &Map::new(), &upstream.ctx(Some(TEST_KEY)))
        .await;

    assert!(!env.ok);
    assert!(env
        .error
        .unwrap()
        .starts_with("invalid JSON response from upstream"));
    assert!(env.status_code.is_none());
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let upstream =
        MockUpstream::start_with_delay(200, AUDIENCE_TYPES_BODY, Duration::from_secs(3)).await;
    let registry = ToolRegistry::with_builtins();

    let env = registry
        .dispatch(
            GET_AUDIENCE_TYPES,
            &Map::new(),
            &upstream.ctx_with_timeout(Some(TEST_KEY), Duration::from_millis(200)),
        )
        .await;

    assert!(!env.ok);
    assert!(env.error.unwrap().starts_with("network error: "));
    assert_eq!(upstream.hits().len(), 1, "the request itself was sent once");
}

#[tokio::test]
async fn test_aborted_call_stops_waiting_on_upstream() {
    let upstream =
        MockUpstream::start_with_delay(200, AUDIENCE_TYPES_BODY, Duration::from_secs(3)).await;
    let registry = std::sync::Arc::new(ToolRegistry::with_builtins());
    let ctx = upstream.ctx(Some(TEST_KEY));

    let started = std::time::Instant::now();
    let handle = tokio::spawn(async move {
        registry
            .dispatch(GET_AUDIENCE_TYPES, &Map::new(), &ctx)
            .await
    });

    // Wait until the request is in flight before aborting.
    while upstream.hits().is_empty() {
        assert!(started.elapsed() < Duration::from_secs(2), "request never arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    let err = handle.await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(upstream.hits().len(), 1);
}

// ─── Concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let upstream = MockUpstream::start(200, AUDIENCES_BODY).await;
    let registry = std::sync::Arc::new(ToolRegistry::with_builtins());
    let ctx = upstream.ctx(Some(TEST_KEY));

    let mut handles = Vec::new();
    for i in 0..8 {
        let registry = registry.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            let parent = format!("urn:audience:kind{}", i);
            registry
                .dispatch(
                    GET_AUDIENCE_BY_TYPE,
                    &args(json!({"parent_type": parent})),
                    &ctx,
                )
                .await
        }));
    }

    for handle in handles {
        let env = handle.await.unwrap();
        assert!(env.ok);
    }

    let mut queries: Vec<String> = upstream
        .hits()
        .into_iter()
        .filter_map(|h| h.query)
        .collect();
    queries.sort();
    assert_eq!(queries.len(), 8);
    assert_eq!(queries[0], "filter.parents.types=urn%3Aaudience%3Akind0");
}
