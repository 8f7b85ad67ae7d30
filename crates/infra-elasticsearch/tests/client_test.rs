//! ElasticsearchClient against a local stand-in cluster

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ecommerce_search_core::domain::{IndexName, SearchRequest};
use ecommerce_search_core::port::{SearchBackend, SearchError};
use ecommerce_search_infra_elasticsearch::{
    ConnectError, ElasticsearchClient, ElasticsearchSettings,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct MockCluster {
    status: StatusCode,
    response: Value,
    seen_auth: Arc<Mutex<Option<String>>>,
    seen_index: Arc<Mutex<Option<String>>>,
    seen_body: Arc<Mutex<Option<Value>>>,
}

impl MockCluster {
    fn new(status: StatusCode, response: Value) -> Self {
        Self {
            status,
            response,
            seen_auth: Arc::new(Mutex::new(None)),
            seen_index: Arc::new(Mutex::new(None)),
            seen_body: Arc::new(Mutex::new(None)),
        }
    }
}

async fn search_handler(
    State(cluster): State<MockCluster>,
    Path(index): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *cluster.seen_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *cluster.seen_index.lock().unwrap() = Some(index);
    *cluster.seen_body.lock().unwrap() = Some(body);
    (cluster.status, Json(cluster.response.clone()))
}

/// Start the stand-in cluster and return its base URL
async fn spawn_cluster(cluster: MockCluster) -> String {
    let app = Router::new()
        .route("/", get(|| async { StatusCode::OK }))
        .route("/{index}/_search", post(search_handler))
        .with_state(cluster);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn settings(hosts: &str, api_key: Option<(&str, &str)>) -> ElasticsearchSettings {
    ElasticsearchSettings::from_parts(
        Some(hosts),
        api_key.map(|(id, _)| id),
        api_key.map(|(_, secret)| secret),
        Some("elastic"),
        Some("changeme"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_connect_fails_when_ping_fails() {
    // Port 1 is never served in the test environment
    let result = ElasticsearchClient::connect(settings("127.0.0.1:1", None), false).await;

    match result {
        Err(ConnectError::PingFailed { hosts }) => {
            assert_eq!(hosts, vec!["http://127.0.0.1:1".to_string()]);
        }
        Err(other) => panic!("expected ping failure, got {other}"),
        Ok(_) => panic!("expected ping failure, got a client"),
    }
}

#[tokio::test]
async fn test_search_returns_hits_with_api_key() {
    let cluster = MockCluster::new(
        StatusCode::OK,
        json!({
            "took": 3,
            "hits": {
                "total": {"value": 3, "relation": "eq"},
                "hits": [
                    {"_id": "a", "_source": {"customer_full_name": "Eddie Underwood"}},
                    {"_id": "b", "_source": {"customer_full_name": "Mary Bailey"}},
                    {"_id": "c", "_source": {"customer_full_name": "Gwen Butler"}}
                ]
            }
        }),
    );
    let base = spawn_cluster(cluster.clone()).await;

    let client = ElasticsearchClient::connect(settings(&base, Some(("key-id", "key-secret"))), false)
        .await
        .unwrap();
    let body = SearchRequest::new("eddie").to_body();
    let hits = client.search(&IndexName::default(), &body).await.unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0]["_id"], "a");
    // base64("key-id:key-secret")
    assert_eq!(
        cluster.seen_auth.lock().unwrap().as_deref(),
        Some("ApiKey a2V5LWlkOmtleS1zZWNyZXQ=")
    );
    assert_eq!(
        cluster.seen_index.lock().unwrap().as_deref(),
        Some("kibana_sample_data_ecommerce")
    );
    assert_eq!(cluster.seen_body.lock().unwrap().clone(), Some(body));
}

#[tokio::test]
async fn test_search_uses_basic_auth_without_api_key() {
    let cluster = MockCluster::new(StatusCode::OK, json!({"hits": {"hits": []}}));
    let base = spawn_cluster(cluster.clone()).await;

    let client = ElasticsearchClient::connect(settings(&base, None), false)
        .await
        .unwrap();
    let hits = client
        .search(&IndexName::default(), &SearchRequest::new("x").to_body())
        .await
        .unwrap();

    assert!(hits.is_empty());
    // base64("elastic:changeme")
    assert_eq!(
        cluster.seen_auth.lock().unwrap().as_deref(),
        Some("Basic ZWxhc3RpYzpjaGFuZ2VtZQ==")
    );
}

#[tokio::test]
async fn test_missing_index_is_typed() {
    let cluster = MockCluster::new(
        StatusCode::NOT_FOUND,
        json!({
            "error": {"type": "index_not_found_exception", "reason": "no such index [orders]"},
            "status": 404
        }),
    );
    let base = spawn_cluster(cluster).await;

    let client = ElasticsearchClient::connect(settings(&base, None), false)
        .await
        .unwrap();
    let err = client
        .search(
            &IndexName::parse("orders").unwrap(),
            &SearchRequest::new("x").to_body(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::IndexNotFound { index, .. } if index == "orders"));
}

#[tokio::test]
async fn test_security_exception_is_typed() {
    let cluster = MockCluster::new(
        StatusCode::FORBIDDEN,
        json!({
            "error": {"type": "security_exception", "reason": "action is unauthorized"},
            "status": 403
        }),
    );
    let base = spawn_cluster(cluster).await;

    let client = ElasticsearchClient::connect(settings(&base, None), false)
        .await
        .unwrap();
    let err = client
        .search(&IndexName::default(), &SearchRequest::new("x").to_body())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SearchError::Authentication("action is unauthorized".to_string())
    );
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let client = ElasticsearchClient::new(settings("127.0.0.1:1", None), false).unwrap();

    let err = client
        .search(&IndexName::default(), &SearchRequest::new("x").to_body())
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Connection(_)));
}

#[tokio::test]
async fn test_cross_cluster_index_reaches_configured_host() {
    let cluster = MockCluster::new(StatusCode::OK, json!({"hits": {"hits": []}}));
    let base = spawn_cluster(cluster.clone()).await;

    let client = ElasticsearchClient::connect(settings(&base, None), false)
        .await
        .unwrap();
    client
        .search(
            &IndexName::parse("remote:orders").unwrap(),
            &SearchRequest::new("x").to_body(),
        )
        .await
        .unwrap();

    assert_eq!(
        cluster.seen_index.lock().unwrap().as_deref(),
        Some("remote:orders")
    );
}
