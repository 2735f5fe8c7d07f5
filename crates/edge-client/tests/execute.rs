use dql::{ContainerReport, DocumentService, EdgeError, Filters, HttpProbe, ListOptions, SortSpec};
use edge_client::{ClientConfig, EdgeClient};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn object(v: Value) -> serde_json::Map<String, Value> {
    match v {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn client_for(server: &MockServer) -> EdgeClient {
    EdgeClient::new(ClientConfig::new(server.uri(), "exampledb")).unwrap()
}

/// A client pointed at a local port nothing listens on.
fn unreachable_client() -> EdgeClient {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    EdgeClient::new(ClientConfig::new(format!("http://127.0.0.1:{port}"), "exampledb")).unwrap()
}

#[tokio::test]
async fn create_document_posts_parameterized_insert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exampledb/execute"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "query": "INSERT INTO greetings DOCUMENTS (:doc)",
            "query_args": {"doc": {"hello": "world"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mutatedDocumentIds": ["a1"]})))
        .expect(1)
        .mount(&server)
        .await;

    let out = client_for(&server)
        .create_document("greetings", object(json!({"hello": "world"})))
        .await
        .unwrap();
    assert_eq!(out, json!({"mutatedDocumentIds": ["a1"]}));
}

#[tokio::test]
async fn get_records_sends_no_query_args() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exampledb/execute"))
        .and(body_json(json!({"query": "SELECT * FROM greetings ORDER BY _id DESC LIMIT 10"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let options = ListOptions::new().limit(10).sort(SortSpec::desc("_id"));
    let out = client_for(&server).get_records("greetings", &options).await.unwrap();
    assert_eq!(out["items"], json!([]));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exampledb/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        EdgeClient::new(ClientConfig::new(format!("{}/", server.uri()), "exampledb")).unwrap();
    client.get_records("c", &ListOptions::new()).await.unwrap();
}

#[tokio::test]
async fn get_update_and_delete_statements() {
    let server = MockServer::start().await;
    Mock::given(body_json(json!({
        "query": "SELECT * FROM users WHERE _id == :id LIMIT 1",
        "query_args": {"id": "u1"}
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"_id": "u1"}]})))
    .expect(1)
    .mount(&server)
    .await;
    Mock::given(body_json(json!({
        "query": "UPDATE users SET age = :p_age WHERE _id == :id",
        "query_args": {"id": "u1", "p_age": 31}
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mutatedDocumentIds": ["u1"]})))
    .expect(1)
    .mount(&server)
    .await;
    Mock::given(body_json(json!({
        "query": "DELETE FROM users WHERE _id = :id",
        "query_args": {"id": "u1"}
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .expect(1)
    .mount(&server)
    .await;
    Mock::given(body_json(json!({
        "query": "DELETE FROM users WHERE _id LIKE :pattern",
        "query_args": {"pattern": "%"}
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .expect(1)
    .mount(&server)
    .await;

    let client = client_for(&server);
    let got = client.get_record("users", "u1").await.unwrap();
    assert_eq!(got["items"][0]["_id"], "u1");
    client
        .update_record("users", "u1", object(json!({"age": 31})))
        .await
        .unwrap();
    client.delete_record("users", "u1").await.unwrap();
    client.delete_all_records("users").await.unwrap();
}

#[tokio::test]
async fn latest_record_and_search() {
    let server = MockServer::start().await;
    Mock::given(body_json(json!({"query": "SELECT * FROM chat ORDER BY createdAt DESC LIMIT 1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(body_json(json!({
        "query": "SELECT * FROM users WHERE city == \"Paris\" AND name == \"Alice\" LIMIT 5"
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
    .expect(1)
    .mount(&server)
    .await;

    let client = client_for(&server);
    client.latest_record("chat", "createdAt").await.unwrap();

    let filters = Filters::from([
        ("name".to_string(), "Alice".to_string()),
        ("city".to_string(), "Paris".to_string()),
    ]);
    client
        .search("users", &filters, &ListOptions::new().limit(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn validation_errors_skip_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .update_record("users", "u1", serde_json::Map::new())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "patch is empty");

    assert!(client.create_document("", serde_json::Map::new()).await.unwrap_err().is_validation());
    assert!(client.delete_all_records("").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn non_success_status_carries_truncated_excerpts() {
    let server = MockServer::start().await;
    let long_body = "x".repeat(600);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string(format!("  {long_body}\n")))
        .mount(&server)
        .await;

    let filters = Filters::from([("name".to_string(), "y".repeat(300))]);
    let err = client_for(&server)
        .search("users", &filters, &ListOptions::new())
        .await
        .unwrap_err();

    match &err {
        EdgeError::Http { status, body, query } => {
            assert_eq!(*status, 503);
            assert_eq!(body.len(), 256 + 3);
            assert!(body.ends_with("..."));
            assert_eq!(query.chars().count(), 200 + 3);
            assert!(query.starts_with("SELECT * FROM users WHERE name == \"yyy"));
        }
        other => panic!("expected http error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("ditto http 503: xxx"));
}

#[tokio::test]
async fn short_error_bodies_are_kept_whole() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"error\":\"bad dql\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_records("users", &ListOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.to_string(),
        "ditto http 400: {\"error\":\"bad dql\"} | query: SELECT * FROM users"
    );
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_records("users", &ListOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EdgeError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let client = unreachable_client();

    let err = client
        .get_records("users", &ListOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EdgeError::Transport { .. }), "got {err:?}");
}

#[tokio::test]
async fn status_probes_the_server_without_a_runner() {
    let server = MockServer::start().await;
    Mock::given(body_json(json!({"query": "SELECT * FROM chat LIMIT 1"})))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = client_for(&server).status().await.unwrap();
    assert_eq!(report.app_id, "exampledb");
    assert_eq!(report.container, ContainerReport::Disabled);
    assert_eq!(
        report.http,
        HttpProbe::Reachable {
            status: "404 Not Found".to_string()
        }
    );
}

#[tokio::test]
async fn status_records_unreachable_server() {
    let client = unreachable_client();

    let report = client.status().await.unwrap();
    assert!(!report.http.is_reachable());
    assert!(matches!(report.http, HttpProbe::Unreachable { ref error } if !error.is_empty()));
}
