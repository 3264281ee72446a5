use std::{collections::HashMap, sync::Arc, time::Duration};

use super::*;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
    queries: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

impl ServerState {
    async fn record_body(&self, route: &str, body: Value) {
        self.bodies.lock().await.push((route.to_string(), body));
    }

    async fn record_query(&self, route: &str, query: HashMap<String, String>) {
        self.queries.lock().await.push((route.to_string(), query));
    }
}

fn detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn get_story(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record_query("GET /story", query.clone()).await;
    let bucket = query.get("bucket").cloned().unwrap_or_default();
    let key = query.get("object_key").cloned().unwrap_or_default();
    if key == "missing.txt" {
        return detail(
            StatusCode::NOT_FOUND,
            &format!("Object '{key}' not found in bucket '{bucket}'"),
        );
    }
    Json(json!({ "content": format!("{bucket}/{key}") })).into_response()
}

async fn post_story(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    state.record_body("POST /story", body.clone()).await;
    Json(json!({ "message": "Story uploaded successfully", "path": body["filepath"] }))
        .into_response()
}

async fn generate(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record_query("GET /generate", query.clone()).await;
    if query.get("novel_name").map(String::as_str) == Some("broken") {
        return detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Forecaster chain failed: throttled",
        );
    }
    Json(json!({
        "forecaster_response": "the orcs regroup",
        "story_continuation": "And the horns sounded."
    }))
    .into_response()
}

async fn similar_entities(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record_query("GET /similar_entities", query).await;
    Json(json!({
        "entities": [
            {"content": "Balasar: chieftain", "metadata": {"entity": "Balasar"}, "distance": 0.12},
            {"content": "Javok: greatsword", "metadata": {}, "distance": null}
        ]
    }))
    .into_response()
}

async fn post_entity(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    state.record_body("POST /entity", body).await;
    Json(json!({ "message": "Entity added successfully", "id": "Balasar-1.5" })).into_response()
}

async fn mine_entities(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    state.record_body("POST /mine_entities", body.clone()).await;
    match body["novel_name"].as_str().unwrap_or_default() {
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "message": "late", "result": {} })).into_response()
        }
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        "gateway" => detail(StatusCode::GATEWAY_TIMEOUT, "Endpoint request timed out"),
        _ => Json(json!({
            "message": "Entity mining completed",
            "result": {"status": "success", "num_mined_entities": 4}
        }))
        .into_response(),
    }
}

async fn templates(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("template_type").map(String::as_str) != Some("forecaster") {
        return detail(StatusCode::NOT_FOUND, "Template not found");
    }
    Json(json!({
        "novel_name": query.get("novel_name"),
        "template_type": "forecaster",
        "prompt_template": "Predict: {current_story_fragment}",
        "date": "27-11-2025",
        "version": "0.1"
    }))
    .into_response()
}

async fn spawn_api_server() -> anyhow::Result<(String, ServerState)> {
    let state = ServerState::default();
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/story", get(get_story).post(post_story))
        .route("/api/generate", get(generate))
        .route("/api/similar_entities", get(similar_entities))
        .route("/api/entity", post(post_entity))
        .route("/api/mine_entities", post(mine_entities))
        .route("/api/templates", get(templates))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), state))
}

#[test]
fn base_url_gains_trailing_slash_so_endpoints_stay_under_api() {
    let client = NovelWriterClient::new("http://localhost:8000/api").expect("client");
    assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/");
    assert_eq!(
        client.endpoint("story").expect("endpoint").as_str(),
        "http://localhost:8000/api/story"
    );
}

#[test]
fn rejects_unparseable_base_url() {
    let err = NovelWriterClient::new("not a url").expect_err("invalid url");
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn upload_story_posts_text_filepath_and_bucket_name() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let ack = client
        .upload_story(&StoryUploadRequest {
            text: "Chapter 1".to_string(),
            filepath: StoryKey::from("temp/story-42.txt"),
            bucket_name: BucketName::from("novels"),
        })
        .await
        .expect("upload");

    assert_eq!(ack.path, Some(StoryKey::from("temp/story-42.txt")));
    let bodies = state.bodies.lock().await;
    assert_eq!(
        bodies[0],
        (
            "POST /story".to_string(),
            json!({"text": "Chapter 1", "filepath": "temp/story-42.txt", "bucket_name": "novels"})
        )
    );
}

#[tokio::test]
async fn upload_story_without_bucket_fails_before_any_request() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let err = client
        .upload_story(&StoryUploadRequest {
            text: "Chapter 1".to_string(),
            filepath: StoryKey::from("temp/story-42.txt"),
            bucket_name: BucketName::from(""),
        })
        .await
        .expect_err("missing bucket");

    assert_eq!(err, ClientError::Validation("bucket name is required".to_string()));
    assert!(state.bodies.lock().await.is_empty());
}

#[tokio::test]
async fn fetch_story_sends_bucket_and_object_key() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let story = client
        .fetch_story(&BucketName::from("novels"), &StoryKey::from("abs/prologue.txt"))
        .await
        .expect("fetch");

    assert_eq!(story.content, "novels/abs/prologue.txt");
    let queries = state.queries.lock().await;
    assert_eq!(queries[0].1.get("object_key").map(String::as_str), Some("abs/prologue.txt"));
}

#[tokio::test]
async fn fetch_story_not_found_carries_server_detail() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let err = client
        .fetch_story(&BucketName::from("novels"), &StoryKey::from("missing.txt"))
        .await
        .expect_err("not found");

    assert_eq!(err.status(), Some(404));
    assert_eq!(
        err.detail(),
        Some("Object 'missing.txt' not found in bucket 'novels'")
    );
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn generate_passes_story_key_and_novel_name() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let response = client
        .generate(&GenerateQuery {
            bucket: BucketName::from("novels"),
            story_key: StoryKey::from("temp/story-7.txt"),
            novel_name: "first novel".to_string(),
        })
        .await
        .expect("generate");

    assert_eq!(response.story_continuation, "And the horns sounded.");
    assert_eq!(response.forecaster_response.as_deref(), Some("the orcs regroup"));
    let queries = state.queries.lock().await;
    let query = &queries[0].1;
    assert_eq!(query.get("story_key").map(String::as_str), Some("temp/story-7.txt"));
    assert_eq!(query.get("novel_name").map(String::as_str), Some("first novel"));
}

#[tokio::test]
async fn generate_upstream_failure_prefers_detail_in_user_message() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let err = client
        .generate(&GenerateQuery {
            bucket: BucketName::from("novels"),
            story_key: StoryKey::from("temp/story-7.txt"),
            novel_name: "broken".to_string(),
        })
        .await
        .expect_err("upstream failure");

    assert_eq!(err.user_message(), "Forecaster chain failed: throttled");
}

#[tokio::test]
async fn add_entity_posts_all_four_fields() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let ack = client
        .add_entity(&EntityAddRequest {
            entity: "Balasar".to_string(),
            description: "Chieftain of the Daedendrainn".to_string(),
            key_relations: "Brother of Shedinn".to_string(),
            history: "Wields Javok".to_string(),
        })
        .await
        .expect("add entity");

    assert_eq!(ack.id.as_deref(), Some("Balasar-1.5"));
    let bodies = state.bodies.lock().await;
    assert_eq!(bodies[0].1["key_relations"], json!("Brother of Shedinn"));
}

#[tokio::test]
async fn add_entity_requires_name_and_description_locally() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let err = client
        .add_entity(&EntityAddRequest {
            entity: "Balasar".to_string(),
            description: "   ".to_string(),
            key_relations: String::new(),
            history: String::new(),
        })
        .await
        .expect_err("missing description");

    assert!(matches!(err, ClientError::Validation(_)));
    assert!(state.bodies.lock().await.is_empty());
}

#[tokio::test]
async fn similar_entities_returns_typed_matches() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let entities = client
        .similar_entities("who holds Javok?", 3)
        .await
        .expect("similar");

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].distance, Some(0.12));
    assert_eq!(entities[1].distance, None);
    let queries = state.queries.lock().await;
    assert_eq!(queries[0].1.get("n_results").map(String::as_str), Some("3"));
}

#[tokio::test]
async fn mine_entities_returns_message_and_result() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let response = client
        .mine_entities(&MineEntitiesRequest {
            story_text: "Balasar rose.".to_string(),
            novel_name: "abs".to_string(),
            username: "default_user".to_string(),
        })
        .await
        .expect("mine");

    assert_eq!(response.message, "Entity mining completed");
    assert_eq!(response.mined_count(), Some(4));
    let bodies = state.bodies.lock().await;
    assert_eq!(
        bodies[0].1,
        json!({"story_text": "Balasar rose.", "novel_name": "abs", "username": "default_user"})
    );
}

#[tokio::test]
async fn mine_entities_plain_500_has_no_detail() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let err = client
        .mine_entities(&MineEntitiesRequest {
            story_text: "text".to_string(),
            novel_name: "crash".to_string(),
            username: "default_user".to_string(),
        })
        .await
        .expect_err("server error");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.detail(), None);
    assert_eq!(err.user_message(), "request failed with status code 500");
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn mine_entities_gateway_timeout_counts_as_timeout() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let err = client
        .mine_entities(&MineEntitiesRequest {
            story_text: "text".to_string(),
            novel_name: "gateway".to_string(),
            username: "default_user".to_string(),
        })
        .await
        .expect_err("gateway timeout");

    assert!(err.is_timeout());
    assert_eq!(err.detail(), Some("Endpoint request timed out"));
}

#[tokio::test]
async fn transport_timeout_maps_to_timeout_variant() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(150))
        .build()
        .expect("http client");
    let client = NovelWriterClient::with_http_client(http, &server_url).expect("client");

    let err = client
        .mine_entities(&MineEntitiesRequest {
            story_text: "text".to_string(),
            novel_name: "slow".to_string(),
            username: "default_user".to_string(),
        })
        .await
        .expect_err("timeout");

    assert!(matches!(err, ClientError::Timeout(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = NovelWriterClient::new(&format!("http://{addr}/api")).expect("client");

    let err = client
        .fetch_story(&BucketName::from("novels"), &StoryKey::from("a.txt"))
        .await
        .expect_err("connection refused");

    assert!(matches!(err, ClientError::Transport(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn template_lookup_decodes_prompt_template() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let client = NovelWriterClient::new(&server_url).expect("client");

    let template = client
        .template("first novel", TemplateType::Forecaster)
        .await
        .expect("template");
    assert_eq!(template.novel_name, "first novel");
    assert_eq!(template.version, "0.1");

    let err = client
        .template("first novel", TemplateType::NovelCompletion)
        .await
        .expect_err("missing template");
    assert_eq!(err.detail(), Some("Template not found"));
}
