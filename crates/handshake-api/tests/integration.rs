//! Integration tests: observe pages, schedule targets, query handshake paths, snapshots.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use handshake_api::server::{self, AppState};
use handshake_graph::{JsonFileSnapshotStore, SocialGraph};
use handshake_scheduler::CrawlScheduler;
use handshake_types::SnapshotStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_app(snapshots: Option<Arc<dyn SnapshotStore>>) -> axum::Router {
    let state = AppState::new(SocialGraph::new(), CrawlScheduler::seeded(5), snapshots);
    server::router(state)
}

async fn call(app: &axum::Router, req: Request<Body>) -> Value {
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> Value {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(app, req).await
}

async fn get(app: &axum::Router, uri: &str) -> Value {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    call(app, req).await
}

fn page(id: u64, username: &str, following: &[(u64, &str)]) -> Value {
    json!({
        "user": { "id": id, "username": username, "full_name": username.to_uppercase() },
        "following": following
            .iter()
            .map(|(fid, fname)| json!({ "id": fid, "username": fname }))
            .collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn crawl_loop_through_http() {
    let app = test_app(None);

    let j = get(&app, "/next_target?from=alice&to=bob").await;
    assert_eq!(j["data"]["username"], "alice");

    let j = post(&app, "/observe/following", page(1, "alice", &[(3, "carol")])).await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["applied"], true);

    let j = get(&app, "/next_target?from=alice&to=bob").await;
    assert_eq!(j["data"]["username"], "bob");
    post(&app, "/observe/following", page(2, "bob", &[(3, "carol")])).await;

    // carol is followed by both anchors: a direct bridge.
    let j = get(&app, "/next_target?from=alice&to=bob").await;
    assert_eq!(j["data"]["username"], "carol");

    let j = get(&app, "/handshake?from=alice&to=bob").await;
    assert_eq!(j["data"]["usernames"].as_array().unwrap().len(), 0);

    post(
        &app,
        "/observe/following",
        page(3, "carol", &[(1, "alice"), (2, "bob")]),
    )
    .await;

    let j = get(&app, "/handshake?from=alice&to=bob").await;
    assert_eq!(j["data"]["usernames"], json!(["alice", "carol", "bob"]));
    assert_eq!(j["data"]["ids"], json!([1, 3, 2]));
    assert_eq!(
        j["data"]["description"],
        "ALICE (alice) <-> CAROL (carol) <-> BOB (bob)"
    );

    let j = get(&app, "/stats").await;
    assert_eq!(j["data"]["crawled"], 3);
    assert_eq!(j["data"]["mutual_pairs"], 2);
}

#[tokio::test]
async fn raw_users_and_edges_feed() {
    let app = test_app(None);
    post(
        &app,
        "/observe/users",
        json!({ "records": [
            { "id": 1, "username": "alice", "full_name": "Alice" },
            { "id": 2, "username": "bob" },
            { "username": "no_id" }
        ]}),
    )
    .await;
    let j = post(&app, "/observe/edges", json!({ "edges": { "1": [2], "2": [] } })).await;
    assert_eq!(j["data"]["applied"], true);

    let j = get(&app, "/path?from=alice&to=bob").await;
    assert_eq!(j["data"]["usernames"], json!(["alice", "bob"]));
    let j = get(&app, "/handshake?from=alice&to=bob").await;
    assert_eq!(j["data"]["ids"], json!([]));

    let j = get(&app, "/user_info?id=1").await;
    assert_eq!(j["data"]["info"], "Alice (alice)");
    let j = get(&app, "/user_info?id=99").await;
    assert_eq!(j["data"]["info"], " ()");

    // Both anchors crawled, no dead ends left.
    let j = get(&app, "/next_target?from=alice&to=bob").await;
    assert!(j["data"]["username"].is_null());
}

#[tokio::test]
async fn unknown_usernames_yield_empty_paths() {
    let app = test_app(None);
    let j = get(&app, "/handshake?from=nobody&to=someone").await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["usernames"], json!([]));
}

#[tokio::test]
async fn malformed_page_is_not_applied() {
    let app = test_app(None);
    let j = post(
        &app,
        "/observe/following",
        json!({ "user": { "username": "anon" }, "following": [] }),
    )
    .await;
    assert_eq!(j["data"]["applied"], false);
}

#[tokio::test]
async fn observations_persist_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SnapshotStore> =
        Arc::new(JsonFileSnapshotStore::new(dir.path().join("state.json")));
    let app = test_app(Some(Arc::clone(&store)));

    let j = post(&app, "/observe/following", page(1, "alice", &[(2, "bob")])).await;
    assert_eq!(j["data"]["persisted"], true);
    post(&app, "/observe/following", page(2, "bob", &[(1, "alice")])).await;
    let j = post(&app, "/snapshot/save", json!({})).await;
    assert_eq!(j["data"], true);

    let restored = SocialGraph::restore(store.as_ref());
    assert_eq!(restored.handshake_path("alice", "bob"), vec!["alice", "bob"]);
}

#[tokio::test]
async fn unwritable_store_reports_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileSnapshotStore::new(
        dir.path().join("no_such_dir").join("state.json"),
    ));
    let app = test_app(Some(Arc::clone(&store)));

    let j = post(&app, "/observe/following", page(1, "alice", &[(2, "bob")])).await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["applied"], true);
    assert_eq!(j["data"]["persisted"], false);
    assert!(store.load().unwrap().is_none());

    let j = post(&app, "/snapshot/save", json!({})).await;
    assert_eq!(j["code"], 500);
}

#[tokio::test]
async fn snapshot_save_without_store_is_rejected() {
    let app = test_app(None);
    let j = post(&app, "/snapshot/save", json!({})).await;
    assert_eq!(j["code"], 400);
}

#[tokio::test]
async fn health() {
    let app = test_app(None);
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}
