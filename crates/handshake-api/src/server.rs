//! Axum server and routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use handshake_graph::SocialGraph;
use handshake_scheduler::{CrawlScheduler, Observation, ObservationWriter, SharedGraph};
use handshake_types::{
    AnchorQuery, ApiResponse, FollowingPage, GraphStats, NextTargetData, ObserveData,
    ObserveEdgesRequest, ObserveUsersRequest, PathData, SnapshotStore, UserId, UserInfoData,
    UserInfoQuery,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub graph: SharedGraph,
    pub writer: ObservationWriter,
    pub scheduler: Mutex<CrawlScheduler>,
    pub snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl AppState {
    /// Wrap `graph` and spawn its observation writer. Must be called inside a
    /// tokio runtime.
    pub fn new(
        graph: SocialGraph,
        scheduler: CrawlScheduler,
        snapshots: Option<Arc<dyn SnapshotStore>>,
    ) -> Arc<Self> {
        let graph: SharedGraph = Arc::new(RwLock::new(graph));
        let writer = ObservationWriter::spawn(Arc::clone(&graph), snapshots.clone());
        Arc::new(Self {
            graph,
            writer,
            scheduler: Mutex::new(scheduler),
            snapshots,
        })
    }

    /// Persist the current graph, if a store is configured.
    pub async fn save_snapshot(&self) -> Result<bool, String> {
        let Some(store) = self.snapshots.clone() else {
            return Ok(false);
        };
        let snapshot = self.graph.read().await.snapshot();
        tokio::task::spawn_blocking(move || store.save(&snapshot))
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())?;
        Ok(true)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/observe/users", post(handle_observe_users))
        .route("/observe/edges", post(handle_observe_edges))
        .route("/observe/following", post(handle_observe_following))
        .route("/next_target", get(handle_next_target))
        .route("/handshake", get(handle_handshake))
        .route("/path", get(handle_directed_path))
        .route("/user_info", get(handle_user_info))
        .route("/stats", get(handle_stats))
        .route("/snapshot/save", post(handle_snapshot_save))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn submit(state: &AppState, observation: Observation) -> Json<ApiResponse<ObserveData>> {
    match state.writer.submit(observation).await {
        Ok(ack) => Json(ApiResponse::ok(ObserveData {
            applied: ack.applied,
            persisted: ack.persisted,
        })),
        Err(e) => Json(ApiResponse::error(500, e.to_string())),
    }
}

async fn handle_observe_users(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ObserveUsersRequest>,
) -> Json<ApiResponse<ObserveData>> {
    submit(&state, Observation::Users(req.records)).await
}

async fn handle_observe_edges(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ObserveEdgesRequest>,
) -> Json<ApiResponse<ObserveData>> {
    submit(&state, Observation::Edges(req.edges)).await
}

async fn handle_observe_following(
    State(state): State<Arc<AppState>>,
    Json(page): Json<FollowingPage>,
) -> Json<ApiResponse<ObserveData>> {
    let user_id = page.user.id;
    let res = submit(&state, Observation::Following(page)).await;
    if res.data.as_ref().is_some_and(|d| !d.applied) {
        tracing::warn!(user_id = ?user_id, "following page dropped");
    }
    res
}

async fn handle_next_target(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AnchorQuery>,
) -> Json<ApiResponse<NextTargetData>> {
    let mut scheduler = state.scheduler.lock().await;
    let graph = state.graph.read().await;
    let username = scheduler.next_target(&graph, &q.from, &q.to);
    Json(ApiResponse::ok(NextTargetData { username }))
}

fn path_data(graph: &SocialGraph, ids: Vec<UserId>) -> PathData {
    PathData {
        usernames: graph.usernames(&ids),
        description: graph.describe_path(&ids),
        ids,
    }
}

async fn handle_handshake(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AnchorQuery>,
) -> Json<ApiResponse<PathData>> {
    let graph = state.graph.read().await;
    let ids = graph.handshake_ids(&q.from, &q.to);
    Json(ApiResponse::ok(path_data(&graph, ids)))
}

async fn handle_directed_path(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AnchorQuery>,
) -> Json<ApiResponse<PathData>> {
    let graph = state.graph.read().await;
    let ids = graph.directed_path(&q.from, &q.to);
    Json(ApiResponse::ok(path_data(&graph, ids)))
}

async fn handle_user_info(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserInfoQuery>,
) -> Json<ApiResponse<UserInfoData>> {
    let graph = state.graph.read().await;
    Json(ApiResponse::ok(UserInfoData {
        id: q.id,
        info: graph.user_info(q.id),
    }))
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<GraphStats>> {
    Json(ApiResponse::ok(state.graph.read().await.stats()))
}

async fn handle_snapshot_save(State(state): State<Arc<AppState>>) -> Json<ApiResponse<bool>> {
    match state.save_snapshot().await {
        Ok(true) => Json(ApiResponse::ok(true)),
        Ok(false) => Json(ApiResponse::error(400, "snapshot store not configured")),
        Err(e) => {
            tracing::warn!(error = %e, "snapshot save failed");
            Json(ApiResponse::error(500, e))
        }
    }
}

async fn handle_health() -> &'static str {
    "ok"
}
