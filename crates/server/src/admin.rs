//! Local node introspection.

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use serde::Serialize;
use synapse_node::peers::PeerSnapshot;

use crate::response::ApiResponse;
use crate::ServiceState;

pub(crate) fn service() -> (&'static str, Router) {
    let router = Router::new()
        .route("/health", get(health_check_handler))
        .route("/peers", get(peers_handler));

    ("/admin-api", router)
}

#[derive(Debug, Serialize)]
struct GetHealthResponse {
    data: HealthStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatus {
    status: &'static str,
    name: String,
    peer_id: String,
    public_key: String,
    peer_count: usize,
}

async fn health_check_handler(Extension(state): Extension<Arc<ServiceState>>) -> impl IntoResponse {
    let identity = &state.ctx.identity;

    ApiResponse {
        payload: GetHealthResponse {
            data: HealthStatus {
                status: "alive",
                name: identity.name.clone(),
                peer_id: identity.peer_id.to_base58(),
                public_key: identity.public_key.clone(),
                peer_count: state.ctx.registry.peer_count(),
            },
        },
    }
}

#[derive(Debug, Serialize)]
struct GetPeersResponse {
    data: Vec<PeerSnapshot>,
    count: usize,
}

async fn peers_handler(Extension(state): Extension<Arc<ServiceState>>) -> impl IntoResponse {
    let data = state.ctx.registry.snapshot();

    ApiResponse {
        payload: GetPeersResponse {
            count: data.len(),
            data,
        },
    }
}
