//! HTTP front for the remote resource proxy.
//!
//! Every route names its target with `?synapsePublicKey=` and answers with the unwrapped
//! remote payload, or `{"error": ...}` with the proxy error's status.

use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::Value;
use synapse_node::proxy::ProxyError;

use crate::response::{ApiError, ApiResponse};
use crate::ServiceState;

pub(crate) fn service() -> (&'static str, Router) {
    let router = Router::new()
        .route("/users", get(get_users_handler))
        .route("/users/:user_id", get(get_user_handler))
        .route("/posts", get(get_posts_handler))
        .route("/posts/:post_id", get(get_post_handler))
        .route("/posts/:post_id/comments", get(get_comments_handler))
        .route("/posts/:post_id/reactions", get(get_reactions_handler))
        .route("/channels/:channel_id/chats", get(get_channel_chats_handler))
        .route("/metadata", get(get_metadata_handler))
        .route("/health", get(ping_handler));

    ("/federation", router)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetQuery {
    synapse_public_key: Option<String>,
}

impl TargetQuery {
    fn key(&self) -> Option<&str> {
        self.synapse_public_key.as_deref()
    }
}

fn respond(result: Result<Value, ProxyError>) -> Response {
    match result {
        Ok(payload) => ApiResponse { payload }.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_user_handler(
    Path(user_id): Path<String>,
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(
        state
            .remote
            .fetch_remote_user(target.key(), Some(&user_id))
            .await,
    )
}

async fn get_users_handler(
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(state.remote.fetch_remote_users(target.key()).await)
}

async fn get_post_handler(
    Path(post_id): Path<String>,
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(
        state
            .remote
            .fetch_remote_post(target.key(), Some(&post_id))
            .await,
    )
}

async fn get_posts_handler(
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(state.remote.fetch_remote_posts(target.key()).await)
}

async fn get_comments_handler(
    Path(post_id): Path<String>,
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(
        state
            .remote
            .fetch_remote_comments(target.key(), Some(&post_id))
            .await,
    )
}

async fn get_reactions_handler(
    Path(post_id): Path<String>,
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(
        state
            .remote
            .fetch_remote_reactions(target.key(), Some(&post_id))
            .await,
    )
}

async fn get_channel_chats_handler(
    Path(channel_id): Path<String>,
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(
        state
            .remote
            .fetch_remote_channel_chats(target.key(), Some(&channel_id))
            .await,
    )
}

async fn get_metadata_handler(
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(state.remote.fetch_remote_metadata(target.key()).await)
}

async fn ping_handler(
    Query(target): Query<TargetQuery>,
    Extension(state): Extension<Arc<ServiceState>>,
) -> Response {
    respond(state.remote.ping_remote(target.key()).await)
}
