use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::http::Method;
use axum::{Extension, Router};
use eyre::{bail, Result as EyreResult};
use multiaddr::Protocol;
use synapse_node::proxy::RemoteResources;
use synapse_node::NodeContext;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;

pub mod admin;
pub mod config;
pub mod federation;
pub mod response;

/// Everything a request handler can reach.
#[derive(Debug)]
#[non_exhaustive]
pub struct ServiceState {
    pub ctx: NodeContext,
    pub remote: RemoteResources,
}

impl ServiceState {
    #[must_use]
    pub fn new(ctx: NodeContext) -> Self {
        Self {
            remote: RemoteResources::new(ctx.clone()),
            ctx,
        }
    }
}

/// The complete HTTP surface, ready to be served or driven in-process.
#[must_use]
pub fn router(ctx: NodeContext) -> Router {
    let state = Arc::new(ServiceState::new(ctx));

    let (federation_path, federation) = federation::service();
    let (admin_path, admin) = admin::service();

    Router::new()
        .nest(federation_path, federation)
        .nest(admin_path, admin)
        .layer(Extension(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_private_network(true),
        )
        .layer(TraceLayer::new_for_http())
}

pub async fn start(config: ServerConfig, ctx: NodeContext) -> EyreResult<()> {
    let mut listeners = Vec::with_capacity(config.listen.len());
    let mut want_listeners = config.listen.into_iter().peekable();

    while let Some(addr) = want_listeners.next() {
        let mut components = addr.iter();

        let host: IpAddr = match components.next() {
            Some(Protocol::Ip4(host)) => host.into(),
            Some(Protocol::Ip6(host)) => host.into(),
            _ => bail!("Invalid multiaddr {addr}, expected an IP component"),
        };

        let Some(Protocol::Tcp(port)) = components.next() else {
            bail!("Invalid multiaddr {addr}, expected a TCP component");
        };

        match TcpListener::bind(SocketAddr::from((host, port))).await {
            Ok(listener) => listeners.push(listener),
            Err(err) => {
                if want_listeners.peek().is_none() && listeners.is_empty() {
                    bail!(err);
                }
            }
        }
    }

    let app = router(ctx);

    let mut set = JoinSet::new();

    for listener in listeners {
        let addr = listener.local_addr()?;
        info!(%addr, "HTTP server listening");

        let app = app.clone();
        drop(set.spawn(async move { axum::serve(listener, app).await }));
    }

    while let Some(result) = set.join_next().await {
        result??;
    }

    Ok(())
}
