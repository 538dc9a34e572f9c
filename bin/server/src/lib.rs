//! pdp-check example server.
//!
//! One route, one permission check: every request to `/` asks the policy
//! decision point whether the configured placeholder user may perform the
//! configured action on the configured resource, and answers 200 or 403.

pub mod config;
pub mod error;
pub mod handler;

use axum::{Router, routing::any};
use pdp_check_authz::PdpClient;
use rootcause::prelude::Report;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{PORT, ServerConfig};
use crate::error::ServerError;
use crate::handler::AppState;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(handler::check_access))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configures the PDP client and the placeholder check.
///
/// # Errors
///
/// Returns an error if the PDP configuration or the placeholders are invalid.
pub fn build_state(config: &ServerConfig) -> Result<Arc<AppState>, Report<ServerError>> {
    let client = PdpClient::new(&config.pdp).map_err(|e| ServerError::PdpClient {
        details: e.to_string(),
    })?;
    tracing::info!(pdp = %client.allowed_url(), "Configured PDP client");

    let template = config
        .check
        .template()
        .map_err(|e| ServerError::CheckTemplate {
            details: e.to_string(),
        })?;

    Ok(Arc::new(AppState::new(
        Arc::new(client),
        template,
        config.check.on_error,
    )))
}

/// Serves the router on an already bound listener until the process is killed.
///
/// # Errors
///
/// Returns an error if the server stops unexpectedly.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), Report<ServerError>> {
    axum::serve(listener, router(state).into_make_service())
        .await
        .map_err(|e| ServerError::Serve {
            details: e.to_string(),
        })?;
    Ok(())
}

/// Builds the state, binds [`PORT`] on all interfaces and serves.
///
/// # Errors
///
/// Returns an error if startup fails or the server stops unexpectedly.
pub async fn run(config: ServerConfig) -> Result<(), Report<ServerError>> {
    let state = build_state(&config)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, PORT));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            details: e.to_string(),
        })?;

    tracing::info!("listening on http://localhost:{PORT}");

    serve(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, routing::post};
    use pdp_check_authz::PdpConfig;
    use serde_json::{Value, json};

    async fn spawn(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server failed");
        });
        addr
    }

    /// A PDP that permits only "read".
    async fn spawn_pdp() -> SocketAddr {
        let router = Router::new().route(
            "/allowed",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "allow": body["action"] == "read" }))
            }),
        );
        spawn(router).await
    }

    async fn spawn_server(config: ServerConfig) -> SocketAddr {
        let state = build_state(&config).expect("state should build");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get local address");
        tokio::spawn(async move {
            serve(listener, state).await.expect("server failed");
        });
        addr
    }

    fn config_for(pdp: SocketAddr) -> ServerConfig {
        ServerConfig::new(
            PdpConfig::builder("permit_key_test")
                .with_pdp_url(format!("http://{pdp}"))
                .build(),
        )
    }

    #[test]
    fn build_state_rejects_invalid_config() {
        assert!(build_state(&ServerConfig::new(PdpConfig::new(""))).is_err());

        let mut config = ServerConfig::new(PdpConfig::new("key"));
        config.check.resource = String::new();
        assert!(build_state(&config).is_err());
    }

    #[tokio::test]
    async fn run_reports_bind_failure_when_port_is_taken() {
        let pdp = spawn_pdp().await;
        // Held for the whole test; if another process owns the port the bind
        // below fails all the same.
        let _taken = TcpListener::bind((Ipv4Addr::UNSPECIFIED, PORT)).await.ok();

        let err = run(config_for(pdp))
            .await
            .expect_err("bind should fail on an occupied port");
        let rendered = err.to_string();
        assert!(
            rendered.contains(&format!("failed to bind to '0.0.0.0:{PORT}'")),
            "unexpected error: {rendered}"
        );
    }

    #[tokio::test]
    async fn serves_permitted_decision_end_to_end() {
        let pdp = spawn_pdp().await;
        let server = spawn_server(config_for(pdp)).await;

        let response = reqwest::get(format!("http://{server}/"))
            .await
            .expect("request should succeed");
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response.text().await.expect("body"),
            "Jane Doe is PERMITTED to read document!"
        );
    }

    #[tokio::test]
    async fn serves_denied_decision_end_to_end() {
        let pdp = spawn_pdp().await;
        let mut config = config_for(pdp);
        config.check.action = "delete".to_string();
        let server = spawn_server(config).await;

        let response = reqwest::get(format!("http://{server}/"))
            .await
            .expect("request should succeed");
        assert_eq!(response.status().as_u16(), 403);
        assert_eq!(
            response.text().await.expect("body"),
            "Jane Doe is NOT PERMITTED to delete document!"
        );
    }

    #[tokio::test]
    async fn keeps_serving_after_pdp_failure() {
        let pdp = {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind");
            listener.local_addr().expect("failed to get local address")
        };
        let server = spawn_server(config_for(pdp)).await;

        for _ in 0..2 {
            let response = reqwest::get(format!("http://{server}/"))
                .await
                .expect("request should succeed");
            assert_eq!(response.status().as_u16(), 500);
        }
    }
}
