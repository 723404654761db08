use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    handlers::{self, AppState, Services},
    metrics,
    signals::setup_signal_handlers,
};

/// Start the pricing desk server
///
/// This function:
/// 1. Initializes metrics
/// 2. Builds the table cache, assistant client and session store
/// 3. Sets up signal handlers for graceful shutdown and config reload
/// 4. Serves requests until a shutdown signal arrives
pub async fn start_server(config: Config, config_path: PathBuf) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let http_client = reqwest::Client::new();
    let services = Services::from_config(&config, http_client.clone());
    let state = AppState::new(config.clone(), services);

    // Warm the cache so the first request does not pay for the download
    if let Err(e) = state.tables().await {
        tracing::warn!(error = %e, "Initial pricing tables load failed; retrying on first request");
    }

    // Setup signal handlers (SIGTERM, SIGINT for shutdown; SIGHUP for reload)
    let (shutdown_tx, signal_handle) =
        setup_signal_handlers(state.clone(), config_path, http_client);
    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::spawn({
        let sessions = state.sessions.clone();
        let max_idle = config.assistant.session_idle();
        async move {
            sessions.cleanup_loop(max_idle).await;
        }
    });

    let app = create_router(state, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting pricing desk on {}", addr);
    info!(
        spreadsheet = %config.sheets.spreadsheet_id,
        cache_ttl_secs = config.sheets.cache_ttl_seconds,
        tabs = config.catalog.tabs.len(),
        assistant_enabled = config.assistant.enabled,
        "Configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/facets", get(handlers::catalog::list_facets))
        .route("/api/extras", get(handlers::catalog::list_extras))
        .route("/api/plans", get(handlers::catalog::list_plans))
        .route("/api/plans/:plan", get(handlers::catalog::get_plan))
        .route("/api/chat/sessions", post(handlers::chat::create_session))
        .route(
            "/api/chat/sessions/:id",
            get(handlers::chat::get_session).delete(handlers::chat::delete_session),
        )
        .route(
            "/api/chat/sessions/:id/messages",
            post(handlers::chat::send_message),
        )
        .route(
            "/api/chat/sessions/:id/retry",
            post(handlers::chat::retry_message),
        )
        .route(
            "/api/chat/sessions/:id/reset",
            post(handlers::chat::reset_session),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .with_state(metrics_handle)
        .merge(api_routes)
        // Chat messages are small; 1MB is plenty
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{test_state, ScriptedAssistant};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        create_router(state, Arc::new(recorder.handle()))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = app(test_state(None));

        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["extras"], 3);
    }

    #[tokio::test]
    async fn test_extras_unfiltered() {
        let app = app(test_state(None));

        let (status, body) = send(&app, get("/api/extras")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], false);
        assert_eq!(body["count"], 3);
        assert_eq!(body["items"][0]["title"], "F24 credit entry");
    }

    #[tokio::test]
    async fn test_extras_search_and_facets() {
        let app = app(test_state(None));

        let (_, body) = send(&app, get("/api/extras?q=f24%20credit")).await;
        assert_eq!(body["applied"], true);
        assert_eq!(body["count"], 1);

        let (_, body) = send(&app, get("/api/extras?category=tax")).await;
        assert_eq!(body["count"], 2);

        let (_, body) = send(&app, get("/api/extras?category=&q=nothing-like-this")).await;
        assert_eq!(body["applied"], true);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_extras_tab() {
        let app = app(test_state(None));

        let (_, body) = send(&app, get("/api/extras?tab=consultant")).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["items"][0]["title"], "Visita ispettiva");

        let (_, body) = send(&app, get("/api/extras?tab=hr-jet")).await;
        assert_eq!(body["count"], 2);

        let (status, body) = send(&app, get("/api/extras?tab=unknown")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "bad_request");
    }

    #[tokio::test]
    async fn test_facets() {
        let app = app(test_state(None));

        let (status, body) = send(&app, get("/api/facets")).await;
        assert_eq!(status, StatusCode::OK);

        let labels: Vec<&str> = body["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|facet| facet["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["All", "HR", "Tax"]);
        assert_eq!(body["categories"][0]["value"], Value::Null);
        assert_eq!(body["tabs"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_plans() {
        let app = app(test_state(None));

        let (_, body) = send(&app, get("/api/plans")).await;
        assert_eq!(body["plans"], json!(["START", "PREMIUM"]));

        let (status, body) = send(&app, get("/api/plans/Start")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["features"][0]["included"], true);
        assert_eq!(body["features"][0]["details"], json!(["Elaborazione cedolini"]));
        assert_eq!(body["features"][1]["included"], false);

        let (_, body) = send(&app, get("/api/plans/Enterprise")).await;
        assert_eq!(body["features"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_session_flow() {
        let app = app(test_state(Some(ScriptedAssistant { fail: false })));

        let (status, body) = send(&app, post_json("/api/chat/sessions", json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/chat/sessions/{}/messages", id),
                json!({"content": "Quote F24 for 10 employees"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "ANALYSIS: Quote F24 for 10 employees");
        assert_eq!(body["turns"], 2);

        let (_, body) = send(&app, get(&format!("/api/chat/sessions/{}", id))).await;
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["pending"], false);

        let (status, _) = send(
            &app,
            post_json(&format!("/api/chat/sessions/{}/reset", id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let delete = Request::delete(format!("/api/chat/sessions/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, get(&format!("/api/chat/sessions/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "session_not_found");
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_pending_turn() {
        let app = app(test_state(Some(ScriptedAssistant { fail: true })));

        let (_, body) = send(&app, post_json("/api/chat/sessions", json!({}))).await;
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/chat/sessions/{}/messages", id),
                json!({"content": "Is F24 included?"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]["message"].as_str().unwrap().contains("503"));

        let (_, body) = send(&app, get(&format!("/api/chat/sessions/{}", id))).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["pending"], true);
    }

    #[tokio::test]
    async fn test_chat_disabled() {
        let app = app(test_state(None));

        let (status, _) = send(&app, post_json("/api/chat/sessions", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
