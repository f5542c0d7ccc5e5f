use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::service::{CatalogDataService, ServiceStatus};
use crate::tools::{ToolRegistry, ToolRequest};

use super::{log_requests, state::ServerState, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub tools: usize,
    pub catalog: ServiceStatus,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        tools: state.registry.tool_count(),
        catalog: state.service.status(),
    };
    Json(stats)
}

async fn list_tools(State(registry): State<Arc<ToolRegistry>>) -> impl IntoResponse {
    Json(serde_json::json!({ "tools": registry.definitions() }))
}

async fn call_tool(
    State(state): State<ServerState>,
    Json(request): Json<ToolRequest>,
) -> impl IntoResponse {
    Json(state.registry.dispatch(state.service.clone(), request).await)
}

fn make_app(
    service: Arc<CatalogDataService>,
    registry: Arc<ToolRegistry>,
    config: ServerConfig,
) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        service,
        registry,
    };

    let tool_routes: Router = Router::new()
        .route("/call", post(call_tool))
        .route("/", get(list_tools))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1/tools", tool_routes)
        .layer(axum::middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    service: Arc<CatalogDataService>,
    registry: Arc<ToolRegistry>,
    config: ServerConfig,
) -> Result<()> {
    let port = config.port;
    let app = make_app(service, registry, config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin_snapshot, StaticSource};
    use crate::service::DataServiceConfig;
    use crate::tools::register_all_tools;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = Arc::new(
            CatalogDataService::new(
                Arc::new(StaticSource::new(builtin_snapshot())),
                None,
                DataServiceConfig::default(),
            )
            .unwrap(),
        );
        let mut registry = ToolRegistry::new();
        register_all_tools(&mut registry);
        make_app(service, Arc::new(registry), ServerConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn call_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/tools/call")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn home_reports_uptime_and_catalog() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert!(value["uptime"].is_string());
        assert_eq!(value["tools"], 5);
    }

    #[tokio::test]
    async fn tools_route_lists_definitions() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/tools")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        let tools = value["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert!(tools.iter().all(|t| t["input_schema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn call_route_wraps_results_in_the_envelope() {
        let response = app()
            .oneshot(call_request(json!({
                "name": "search_components",
                "arguments": { "query": "button" },
                "caller": "test",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert_eq!(value["success"], true);
        assert!(value["data"]["total"].as_u64().unwrap() >= 2);
        assert!(value["metadata"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn tool_failures_are_envelope_errors_not_http_errors() {
        let response = app()
            .oneshot(call_request(json!({
                "name": "get_component",
                "arguments": { "id": "no-such-id" },
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], -32004);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_by_the_transport() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/tools/call")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 3600 + 61)),
            "1d 01:01:01"
        );
    }
}
