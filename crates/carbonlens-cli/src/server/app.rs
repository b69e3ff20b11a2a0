//! Axum application setup.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/query", post(handlers::post_query))
        .route("/health", get(handlers::get_health))
        .route("/columns", get(handlers::get_columns))
        .route("/reload", post(handlers::post_reload));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the web server and run until Ctrl+C.
pub async fn run_server(state: AppState, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    use carbonlens::{DatasetStore, QueryPipeline, StoreConfig, StoreHandle};

    use super::*;

    const CSV: &str = "\
country,year,co2,co2_per_capita
China,2021,11000,7.6
China,2022,11400,8.0
United States,2021,5000,15.0
United States,2022,5050,15.1
";

    fn state() -> AppState {
        let store = DatasetStore::from_reader(CSV.as_bytes(), &StoreConfig::default()).unwrap();
        AppState::new(QueryPipeline::rule_based(StoreHandle::new(store)).unwrap())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn query(question: &str) -> Request<Body> {
        Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "query": question }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_success() {
        let (status, body) = send(
            create_router(state()),
            query("What is the average CO2 of China?"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["value"], 11200.0);
        assert_eq!(body["query_used"], "average(co2) | entities: China | years: 2021-2022");
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["statistics"]["count"], 2);
        assert_eq!(body["origin"]["kind"], "rules");
    }

    #[tokio::test]
    async fn test_comparison_query() {
        let (status, body) = send(
            create_router(state()),
            query("Compare CO2 emissions between China and USA"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let value = body["result"]["value"].as_array().unwrap();
        assert_eq!(value.len(), 2);
        assert_eq!(value[1]["entity"], "United States");
    }

    #[tokio::test]
    async fn test_rejection_is_bad_request() {
        let (status, body) = send(
            create_router(state()),
            query("What is the average CO2 of Narnia?"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_kind"], "unknown_entity");
        assert!(body["detail"].as_str().unwrap().contains("Narnia"));
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_empty_query() {
        let request = Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(create_router(state()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_kind"], "empty_question");
    }

    #[tokio::test]
    async fn test_out_of_range_reports_span() {
        let (status, body) = send(create_router(state()), query("CO2 of China in 2150")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_kind"], "empty_range");
        assert_eq!(body["applied_years"]["start"], 2021);
        assert_eq!(body["applied_years"]["end"], 2022);
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(create_router(state()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["dataset_loaded"], true);
        assert_eq!(body["row_count"], 4);
        assert_eq!(body["entity_count"], 2);
        assert_eq!(body["extractor"], "rules");
    }

    #[tokio::test]
    async fn test_columns() {
        let request = Request::get("/api/columns").body(Body::empty()).unwrap();
        let (status, body) = send(create_router(state()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_column"], "country");
        assert_eq!(body["metric_count"], 2);
        assert_eq!(body["columns"][2]["name"], "co2");
    }

    #[tokio::test]
    async fn test_reload_without_source_is_rejected() {
        let request = Request::post("/api/reload").body(Body::empty()).unwrap();
        let (status, body) = send(create_router(state()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_reload_swaps_dataset() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let store = StoreHandle::open(file.path(), StoreConfig::default()).unwrap();
        let state = AppState::new(QueryPipeline::rule_based(store).unwrap());

        file.write_all(b"India,2022,2800,2.0\n").unwrap();
        let request = Request::post("/api/reload").body(Body::empty()).unwrap();
        let (status, body) = send(create_router(state.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["row_count"], 5);
        assert_eq!(state.store().snapshot().entities().len(), 3);
    }
}
