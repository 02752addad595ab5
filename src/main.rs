use ap_reconcile_rust::{api, AppConfig, MatchApprovalWorkflow};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    let workflow = Arc::new(MatchApprovalWorkflow::new());
    let matching_state = api::MatchingState {
        workflow,
        default_tolerance: config.policy.tolerance_pct.clone(),
    };

    let aging_routes = Router::new()
        .route("/api/aging/compute", post(api::compute_aging))
        .route("/api/aging/export", post(api::export_aging));

    let match_routes = Router::new()
        .route("/api/match/evaluate", post(api::evaluate_match))
        .route("/api/match/:id", get(api::get_match))
        .route("/api/match/:id/approve", post(api::approve_match))
        .route("/api/match/:id/reject", post(api::reject_match))
        .with_state(matching_state);

    let app = Router::new()
        .route("/health", get(api::health_check))
        .merge(aging_routes)
        .merge(match_routes)
        .layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/aging/compute     - aging summaries per party");
    info!("  POST /api/aging/export      - aging summaries as CSV");
    info!("  POST /api/match/evaluate    - three-way match evaluation");
    info!("  POST /api/match/:id/approve - approve a match");
    info!("  POST /api/match/:id/reject  - reject a match");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
