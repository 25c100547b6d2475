//! E-Consultation API Gateway
//!
//! Serves the citizen submission form, the analyst dashboard and the
//! Minister executive view. Handles:
//! - Request routing
//! - Rate limiting
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use econsult_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    intake::CommentIntake,
    metrics::{self, LATENCY_BUCKETS, METRICS_PREFIX, ML_BUCKETS},
    ml::{create_ml_client, MlClient},
    overview::{OverviewGenerator, OverviewLocks},
    Repository,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::{limit::GlobalConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::middleware::rate_limit::{create_rate_limiter, rate_limit_middleware};

/// Supporting documents arrive base64 encoded inside the JSON body
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub ml: Arc<dyn MlClient>,
    pub overview_locks: Arc<OverviewLocks>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DbPool, ml: Arc<dyn MlClient>) -> Self {
        Self {
            config,
            db,
            ml,
            overview_locks: Arc::new(OverviewLocks::new()),
        }
    }

    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }

    pub fn intake(&self) -> CommentIntake {
        CommentIntake::new(self.repo(), self.ml.clone())
    }

    pub fn overview(&self) -> OverviewGenerator {
        OverviewGenerator::new(self.repo(), self.ml.clone(), self.overview_locks.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting E-Consultation API Gateway v{}",
        econsult_common::VERSION
    );

    if config.observability.metrics_port != 0 {
        install_metrics_exporter(config.observability.metrics_port)?;
    }
    metrics::register_metrics();

    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }

    let ml = create_ml_client(&config.ml)?;

    let config = Arc::new(config);
    let state = AppState::new(config.clone(), db, ml);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Serve Prometheus metrics on a dedicated port
fn install_metrics_exporter(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_ml_duration_seconds", METRICS_PREFIX)),
            ML_BUCKETS,
        )?
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)?
        .install()
        .context("failed to install Prometheus exporter")?;

    info!(port = port, "Metrics exporter listening");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Analyst dashboard
        .route("/recent-activity", get(handlers::analytics::recent_activity))
        .route(
            "/comments/{bill}",
            get(handlers::comments::list_comments).post(handlers::comments::add_comment),
        )
        .route("/comments/{bill}/{id}", put(handlers::comments::update_comment))
        .route("/sentiment/{bill}", get(handlers::analytics::sentiment))
        .route("/stakeholders/{bill}", get(handlers::analytics::stakeholders))
        .route("/summaries/{bill}", get(handlers::analytics::summaries))
        .route("/sections/{bill}", get(handlers::analytics::sections))
        .route("/section-sentiments/{bill}", get(handlers::analytics::section_sentiments))
        .route("/generate-overview/{bill}", post(handlers::overview::generate_overview))

        // Public form
        .route("/submit-comment", post(handlers::comments::submit_comment))
        .route("/consultations", get(handlers::consultations::list_consultations))

        // Minister executive view
        .route("/minister/dashboard-summary", get(handlers::minister::dashboard_summary))
        .route("/minister/top-comments", get(handlers::minister::top_comments))
        .route("/minister/consultation/{bill}", get(handlers::minister::consultation));

    let api_routes = if state.config.rate_limit.enabled {
        let limiter = create_rate_limiter(&state.config.rate_limit);
        api_routes.layer(from_fn_with_state(limiter, rate_limit_middleware))
    } else {
        warn!("Rate limiting disabled");
        api_routes
    };

    let routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes);

    with_middleware(routes, state)
}

/// Wrap routes in the process-wide middleware stack. The concurrency limit
/// shares one semaphore across every route.
fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests.max(1);

    routes
        .layer(from_fn(middleware::metrics::track_requests))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(TimeoutLayer::new(request_timeout))
                .layer(GlobalConcurrencyLimitLayer::new(max_concurrent)),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
