//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, request log, CORS, timeout)
//! - Bind server to listener
//! - Run the task sweeper alongside the server

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::AnyPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ApiConfig, CorsConfig, ServiceConfig};
use crate::http::handlers;
use crate::http::middleware::{request_log_middleware, RequestLogger};
use crate::http::request::make_request_span;
use crate::request_log::{build_sink, LogSink};
use crate::store::DialogueStore;
use crate::tasks::TaskRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: DialogueStore,
    pub tasks: TaskRegistry,
    pub api: Arc<ApiConfig>,
}

/// HTTP server for the dialogues service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    tasks: TaskRegistry,
}

impl HttpServer {
    /// Create a server backed by `pool`, with the log sink chosen in config.
    pub fn new(config: ServiceConfig, pool: AnyPool) -> Self {
        let sink = build_sink(config.request_log.sink, &pool);
        Self::with_log_sink(config, pool, sink)
    }

    /// Create a server that sends request log entries to `sink`.
    pub fn with_log_sink(config: ServiceConfig, pool: AnyPool, sink: Arc<dyn LogSink>) -> Self {
        let store = DialogueStore::new(pool);
        let tasks = TaskRegistry::new(store.clone(), Duration::from_millis(config.tasks.write_delay_ms));

        let state = AppState {
            store,
            tasks: tasks.clone(),
            api: Arc::new(config.api.clone()),
        };
        let logger = RequestLogger::new(
            sink,
            &config.api.microservice_name,
            Duration::from_millis(config.request_log.timeout_ms),
        );

        let router = Self::build_router(&config, state, logger);
        Self {
            router,
            config,
            tasks,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState, logger: RequestLogger) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route(
                "/dialogues",
                get(handlers::list_dialogues).post(handlers::create_dialogue),
            )
            .route("/dialogues/{id}", get(handlers::get_dialogue))
            .route("/dialogues/from_user/{user_id}", get(handlers::dialogues_from_user))
            .route(
                "/dialogues/from_conversation/{conversation_id}",
                get(handlers::dialogues_from_conversation),
            )
            .route("/dialogues/async", post(handlers::submit_dialogue))
            .route("/dialogues/async_check/{task_id}", get(handlers::check_task))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.cors))
            // Outside CORS so preflights answered by the CORS layer are logged too.
            .layer(middleware::from_fn_with_state(logger, request_log_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process callers.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The task registry this server submits to.
    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let sweeper = self.tasks.spawn_sweeper(
            Duration::from_secs(self.config.tasks.sweep_interval_secs),
            Duration::from_secs(self.config.tasks.ttl_secs),
            shutdown.resubscribe(),
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Task sweeper ended abnormally");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
