//! Application startup and lifecycle management.

use crate::config::{ServiceConfig, StorageBackend};
use crate::handlers::{self, configurations, nodes};
use crate::services::seed::seed_sample_data;
use crate::services::{init_metrics, ConfigurationManager, InMemoryStorage, MongoStorage, Storage};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub manager: Arc<ConfigurationManager>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
}

async fn build_storage(config: &ServiceConfig) -> Result<Arc<dyn Storage>, AppError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage backend");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        StorageBackend::MongoDb => {
            let mongo = config.storage.mongodb.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "MongoDB settings are required for the mongodb backend"
                ))
            })?;
            let storage = MongoStorage::connect(&mongo.uri, &mongo.database).await?;
            storage.initialize_indexes().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to initialize database indexes");
                e
            })?;
            Ok(Arc::new(storage))
        }
    }
}

pub fn router(state: AppState) -> Router {
    let node_routes = Router::new()
        .route("/nodes", get(nodes::list_nodes).post(nodes::create_node))
        .route("/nodes/tree", get(nodes::node_tree))
        .route("/nodes/paths", get(nodes::node_paths))
        .route(
            "/nodes/:node_id",
            get(nodes::get_node)
                .patch(nodes::rename_node)
                .delete(nodes::delete_node),
        )
        .route("/nodes/:node_id/ancestors", get(nodes::ancestors))
        .route("/nodes/:node_id/child-types", get(nodes::child_types));

    let configuration_routes = Router::new()
        .route(
            "/nodes/:node_id/configurations",
            get(configurations::visible_configurations).post(configurations::create_configuration),
        )
        .route(
            "/nodes/:node_id/configurations/:configuration_id",
            put(configurations::update_configuration),
        )
        .route(
            "/nodes/:node_id/configurations/move",
            post(configurations::move_configurations),
        )
        .route(
            "/nodes/:node_id/configurations/copy",
            post(configurations::copy_configurations),
        )
        .route(
            "/nodes/:node_id/configurations/duplicate",
            post(configurations::duplicate_configurations),
        )
        .route(
            "/nodes/:node_id/configurations/delete",
            post(configurations::delete_configurations),
        )
        .route("/configurations", get(configurations::list_configurations))
        .route(
            "/configurations/:configuration_id",
            get(configurations::get_configuration),
        )
        .route(
            "/configurations/:configuration_id/references",
            get(configurations::configuration_references),
        )
        .route(
            "/configurations/:configuration_id/closure",
            get(configurations::configuration_closure),
        )
        .route(
            "/configurations/:configuration_id/clone",
            post(configurations::clone_configuration),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .merge(node_routes)
        .merge(configuration_routes)
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ServiceConfig) -> Result<Self, AppError> {
        let storage = build_storage(&config).await?;
        Self::build_with_storage(config, storage).await
    }

    /// Build on top of an already constructed storage backend.
    pub async fn build_with_storage(
        config: ServiceConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, AppError> {
        init_metrics().map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if config.seed_sample_data {
            seed_sample_data(storage.as_ref()).await?;
        }

        let manager = Arc::new(ConfigurationManager::new(
            storage,
            config.copy_closure_policy,
        ));
        let state = AppState {
            config: config.clone(),
            manager,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            backend = ?config.storage.backend,
            closure_policy = ?config.copy_closure_policy,
            "Configuration service listener bound"
        );

        Ok(Self {
            http_port,
            listener,
            router: router(state.clone()),
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn manager(&self) -> Arc<ConfigurationManager> {
        self.state.manager.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = %self.state.config.service_name,
            version = %self.state.config.service_version,
            http_port = self.http_port,
            "Service ready to accept connections"
        );
        axum::serve(self.listener, self.router).await
    }
}
