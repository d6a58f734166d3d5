//! Configuration Service entry point.

use configuration_service::config::ServiceConfig;
use configuration_service::startup::Application;
use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = ServiceConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )
    .map_err(|e| {
        eprintln!("Failed to initialize tracing: {}", e);
        std::io::Error::other(format!("Tracing error: {}", e))
    })?;

    tracing::info!(
        service_name = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        http_port = %config.common.port,
        backend = ?config.storage.backend,
        seed_sample_data = config.seed_sample_data,
        otlp_endpoint = ?config.otlp_endpoint,
        "Starting configuration-service"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::other(format!("Application build error: {}", e))
    })?;

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Application error");
                return Err(e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutting down configuration-service");
        }
    }

    Ok(())
}
