use crate::error::AppError;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn otlp_tracer(service_name: &str, endpoint: &str) -> Result<sdktrace::Tracer, AppError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio)
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                service_name,
                endpoint,
                e
            ))
        })
}

/// Install the global subscriber: env filter, JSON logs, and an OTLP export
/// layer when `otlp_endpoint` is set. `RUST_LOG` overrides `log_level`.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    otlp_endpoint: Option<&str>,
) -> Result<(), AppError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let telemetry = match otlp_endpoint {
        Some(endpoint) => Some(
            tracing_opentelemetry::layer().with_tracer(otlp_tracer(service_name, endpoint)?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init()
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
        })
}
