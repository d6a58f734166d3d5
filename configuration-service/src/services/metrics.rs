//! Metrics collection and Prometheus export.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Mutex, OnceLock};

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

static INSTALL: Mutex<()> = Mutex::new(());

/// Install the Prometheus recorder. Later calls are no-ops, so test harnesses
/// that build several applications in one process can call it freely.
pub fn init_metrics() -> Result<(), String> {
    let _guard = INSTALL
        .lock()
        .map_err(|_| "metrics install lock poisoned".to_string())?;
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("failed to install Prometheus recorder: {}", e))?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}
