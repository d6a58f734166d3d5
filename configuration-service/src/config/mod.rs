use crate::services::ClosurePolicy;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub seed_sample_data: bool,
    pub copy_closure_policy: ClosurePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongodb: Option<MongoConfig>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageBackend {
    Memory,
    MongoDb,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let backend: StorageBackend = get_env("STORAGE_BACKEND", Some("memory"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let mongodb = match backend {
            StorageBackend::MongoDb => Some(MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("configuration_db"), is_prod)?,
            }),
            StorageBackend::Memory => None,
        };

        let seed_default = if is_prod { "false" } else { "true" };
        let seed_sample_data = env::var("SEED_SAMPLE_DATA")
            .unwrap_or_else(|_| seed_default.to_string())
            .parse()
            .map_err(|e: std::str::ParseBoolError| {
                AppError::ConfigError(anyhow::anyhow!("SEED_SAMPLE_DATA: {}", e))
            })?;

        Ok(ServiceConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("configuration-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            storage: StorageConfig { backend, mongodb },
            seed_sample_data,
            copy_closure_policy: env::var("COPY_CLOSURE_POLICY")
                .unwrap_or_else(|_| "isolated".to_string())
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
        })
    }

    /// In-memory configuration used by tests and local tooling.
    pub fn in_memory(port: u16) -> Self {
        ServiceConfig {
            common: core_config::Config { port },
            environment: Environment::Dev,
            service_name: "configuration-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                mongodb: None,
            },
            seed_sample_data: false,
            copy_closure_policy: ClosurePolicy::Isolated,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "mongodb" | "mongo" => Ok(StorageBackend::MongoDb),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Read `key`, falling back to `default`. Keys without a default are
/// required, and the error names the environment when running in prod.
fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match (env::var(key), default) {
        (Ok(val), _) => Ok(val),
        (Err(_), Some(def)) => Ok(def.to_string()),
        (Err(_), None) if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        (Err(_), None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required but not set",
            key
        ))),
    }
}
