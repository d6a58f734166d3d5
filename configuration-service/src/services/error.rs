use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Operator input rejected before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Node {0} not found")]
    NodeNotFound(String),

    #[error("Configuration {0} not found")]
    ConfigurationNotFound(String),

    /// Configuration is owned by an ancestor of the node it was edited from.
    #[error("Configuration {configuration_id} is inherited by node {node_id} and is read-only there")]
    Inherited {
        configuration_id: String,
        node_id: String,
    },

    /// The persistence layer rejected a call. Earlier writes of the same
    /// operation are not rolled back.
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::NodeNotFound(_) | ServiceError::ConfigurationNotFound(_)
        )
    }
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        ServiceError::Storage(anyhow::Error::new(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            e @ ServiceError::NodeNotFound(_) => AppError::NotFound(anyhow::anyhow!(e.to_string())),
            e @ ServiceError::ConfigurationNotFound(_) => {
                AppError::NotFound(anyhow::anyhow!(e.to_string()))
            }
            e @ ServiceError::Inherited { .. } => {
                AppError::Forbidden(anyhow::anyhow!(e.to_string()))
            }
            ServiceError::Storage(e) => AppError::StorageError(e),
        }
    }
}
