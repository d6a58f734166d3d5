use crate::models::{Configuration, Node};
use crate::services::error::ServiceError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Persistence primitives consumed by the core.
///
/// `create_*` has add semantics and fails when the id is already taken,
/// `update_*` is a put, and deleting an absent id is not an error. The
/// storage layer never builds the tree projection: `list_nodes` returns
/// flat records.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>, ServiceError>;
    async fn create_node(&self, node: Node) -> Result<Node, ServiceError>;
    async fn update_node(&self, node: Node) -> Result<Node, ServiceError>;
    async fn delete_node(&self, id: &str) -> Result<(), ServiceError>;
    async fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, ServiceError>;

    async fn list_configurations(&self) -> Result<Vec<Configuration>, ServiceError>;
    async fn list_configurations_by_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Configuration>, ServiceError>;
    async fn create_configuration(
        &self,
        config: Configuration,
    ) -> Result<Configuration, ServiceError>;
    async fn update_configuration(
        &self,
        config: Configuration,
    ) -> Result<Configuration, ServiceError>;
    async fn delete_configuration(&self, id: &str) -> Result<(), ServiceError>;
    async fn delete_configurations_by_parent(&self, parent_id: &str) -> Result<(), ServiceError>;
    async fn get_configuration_by_id(&self, id: &str)
        -> Result<Option<Configuration>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Default)]
struct Tables {
    nodes: BTreeMap<String, Node>,
    configurations: BTreeMap<String, Configuration>,
}

/// Process-local storage backend. Used as the default backend and in tests.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, ServiceError> {
        let tables = self.tables.read().map_err(|e| {
            ServiceError::Storage(anyhow::anyhow!("In-memory storage lock poisoned: {}", e))
        })?;
        Ok(f(&tables))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, ServiceError> {
        let mut tables = self.tables.write().map_err(|e| {
            ServiceError::Storage(anyhow::anyhow!("In-memory storage lock poisoned: {}", e))
        })?;
        Ok(f(&mut tables))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn list_nodes(&self) -> Result<Vec<Node>, ServiceError> {
        self.read(|t| t.nodes.values().cloned().collect())
    }

    async fn create_node(&self, node: Node) -> Result<Node, ServiceError> {
        self.write(|t| {
            if t.nodes.contains_key(&node.id) {
                return Err(ServiceError::Storage(anyhow::anyhow!(
                    "Node with id {} already exists",
                    node.id
                )));
            }
            t.nodes.insert(node.id.clone(), node.clone());
            Ok(node)
        })?
    }

    async fn update_node(&self, node: Node) -> Result<Node, ServiceError> {
        self.write(|t| {
            t.nodes.insert(node.id.clone(), node.clone());
            node
        })
    }

    async fn delete_node(&self, id: &str) -> Result<(), ServiceError> {
        self.write(|t| {
            t.nodes.remove(id);
        })
    }

    async fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, ServiceError> {
        self.read(|t| t.nodes.get(id).cloned())
    }

    async fn list_configurations(&self) -> Result<Vec<Configuration>, ServiceError> {
        self.read(|t| t.configurations.values().cloned().collect())
    }

    async fn list_configurations_by_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Configuration>, ServiceError> {
        self.read(|t| {
            t.configurations
                .values()
                .filter(|c| c.parent_id == parent_id)
                .cloned()
                .collect()
        })
    }

    async fn create_configuration(
        &self,
        config: Configuration,
    ) -> Result<Configuration, ServiceError> {
        self.write(|t| {
            if t.configurations.contains_key(&config.id) {
                return Err(ServiceError::Storage(anyhow::anyhow!(
                    "Configuration with id {} already exists",
                    config.id
                )));
            }
            t.configurations.insert(config.id.clone(), config.clone());
            Ok(config)
        })?
    }

    async fn update_configuration(
        &self,
        config: Configuration,
    ) -> Result<Configuration, ServiceError> {
        self.write(|t| {
            t.configurations.insert(config.id.clone(), config.clone());
            config
        })
    }

    async fn delete_configuration(&self, id: &str) -> Result<(), ServiceError> {
        self.write(|t| {
            t.configurations.remove(id);
        })
    }

    async fn delete_configurations_by_parent(&self, parent_id: &str) -> Result<(), ServiceError> {
        self.write(|t| t.configurations.retain(|_, c| c.parent_id != parent_id))
    }

    async fn get_configuration_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Configuration>, ServiceError> {
        self.read(|t| t.configurations.get(id).cloned())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.read(|_| ())
    }
}
