use crate::models::{Configuration, Node};
use crate::services::error::ServiceError;
use crate::services::storage::Storage;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};

/// MongoDB-backed storage with one collection per record kind.
#[derive(Clone)]
pub struct MongoStorage {
    client: MongoClient,
    db: Database,
}

impl MongoStorage {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ServiceError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            ServiceError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ServiceError> {
        tracing::info!("Creating MongoDB indexes for configuration-service");

        for (collection, name) in [("nodes", "nodes"), ("configurations", "configurations")] {
            let records = self.db.collection::<mongodb::bson::Document>(collection);

            let id_index = IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(
                    IndexOptions::builder()
                        .name(format!("{}_id_idx", name))
                        .unique(true)
                        .build(),
                )
                .build();

            records.create_index(id_index, None).await.map_err(|e| {
                tracing::error!("Failed to create id index on {}: {}", collection, e);
                ServiceError::from(e)
            })?;

            let parent_index = IndexModel::builder()
                .keys(doc! { "parentId": 1 })
                .options(
                    IndexOptions::builder()
                        .name(format!("{}_parent_id_idx", name))
                        .build(),
                )
                .build();

            records.create_index(parent_index, None).await.map_err(|e| {
                tracing::error!("Failed to create parentId index on {}: {}", collection, e);
                ServiceError::from(e)
            })?;
            tracing::info!("Created indexes on {}.(id, parentId)", collection);
        }

        Ok(())
    }

    pub fn nodes(&self) -> Collection<Node> {
        self.db.collection("nodes")
    }

    pub fn configurations(&self) -> Collection<Configuration> {
        self.db.collection("configurations")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn list_nodes(&self) -> Result<Vec<Node>, ServiceError> {
        let cursor = self.nodes().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_node(&self, node: Node) -> Result<Node, ServiceError> {
        self.nodes().insert_one(&node, None).await.map_err(|e| {
            tracing::error!(node_id = %node.id, "Failed to insert node: {}", e);
            ServiceError::from(e)
        })?;
        Ok(node)
    }

    async fn update_node(&self, node: Node) -> Result<Node, ServiceError> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.nodes()
            .replace_one(doc! { "id": &node.id }, &node, options)
            .await?;
        Ok(node)
    }

    async fn delete_node(&self, id: &str) -> Result<(), ServiceError> {
        self.nodes().delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }

    async fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, ServiceError> {
        Ok(self.nodes().find_one(doc! { "id": id }, None).await?)
    }

    async fn list_configurations(&self) -> Result<Vec<Configuration>, ServiceError> {
        let cursor = self.configurations().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_configurations_by_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Configuration>, ServiceError> {
        let cursor = self
            .configurations()
            .find(doc! { "parentId": parent_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_configuration(
        &self,
        config: Configuration,
    ) -> Result<Configuration, ServiceError> {
        self.configurations()
            .insert_one(&config, None)
            .await
            .map_err(|e| {
                tracing::error!(configuration_id = %config.id, "Failed to insert configuration: {}", e);
                ServiceError::from(e)
            })?;
        Ok(config)
    }

    async fn update_configuration(
        &self,
        config: Configuration,
    ) -> Result<Configuration, ServiceError> {
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.configurations()
            .replace_one(doc! { "id": &config.id }, &config, options)
            .await?;
        Ok(config)
    }

    async fn delete_configuration(&self, id: &str) -> Result<(), ServiceError> {
        self.configurations()
            .delete_one(doc! { "id": id }, None)
            .await?;
        Ok(())
    }

    async fn delete_configurations_by_parent(&self, parent_id: &str) -> Result<(), ServiceError> {
        let result = self
            .configurations()
            .delete_many(doc! { "parentId": parent_id }, None)
            .await?;
        tracing::debug!(
            parent_id = %parent_id,
            deleted = result.deleted_count,
            "Deleted configurations by parent"
        );
        Ok(())
    }

    async fn get_configuration_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Configuration>, ServiceError> {
        Ok(self
            .configurations()
            .find_one(doc! { "id": id }, None)
            .await?)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::from(e)
            })?;
        Ok(())
    }
}
