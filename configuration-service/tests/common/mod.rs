//! Common test utilities for configuration-service integration tests.

#![allow(dead_code)]

use configuration_service::config::ServiceConfig;
use configuration_service::services::{ClosurePolicy, InMemoryStorage, Storage};
use configuration_service::startup::Application;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::sync::Arc;

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
    pub storage: Arc<dyn Storage>,
}

impl TestApp {
    /// Spawn an empty in-memory instance on a random port.
    pub async fn spawn() -> Self {
        Self::spawn_with(ServiceConfig::in_memory(0)).await
    }

    /// Spawn with a different default copy policy.
    pub async fn spawn_with_policy(policy: ClosurePolicy) -> Self {
        let mut config = ServiceConfig::in_memory(0);
        config.copy_closure_policy = policy;
        Self::spawn_with(config).await
    }

    /// Spawn with the sample hierarchy and configurations loaded.
    pub async fn spawn_seeded() -> Self {
        let mut config = ServiceConfig::in_memory(0);
        config.seed_sample_data = true;
        Self::spawn_with(config).await
    }

    pub async fn spawn_with(config: ServiceConfig) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let application = Application::build_with_storage(config, storage.clone())
            .await
            .expect("Failed to build application");

        let port = application.http_port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            let _ = application.run_until_stopped().await;
        });

        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            storage,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a node and return its id.
    pub async fn create_node(&self, name: &str, node_type: &str, parent_id: Option<&str>) -> String {
        let response = self
            .post(
                "/nodes",
                &json!({ "name": name, "type": node_type, "parentId": parent_id }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "node {} not created", name);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_str().expect("node id").to_string()
    }

    /// Create a configuration on `node_id` and return its id.
    pub async fn create_configuration(&self, node_id: &str, label: &str, setting: Value) -> String {
        let response = self
            .post(
                &format!("/nodes/{}/configurations", node_id),
                &json!({
                    "componentType": "Button",
                    "componentSubType": "Primary",
                    "label": label,
                    "setting": setting,
                }),
            )
            .await;
        assert_eq!(
            response.status().as_u16(),
            201,
            "configuration {} not created",
            label
        );
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_str().expect("configuration id").to_string()
    }

    pub async fn configuration(&self, id: &str) -> Value {
        let response = self.get(&format!("/configurations/{}", id)).await;
        assert!(response.status().is_success(), "configuration {} missing", id);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn configuration_count(&self) -> usize {
        self.storage
            .list_configurations()
            .await
            .expect("Failed to list configurations")
            .len()
    }

    /// Ids of everything visible from `node_id`, in display order.
    pub async fn visible_ids(&self, node_id: &str) -> Vec<String> {
        let response = self.get(&format!("/nodes/{}/configurations", node_id)).await;
        assert!(response.status().is_success());
        let body: Vec<Value> = response.json().await.expect("Failed to parse JSON");
        body.iter()
            .map(|c| c["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// The sample application branch: app > region > city.
pub struct Branch {
    pub app: String,
    pub region: String,
    pub city: String,
}

pub async fn create_branch(app: &TestApp) -> Branch {
    let app_id = app
        .create_node("Main Application", "application", None)
        .await;
    let region = app
        .create_node("North America", "region", Some(&app_id))
        .await;
    let city = app.create_node("City1", "city", Some(&region)).await;
    Branch {
        app: app_id,
        region,
        city,
    }
}

pub fn reference(id: &str) -> Value {
    json!({ "configRef": id, "type": "direct" })
}
