//! Configuration manager - node and configuration operations over a storage backend.
//!
//! Every read rebuilds its projection from storage, so a resolution issued
//! after a mutation always sees the post-mutation records. Writes are
//! serialised through one async gate.

use crate::models::{Configuration, Node, NodeType};
use crate::services::cloning::{clone_with_references, CloneLedger, CloneReport, ClosurePolicy};
use crate::services::error::ServiceError;
use crate::services::hierarchy::{NodeHierarchy, NodePath, NodeTree};
use crate::services::references::{validate_reference_payload, ReferenceGraph};
use crate::services::resolver::{visible_configurations, VisibleConfiguration};
use crate::services::storage::Storage;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Operator input for creating or replacing a configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationDraft {
    pub component_type: String,
    pub component_sub_type: String,
    pub label: String,
    pub setting: Option<Value>,
    pub settings: Option<Value>,
    pub active_setting_id: Option<String>,
    pub can_override: Option<bool>,
}

struct ValidatedPayload {
    component_type: String,
    component_sub_type: String,
    label: String,
    setting: Value,
    settings: Vec<Value>,
    active_setting: Option<Value>,
}

impl ConfigurationDraft {
    fn validate(self) -> Result<ValidatedPayload, ServiceError> {
        let component_type = required(&self.component_type, "componentType")?;
        let component_sub_type = required(&self.component_sub_type, "componentSubType")?;
        let label = required(&self.label, "label")?;

        let setting = match self.setting {
            None => Value::Object(serde_json::Map::new()),
            Some(value @ Value::Object(_)) => value,
            Some(_) => return Err(ServiceError::validation("setting must be a JSON object")),
        };

        let settings = match self.settings {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ServiceError::validation("settings must be an array")),
        };
        let mut seen = std::collections::HashSet::new();
        for (position, option) in settings.iter().enumerate() {
            let id = option
                .as_object()
                .and_then(|map| map.get("id"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ServiceError::validation(format!(
                        "settings[{}] must be an object with a string id",
                        position
                    ))
                })?;
            if !seen.insert(id) {
                return Err(ServiceError::validation(format!(
                    "settings contains duplicate id \"{}\"",
                    id
                )));
            }
        }

        validate_reference_payload(&setting).map_err(ServiceError::Validation)?;
        for option in &settings {
            validate_reference_payload(option).map_err(ServiceError::Validation)?;
        }

        let active_setting = match self.active_setting_id.as_deref() {
            None | Some("") => None,
            Some(active_id) => Some(
                settings
                    .iter()
                    .find(|option| option.get("id").and_then(Value::as_str) == Some(active_id))
                    .cloned()
                    .ok_or_else(|| {
                        ServiceError::validation(format!(
                            "activeSettingId \"{}\" does not match any settings entry",
                            active_id
                        ))
                    })?,
            ),
        };

        Ok(ValidatedPayload {
            component_type,
            component_sub_type,
            label,
            setting,
            settings,
            active_setting,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// One outgoing reference of a configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub configuration_id: String,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_node_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceReport {
    pub configuration_id: String,
    pub references: Vec<ReferenceEntry>,
    /// Configurations whose payload references this one.
    pub dependents: Vec<String>,
}

/// Configurations a clone of `root_id` would copy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosurePreview {
    pub root_id: String,
    pub members: Vec<String>,
}

pub struct ConfigurationManager {
    storage: Arc<dyn Storage>,
    write_gate: Mutex<()>,
    closure_policy: ClosurePolicy,
}

impl ConfigurationManager {
    pub fn new(storage: Arc<dyn Storage>, closure_policy: ClosurePolicy) -> Self {
        Self {
            storage,
            write_gate: Mutex::new(()),
            closure_policy,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn closure_policy(&self) -> ClosurePolicy {
        self.closure_policy
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.storage.health_check().await
    }

    async fn hierarchy(&self) -> Result<NodeHierarchy, ServiceError> {
        Ok(NodeHierarchy::from_nodes(self.storage.list_nodes().await?))
    }

    async fn require_node(&self, id: &str) -> Result<Node, ServiceError> {
        self.storage
            .get_node_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NodeNotFound(id.to_string()))
    }

    async fn require_configuration(&self, id: &str) -> Result<Configuration, ServiceError> {
        self.storage
            .get_configuration_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::ConfigurationNotFound(id.to_string()))
    }

    /// Load every id and check it is direct on `context_node_id` before any
    /// write happens.
    async fn require_direct(
        &self,
        context_node_id: &str,
        ids: &[String],
    ) -> Result<Vec<Configuration>, ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::validation(
                "At least one configuration must be selected",
            ));
        }
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            if selected.iter().any(|c: &Configuration| &c.id == id) {
                continue;
            }
            let config = self.require_configuration(id).await?;
            if !config.is_direct_on(context_node_id) {
                return Err(ServiceError::Inherited {
                    configuration_id: id.clone(),
                    node_id: context_node_id.to_string(),
                });
            }
            selected.push(config);
        }
        Ok(selected)
    }

    fn record_mutation(operation: &'static str, count: usize) {
        metrics::counter!("configuration_mutations_total", "operation" => operation)
            .increment(count as u64);
    }

    // Nodes

    pub async fn list_nodes(&self) -> Result<Vec<Node>, ServiceError> {
        self.storage.list_nodes().await
    }

    pub async fn get_node(&self, id: &str) -> Result<Node, ServiceError> {
        self.require_node(id).await
    }

    pub async fn node_tree(&self) -> Result<Vec<NodeTree>, ServiceError> {
        Ok(self.hierarchy().await?.tree())
    }

    pub async fn node_paths(&self) -> Result<Vec<NodePath>, ServiceError> {
        Ok(self.hierarchy().await?.node_paths())
    }

    /// Root-first chain ending at `id`.
    pub async fn ancestors(&self, id: &str) -> Result<Vec<Node>, ServiceError> {
        let hierarchy = self.hierarchy().await?;
        let chain = hierarchy.ancestor_chain(id)?;
        Ok(chain.into_iter().cloned().collect())
    }

    pub async fn allowed_child_types(&self, id: &str) -> Result<Vec<NodeType>, ServiceError> {
        Ok(self.require_node(id).await?.node_type.allowed_child_types())
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_node(
        &self,
        name: &str,
        node_type: NodeType,
        parent_id: Option<&str>,
    ) -> Result<Node, ServiceError> {
        let _gate = self.write_gate.lock().await;
        let hierarchy = self.hierarchy().await?;
        hierarchy.validate_placement(name, node_type, parent_id, None)?;

        let node = Node::new(name.trim(), node_type, parent_id.map(str::to_string));
        let node = self.storage.create_node(node).await?;
        Self::record_mutation("create_node", 1);
        tracing::info!(node_id = %node.id, node_type = %node.node_type, "Node created");
        Ok(node)
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename_node(&self, id: &str, name: &str) -> Result<Node, ServiceError> {
        let _gate = self.write_gate.lock().await;
        let hierarchy = self.hierarchy().await?;
        let mut node = hierarchy.require(id)?.clone();
        hierarchy.validate_placement(name, node.node_type, node.parent_id.as_deref(), Some(id))?;

        node.name = name.trim().to_string();
        let node = self.storage.update_node(node).await?;
        Self::record_mutation("rename_node", 1);
        tracing::info!(node_id = %node.id, "Node renamed");
        Ok(node)
    }

    /// Delete a node and the configurations it owns directly.
    ///
    /// Descendant nodes and their configurations are left in place.
    #[tracing::instrument(skip(self))]
    pub async fn delete_node(&self, id: &str) -> Result<usize, ServiceError> {
        let _gate = self.write_gate.lock().await;
        self.require_node(id).await?;

        let owned = self.storage.list_configurations_by_parent(id).await?.len();
        self.storage.delete_configurations_by_parent(id).await?;
        self.storage.delete_node(id).await?;

        Self::record_mutation("delete_node", 1);
        tracing::info!(node_id = %id, configurations_removed = owned, "Node deleted");
        Ok(owned)
    }

    // Configurations

    pub async fn list_configurations(&self) -> Result<Vec<Configuration>, ServiceError> {
        self.storage.list_configurations().await
    }

    pub async fn get_configuration(&self, id: &str) -> Result<Configuration, ServiceError> {
        self.require_configuration(id).await
    }

    pub async fn visible_configurations(
        &self,
        node_id: &str,
    ) -> Result<Vec<VisibleConfiguration>, ServiceError> {
        let hierarchy = self.hierarchy().await?;
        let configurations = self.storage.list_configurations().await?;
        visible_configurations(&hierarchy, configurations, node_id)
    }

    #[tracing::instrument(skip(self, draft))]
    pub async fn create_configuration(
        &self,
        node_id: &str,
        draft: ConfigurationDraft,
        operator: &str,
    ) -> Result<Configuration, ServiceError> {
        let can_override = draft.can_override.unwrap_or(true);
        let payload = draft.validate()?;

        let _gate = self.write_gate.lock().await;
        let owner = self.require_node(node_id).await?;

        let now = Utc::now();
        let config = Configuration {
            id: Configuration::generate_id(&payload.component_type, &payload.component_sub_type),
            parent_id: owner.id.clone(),
            component_type: payload.component_type,
            component_sub_type: payload.component_sub_type,
            label: payload.label,
            setting: payload.setting,
            settings: payload.settings,
            active_setting: payload.active_setting,
            created_by: operator.to_string(),
            update_by: operator.to_string(),
            create_time: now,
            update_time: now,
            can_override,
            source_node: owner.name.clone(),
        };

        let config = self.storage.create_configuration(config).await?;
        Self::record_mutation("create", 1);
        tracing::info!(configuration_id = %config.id, node_id = %node_id, "Configuration created");
        Ok(config)
    }

    /// Replace the editable fields of a configuration direct on `node_id`.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_configuration(
        &self,
        node_id: &str,
        id: &str,
        draft: ConfigurationDraft,
        operator: &str,
    ) -> Result<Configuration, ServiceError> {
        let can_override = draft.can_override;
        let payload = draft.validate()?;

        let _gate = self.write_gate.lock().await;
        let owner = self.require_node(node_id).await?;
        let mut config = self
            .require_direct(node_id, &[id.to_string()])
            .await?
            .remove(0);

        config.component_type = payload.component_type;
        config.component_sub_type = payload.component_sub_type;
        config.label = payload.label;
        config.setting = payload.setting;
        config.settings = payload.settings;
        config.active_setting = payload.active_setting;
        if let Some(can_override) = can_override {
            config.can_override = can_override;
        }
        config.source_node = owner.name;
        config.touch(operator);

        let config = self.storage.update_configuration(config).await?;
        Self::record_mutation("update", 1);
        tracing::info!(configuration_id = %config.id, "Configuration updated");
        Ok(config)
    }

    /// Re-home configurations onto `destination_id`. Ids and references are
    /// unchanged.
    #[tracing::instrument(skip(self, ids))]
    pub async fn move_configurations(
        &self,
        context_node_id: &str,
        ids: &[String],
        destination_id: &str,
        operator: &str,
    ) -> Result<Vec<Configuration>, ServiceError> {
        let _gate = self.write_gate.lock().await;
        self.require_node(context_node_id).await?;
        let selected = self.require_direct(context_node_id, ids).await?;
        let destination = self.require_node(destination_id).await?;
        if destination.id == context_node_id {
            return Err(ServiceError::validation(
                "Configurations already belong to the destination node",
            ));
        }

        let mut moved = Vec::with_capacity(selected.len());
        for mut config in selected {
            config.parent_id = destination.id.clone();
            config.source_node = destination.name.clone();
            config.touch(operator);
            moved.push(self.storage.update_configuration(config).await?);
        }

        Self::record_mutation("move", moved.len());
        tracing::info!(
            from = %context_node_id,
            to = %destination.id,
            count = moved.len(),
            "Configurations moved"
        );
        Ok(moved)
    }

    /// Clone each selected configuration with its reference closure onto
    /// `destination_id`. `policy` falls back to the configured default.
    #[tracing::instrument(skip(self, ids))]
    pub async fn copy_configurations(
        &self,
        context_node_id: &str,
        ids: &[String],
        destination_id: &str,
        policy: Option<ClosurePolicy>,
    ) -> Result<Vec<CloneReport>, ServiceError> {
        let _gate = self.write_gate.lock().await;
        self.require_node(context_node_id).await?;
        let selected = self.require_direct(context_node_id, ids).await?;
        let destination = self.require_node(destination_id).await?;
        let reports = self
            .clone_selection(&selected, &destination, policy.unwrap_or(self.closure_policy))
            .await?;
        Self::record_mutation("copy", reports.len());
        Ok(reports)
    }

    /// Copy onto the node that already owns the selection.
    #[tracing::instrument(skip(self, ids))]
    pub async fn duplicate_configurations(
        &self,
        context_node_id: &str,
        ids: &[String],
        policy: Option<ClosurePolicy>,
    ) -> Result<Vec<CloneReport>, ServiceError> {
        let _gate = self.write_gate.lock().await;
        let owner = self.require_node(context_node_id).await?;
        let selected = self.require_direct(context_node_id, ids).await?;
        let reports = self
            .clone_selection(&selected, &owner, policy.unwrap_or(self.closure_policy))
            .await?;
        Self::record_mutation("duplicate", reports.len());
        Ok(reports)
    }

    async fn clone_selection(
        &self,
        selected: &[Configuration],
        destination: &Node,
        policy: ClosurePolicy,
    ) -> Result<Vec<CloneReport>, ServiceError> {
        let mut shared = CloneLedger::new();
        let mut reports = Vec::with_capacity(selected.len());
        for config in selected {
            let mut isolated = CloneLedger::new();
            let ledger = match policy {
                ClosurePolicy::Isolated => &mut isolated,
                ClosurePolicy::Shared => &mut shared,
            };
            reports.push(
                clone_with_references(self.storage.as_ref(), &config.id, destination, ledger)
                    .await?,
            );
        }
        Ok(reports)
    }

    #[tracing::instrument(skip(self, ids))]
    pub async fn delete_configurations(
        &self,
        context_node_id: &str,
        ids: &[String],
    ) -> Result<usize, ServiceError> {
        let _gate = self.write_gate.lock().await;
        self.require_node(context_node_id).await?;
        let selected = self.require_direct(context_node_id, ids).await?;
        for config in &selected {
            self.storage.delete_configuration(&config.id).await?;
        }
        Self::record_mutation("delete", selected.len());
        tracing::info!(node_id = %context_node_id, count = selected.len(), "Configurations deleted");
        Ok(selected.len())
    }

    /// Clone one closure onto any node, outside of a node selection context.
    #[tracing::instrument(skip(self))]
    pub async fn clone_configuration(
        &self,
        id: &str,
        destination_id: &str,
    ) -> Result<CloneReport, ServiceError> {
        let _gate = self.write_gate.lock().await;
        self.require_configuration(id).await?;
        let destination = self.require_node(destination_id).await?;
        let mut ledger = CloneLedger::new();
        let report =
            clone_with_references(self.storage.as_ref(), id, &destination, &mut ledger).await?;
        Self::record_mutation("clone", 1);
        Ok(report)
    }

    // Reference inspection

    pub async fn references(&self, id: &str) -> Result<ReferenceReport, ServiceError> {
        let configurations = self.storage.list_configurations().await?;
        let graph = ReferenceGraph::build(&configurations);
        if !graph.contains(id) {
            return Err(ServiceError::ConfigurationNotFound(id.to_string()));
        }

        let references = graph
            .references_of(id)
            .iter()
            .map(|target| {
                let found = configurations.iter().find(|c| &c.id == target);
                ReferenceEntry {
                    configuration_id: target.clone(),
                    resolved: found.is_some(),
                    label: found.map(|c| c.label.clone()),
                    owner_node_id: found.map(|c| c.parent_id.clone()),
                }
            })
            .collect();

        Ok(ReferenceReport {
            configuration_id: id.to_string(),
            references,
            dependents: graph.dependents_of(id).to_vec(),
        })
    }

    /// Preview of the closure a clone would copy. Fails like the clone would
    /// on a dangling reference.
    pub async fn closure(&self, id: &str) -> Result<ClosurePreview, ServiceError> {
        let configurations = self.storage.list_configurations().await?;
        let graph = ReferenceGraph::build(&configurations);
        let closure = graph.closure(id);
        if let Some(missing) = closure.missing.into_iter().next() {
            return Err(ServiceError::ConfigurationNotFound(missing));
        }
        Ok(ClosurePreview {
            root_id: id.to_string(),
            members: closure.members,
        })
    }
}
