//! Configuration model - a typed settings bundle owned by exactly one node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind carried by an embedded configuration reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Direct,
    Override,
}

/// Embedded pointer from one configuration's payload to another configuration.
///
/// Appears anywhere inside `setting` or `settings` as
/// `{ "configRef": "<id>", "type": "direct" | "override", "description"?: "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationReference {
    pub config_ref: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConfigurationReference {
    pub fn new(config_ref: impl Into<String>, kind: ReferenceKind) -> Self {
        Self {
            config_ref: config_ref.into(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render as the JSON shape stored inside a settings payload.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn default_can_override() -> bool {
    true
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Persisted configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: String,
    /// Owning node. The configuration is "direct" on this node.
    pub parent_id: String,
    pub component_type: String,
    pub component_sub_type: String,
    pub label: String,
    #[serde(default = "empty_object")]
    pub setting: Value,
    #[serde(default)]
    pub settings: Vec<Value>,
    #[serde(default)]
    pub active_setting: Option<Value>,
    pub created_by: String,
    pub update_by: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    /// Informational only: the resolver does not consult it.
    #[serde(default = "default_can_override")]
    pub can_override: bool,
    /// Display name of the owner at last resolution. Not authoritative.
    #[serde(default)]
    pub source_node: String,
}

impl Configuration {
    /// Mint the id used for operator-created configurations.
    pub fn generate_id(component_type: &str, component_sub_type: &str) -> String {
        format!("{}-{}-{}", component_type, component_sub_type, Uuid::new_v4()).to_lowercase()
    }

    /// Whether this configuration is direct on `node_id`.
    pub fn is_direct_on(&self, node_id: &str) -> bool {
        self.parent_id == node_id
    }

    /// Id of the active settings option, if any.
    pub fn active_setting_id(&self) -> Option<&str> {
        self.active_setting
            .as_ref()
            .and_then(|active| active.get("id"))
            .and_then(Value::as_str)
    }

    /// Re-select the active option from `settings` by id so that it mirrors
    /// the current settings element. Clears it when the id no longer exists.
    pub fn resync_active_setting(&mut self) {
        let Some(active_id) = self.active_setting_id().map(str::to_string) else {
            return;
        };
        self.active_setting = self
            .settings
            .iter()
            .find(|option| option.get("id").and_then(Value::as_str) == Some(active_id.as_str()))
            .cloned();
    }

    /// Refresh audit fields after a mutation.
    pub fn touch(&mut self, operator: &str) {
        self.update_by = operator.to_string();
        self.update_time = Utc::now();
    }
}
