use crate::models::Configuration;
use crate::services::{CloneReport, ClosurePolicy, ConfigurationDraft};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Body for creating or replacing a configuration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRequest {
    #[validate(length(max = 100))]
    pub component_type: String,
    #[validate(length(max = 100))]
    pub component_sub_type: String,
    #[validate(length(max = 200))]
    pub label: String,
    #[serde(default)]
    pub setting: Option<Value>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub active_setting_id: Option<String>,
    #[serde(default)]
    pub can_override: Option<bool>,
}

impl From<ConfigurationRequest> for ConfigurationDraft {
    fn from(req: ConfigurationRequest) -> Self {
        Self {
            component_type: req.component_type,
            component_sub_type: req.component_sub_type,
            label: req.label,
            setting: req.setting,
            settings: req.settings,
            active_setting_id: req.active_setting_id,
            can_override: req.can_override,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MoveConfigurationsRequest {
    #[validate(length(min = 1, message = "Select at least one configuration"))]
    pub configuration_ids: Vec<String>,
    pub destination_node_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CopyConfigurationsRequest {
    #[validate(length(min = 1, message = "Select at least one configuration"))]
    pub configuration_ids: Vec<String>,
    pub destination_node_id: String,
    #[serde(default)]
    pub policy: Option<ClosurePolicy>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateConfigurationsRequest {
    #[validate(length(min = 1, message = "Select at least one configuration"))]
    pub configuration_ids: Vec<String>,
    #[serde(default)]
    pub policy: Option<ClosurePolicy>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfigurationsRequest {
    #[validate(length(min = 1, message = "Select at least one configuration"))]
    pub configuration_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneConfigurationRequest {
    pub destination_node_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveConfigurationsResponse {
    pub destination_node_id: String,
    pub moved: Vec<Configuration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyConfigurationsResponse {
    pub destination_node_id: String,
    pub policy: ClosurePolicy,
    pub copies: Vec<CloneReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfigurationsResponse {
    pub node_id: String,
    pub deleted: usize,
}
