use crate::models::NodeType;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    #[validate(length(max = 200, message = "Node name must be at most 200 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenameNodeRequest {
    #[validate(length(max = 200, message = "Node name must be at most 200 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNodeResponse {
    pub node_id: String,
    pub configurations_removed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildTypesResponse {
    pub node_id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub allowed_child_types: Vec<NodeType>,
}
