//! Sample hierarchy and configurations for a fresh, empty store.

use crate::models::{Configuration, ConfigurationReference, Node, NodeType, ReferenceKind};
use crate::services::error::ServiceError;
use crate::services::storage::Storage;
use chrono::Utc;
use serde_json::{json, Value};

const SAMPLE_CONFIGURATIONS: usize = 40;
const COMPONENT_TYPES: [&str; 5] = ["Button", "Input", "Table", "Form", "Chart"];
const COMPONENT_SUB_TYPES: [&str; 3] = ["Primary", "Secondary", "Tertiary"];
const COLORS: [&str; 3] = ["red", "blue", "green"];
const SIZES: [&str; 3] = ["small", "medium", "large"];

pub fn sample_nodes() -> Vec<Node> {
    [
        ("app1", "Main Application", NodeType::Application, None),
        ("reg1", "North America", NodeType::Region, Some("app1")),
        ("city1", "New York", NodeType::City, Some("reg1")),
        ("dept1", "Finance", NodeType::Department, Some("city1")),
        ("desk1", "Trading Desk", NodeType::Desk, Some("dept1")),
        ("user1", "John Trader", NodeType::User, Some("desk1")),
        ("city2", "San Francisco", NodeType::City, Some("reg1")),
        ("dept2", "Technology", NodeType::Department, Some("city2")),
    ]
    .into_iter()
    .map(|(id, name, node_type, parent)| Node {
        id: id.to_string(),
        name: name.to_string(),
        node_type,
        parent_id: parent.map(str::to_string),
    })
    .collect()
}

/// Deterministic configurations spread over the sample nodes. From the
/// twelfth on, every third one references one of the first ten. Empty when
/// there are no nodes to own them.
pub fn sample_configurations(nodes: &[Node]) -> Vec<Configuration> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let now = Utc::now();
    (0..SAMPLE_CONFIGURATIONS)
        .map(|i| {
            let owner = &nodes[i % nodes.len()];
            let mut setting = json!({
                "color": COLORS[i % COLORS.len()],
                "size": SIZES[(i / 3) % SIZES.len()],
            });
            if i > 10 && i % 3 == 0 {
                let target = format!("1d{}", (i % 10) + 1);
                let kind = if i % 2 == 0 {
                    ReferenceKind::Direct
                } else {
                    ReferenceKind::Override
                };
                let reference = ConfigurationReference::new(target.clone(), kind)
                    .with_description(format!("Reference to configuration {}", target));
                if let Value::Object(map) = &mut setting {
                    map.insert("reference".to_string(), reference.to_value());
                }
            }
            let settings = vec![
                json!({ "id": "setting1", "value": "value1" }),
                json!({ "id": "setting2", "value": "value2" }),
            ];
            Configuration {
                id: format!("1d{}", i + 1),
                parent_id: owner.id.clone(),
                component_type: COMPONENT_TYPES[i % COMPONENT_TYPES.len()].to_string(),
                component_sub_type: COMPONENT_SUB_TYPES[i % COMPONENT_SUB_TYPES.len()]
                    .to_string(),
                label: format!("Configuration {}", i + 1),
                setting,
                active_setting: settings.first().cloned(),
                settings,
                created_by: "system".to_string(),
                update_by: "system".to_string(),
                create_time: now,
                update_time: now,
                can_override: i % 2 == 0,
                source_node: owner.name.clone(),
            }
        })
        .collect()
}

/// Seed the sample data when the store holds no nodes. Returns whether
/// anything was written.
pub async fn seed_sample_data(storage: &dyn Storage) -> Result<bool, ServiceError> {
    if !storage.list_nodes().await?.is_empty() {
        tracing::debug!("Store already has nodes, skipping sample data");
        return Ok(false);
    }

    let nodes = sample_nodes();
    let configurations = sample_configurations(&nodes);
    let (node_count, configuration_count) = (nodes.len(), configurations.len());

    for node in nodes {
        storage.create_node(node).await?;
    }
    for configuration in configurations {
        storage.create_configuration(configuration).await?;
    }

    tracing::info!(
        nodes = node_count,
        configurations = configuration_count,
        "Sample data initialized"
    );
    Ok(true)
}
