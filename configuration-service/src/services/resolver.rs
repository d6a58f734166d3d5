//! Configuration inheritance resolver.

use crate::models::Configuration;
use crate::services::error::ServiceError;
use crate::services::hierarchy::NodeHierarchy;
use serde::Serialize;
use std::collections::HashMap;

/// A configuration as seen from one selected node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleConfiguration {
    #[serde(flatten)]
    pub configuration: Configuration,
    /// Owned by the selected node rather than an ancestor.
    pub is_direct: bool,
    /// Mirrors `is_direct`: only direct configurations may be edited, moved,
    /// copied or deleted from this node.
    pub editable: bool,
}

/// Compute the configurations visible from `selected_node_id`.
///
/// Every configuration owned by a member of the ancestor chain is returned,
/// `canOverride` is not consulted. Results are ordered root owner first, then
/// by creation time and id. `sourceNode` is set on the returned copies only.
pub fn visible_configurations(
    hierarchy: &NodeHierarchy,
    configurations: Vec<Configuration>,
    selected_node_id: &str,
) -> Result<Vec<VisibleConfiguration>, ServiceError> {
    let chain = hierarchy.ancestor_chain(selected_node_id)?;
    let owners: HashMap<&str, (usize, &str)> = chain
        .iter()
        .enumerate()
        .map(|(depth, node)| (node.id.as_str(), (depth, node.name.as_str())))
        .collect();

    let mut visible: Vec<(usize, VisibleConfiguration)> = configurations
        .into_iter()
        .filter_map(|mut configuration| {
            let (depth, owner_name) = *owners.get(configuration.parent_id.as_str())?;
            configuration.source_node = owner_name.to_string();
            let is_direct = configuration.is_direct_on(selected_node_id);
            Some((
                depth,
                VisibleConfiguration {
                    configuration,
                    is_direct,
                    editable: is_direct,
                },
            ))
        })
        .collect();

    visible.sort_by(|(depth_a, a), (depth_b, b)| {
        depth_a
            .cmp(depth_b)
            .then_with(|| a.configuration.create_time.cmp(&b.configuration.create_time))
            .then_with(|| a.configuration.id.cmp(&b.configuration.id))
    });

    tracing::debug!(
        node_id = %selected_node_id,
        chain_length = chain.len(),
        visible = visible.len(),
        "Resolved visible configurations"
    );

    Ok(visible.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, NodeType};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn node(id: &str, name: &str, node_type: NodeType, parent: Option<&str>) -> Node {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            node_type,
            parent_id: parent.map(str::to_string),
        }
    }

    fn config(id: &str, parent_id: &str, age_secs: i64) -> Configuration {
        let created = Utc::now() - Duration::seconds(age_secs);
        Configuration {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            component_type: "Input".to_string(),
            component_sub_type: "Primary".to_string(),
            label: id.to_string(),
            setting: json!({}),
            settings: vec![],
            active_setting: None,
            created_by: "system".to_string(),
            update_by: "system".to_string(),
            create_time: created,
            update_time: created,
            can_override: false,
            source_node: "stale".to_string(),
        }
    }

    fn hierarchy() -> NodeHierarchy {
        NodeHierarchy::from_nodes(vec![
            node("app1", "Main Application", NodeType::Application, None),
            node("reg1", "North America", NodeType::Region, Some("app1")),
            node("city1", "City1", NodeType::City, Some("reg1")),
            node("city2", "City2", NodeType::City, Some("reg1")),
        ])
    }

    #[test]
    fn test_city_sees_inherited_and_direct() {
        let configs = vec![config("cfgB", "city1", 10), config("cfgA", "app1", 5)];
        let visible = visible_configurations(&hierarchy(), configs, "city1").unwrap();

        let ids: Vec<&str> = visible.iter().map(|v| v.configuration.id.as_str()).collect();
        assert_eq!(ids, vec!["cfgA", "cfgB"]);
        assert!(!visible[0].is_direct);
        assert!(!visible[0].editable);
        assert_eq!(visible[0].configuration.source_node, "Main Application");
        assert!(visible[1].is_direct);
        assert_eq!(visible[1].configuration.source_node, "City1");
    }

    #[test]
    fn test_region_does_not_see_descendant_configurations() {
        let configs = vec![
            config("cfgA", "app1", 5),
            config("cfgB", "city1", 10),
            config("cfgC", "city2", 10),
        ];
        let visible = visible_configurations(&hierarchy(), configs, "reg1").unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].configuration.id, "cfgA");
    }

    #[test]
    fn test_can_override_is_not_consulted() {
        let configs = vec![config("cfgA", "app1", 5), config("cfgA2", "city1", 5)];
        let visible = visible_configurations(&hierarchy(), configs, "city1").unwrap();
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_same_owner_ordered_by_creation_time() {
        let configs = vec![config("late", "app1", 1), config("early", "app1", 100)];
        let visible = visible_configurations(&hierarchy(), configs, "app1").unwrap();
        assert_eq!(visible[0].configuration.id, "early");
        assert!(visible.iter().all(|v| v.is_direct));
    }

    #[test]
    fn test_unknown_node_is_not_found() {
        let err = visible_configurations(&hierarchy(), vec![], "ghost").unwrap_err();
        assert!(err.is_not_found());
    }
}
