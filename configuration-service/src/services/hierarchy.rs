//! Node hierarchy model - a read-only projection rebuilt from flat node records.

use crate::models::{Node, NodeType};
use crate::services::error::ServiceError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One node with its derived children, as served by the tree endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTree {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<NodeTree>,
}

/// Flat listing entry with a display path for the database viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePath {
    #[serde(flatten)]
    pub node: Node,
    pub path: String,
}

/// Arena of nodes indexed by id with children grouped by parent id.
#[derive(Debug, Default)]
pub struct NodeHierarchy {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl NodeHierarchy {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, node) in nodes.iter().enumerate() {
            index.insert(node.id.clone(), position);
            if let Some(parent_id) = &node.parent_id {
                children.entry(parent_id.clone()).or_default().push(position);
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| nodes[*a].name.cmp(&nodes[*b].name));
        }
        Self {
            nodes,
            index,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|position| &self.nodes[*position])
    }

    pub fn require(&self, id: &str) -> Result<&Node, ServiceError> {
        self.get(id)
            .ok_or_else(|| ServiceError::NodeNotFound(id.to_string()))
    }

    /// Direct children of `id`, ordered by name.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &Node> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .map(|position| &self.nodes[*position])
    }

    /// Root-first chain ending at `id` inclusive.
    ///
    /// A dangling parent pointer ends the chain at the last resolvable node; a
    /// parent cycle in corrupted data is reported as a storage failure.
    pub fn ancestor_chain(&self, id: &str) -> Result<Vec<&Node>, ServiceError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(self.require(id)?);
        while let Some(node) = current {
            if !seen.insert(node.id.as_str()) {
                return Err(ServiceError::Storage(anyhow::anyhow!(
                    "Parent cycle detected at node {}",
                    node.id
                )));
            }
            chain.push(node);
            current = node.parent_id.as_deref().and_then(|parent| self.get(parent));
        }
        chain.reverse();
        Ok(chain)
    }

    /// Root application of `id`, when the chain reaches one.
    pub fn application_of(&self, id: &str) -> Result<Option<&Node>, ServiceError> {
        let chain = self.ancestor_chain(id)?;
        Ok(chain
            .first()
            .copied()
            .filter(|root| root.node_type == NodeType::Application))
    }

    /// Depth of `id` below its root (roots have depth 0).
    pub fn depth(&self, id: &str) -> Result<usize, ServiceError> {
        Ok(self.ancestor_chain(id)?.len() - 1)
    }

    /// Whether `name` is free for `node_type` within one application subtree.
    ///
    /// The scan walks descendants of `application_id` only, compares names
    /// case-insensitively, and skips `exclude_node_id`.
    pub fn is_node_name_unique(
        &self,
        node_type: NodeType,
        name: &str,
        application_id: &str,
        exclude_node_id: Option<&str>,
    ) -> bool {
        let wanted = name.trim().to_lowercase();
        let mut stack: Vec<&Node> = self.get(application_id).into_iter().collect();
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            if node.node_type == node_type
                && Some(node.id.as_str()) != exclude_node_id
                && node.name.trim().to_lowercase() == wanted
            {
                return false;
            }
            stack.extend(self.children(&node.id));
        }
        true
    }

    /// Application names are compared across all roots.
    pub fn is_application_name_unique(&self, name: &str, exclude_node_id: Option<&str>) -> bool {
        let wanted = name.trim().to_lowercase();
        !self.nodes.iter().any(|node| {
            node.node_type == NodeType::Application
                && Some(node.id.as_str()) != exclude_node_id
                && node.name.trim().to_lowercase() == wanted
        })
    }

    fn is_root(&self, node: &Node) -> bool {
        match &node.parent_id {
            None => true,
            Some(parent_id) => !self.index.contains_key(parent_id),
        }
    }

    fn subtree(&self, position: usize, visited: &mut HashSet<usize>) -> NodeTree {
        visited.insert(position);
        let node = &self.nodes[position];
        let pending: Vec<usize> = self
            .children
            .get(&node.id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|child| !visited.contains(child))
            .collect();
        let children = pending
            .into_iter()
            .map(|child| self.subtree(child, visited))
            .collect();
        NodeTree {
            node: node.clone(),
            children,
        }
    }

    /// Forest projection. Roots are applications plus orphans whose parent id
    /// no longer resolves, ordered by name.
    pub fn tree(&self) -> Vec<NodeTree> {
        let mut roots: Vec<usize> = (0..self.nodes.len())
            .filter(|position| self.is_root(&self.nodes[*position]))
            .collect();
        roots.sort_by(|a, b| self.nodes[*a].name.cmp(&self.nodes[*b].name));

        let mut visited = HashSet::new();
        roots
            .into_iter()
            .map(|root| self.subtree(root, &mut visited))
            .collect()
    }

    /// Every node with its `"Root > ... > Node"` display path, sorted by path.
    pub fn node_paths(&self) -> Vec<NodePath> {
        let mut paths: Vec<NodePath> = self
            .nodes
            .iter()
            .map(|node| {
                let path = match self.ancestor_chain(&node.id) {
                    Ok(chain) => chain
                        .iter()
                        .map(|n| n.name.as_str())
                        .collect::<Vec<_>>()
                        .join(" > "),
                    Err(_) => node.name.clone(),
                };
                NodePath {
                    node: node.clone(),
                    path,
                }
            })
            .collect();
        paths.sort_by(|a, b| a.path.cmp(&b.path));
        paths
    }

    /// Validate a prospective node placement and name.
    ///
    /// Shared by create and rename; `exclude_node_id` is the renamed node.
    pub fn validate_placement(
        &self,
        name: &str,
        node_type: NodeType,
        parent_id: Option<&str>,
        exclude_node_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Node name is required"));
        }

        let Some(parent_id) = parent_id else {
            if node_type != NodeType::Application {
                return Err(ServiceError::validation(format!(
                    "{} nodes must have a parent",
                    node_type.label()
                )));
            }
            if !self.is_application_name_unique(name, exclude_node_id) {
                return Err(ServiceError::validation(format!(
                    "An application named \"{}\" already exists",
                    name
                )));
            }
            return Ok(());
        };

        if node_type == NodeType::Application {
            return Err(ServiceError::validation(
                "Application nodes cannot have a parent",
            ));
        }

        let parent = self.require(parent_id)?;
        if !node_type.can_be_child_of(parent.node_type) {
            return Err(ServiceError::validation(format!(
                "A {} cannot be placed under a {}",
                node_type.label(),
                parent.node_type.label()
            )));
        }

        let application = self.application_of(parent_id)?.ok_or_else(|| {
            ServiceError::validation(format!(
                "Node {} does not belong to an application",
                parent_id
            ))
        })?;

        if !self.is_node_name_unique(node_type, name, &application.id, exclude_node_id) {
            return Err(ServiceError::validation(format!(
                "A {} named \"{}\" already exists in {}",
                node_type.label(),
                name,
                application.name
            )));
        }
        Ok(())
    }
}
