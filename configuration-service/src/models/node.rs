//! Node model - one element of the organizational hierarchy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Level of a node in the hierarchy.
///
/// Variants are declared top-down so the derived `Ord` gives
/// `Application < Region < City < Department < Desk < User`. A child must
/// always be strictly below its parent in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Application,
    Region,
    City,
    Department,
    Desk,
    User,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Application,
        NodeType::Region,
        NodeType::City,
        NodeType::Department,
        NodeType::Desk,
        NodeType::User,
    ];

    /// Human readable label used in operator-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Application => "Application",
            NodeType::Region => "Region",
            NodeType::City => "City",
            NodeType::Department => "Department",
            NodeType::Desk => "Desk",
            NodeType::User => "User",
        }
    }

    /// Whether a node of this type may sit directly beneath `parent`.
    pub fn can_be_child_of(&self, parent: NodeType) -> bool {
        *self > parent
    }

    /// Types that may be created beneath a node of this type.
    pub fn allowed_child_types(&self) -> Vec<NodeType> {
        NodeType::ALL
            .into_iter()
            .filter(|candidate| candidate.can_be_child_of(*self))
            .collect()
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Application => write!(f, "application"),
            NodeType::Region => write!(f, "region"),
            NodeType::City => write!(f, "city"),
            NodeType::Department => write!(f, "department"),
            NodeType::Desk => write!(f, "desk"),
            NodeType::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application" => Ok(NodeType::Application),
            "region" => Ok(NodeType::Region),
            "city" => Ok(NodeType::City),
            "department" => Ok(NodeType::Department),
            "desk" => Ok(NodeType::Desk),
            "user" => Ok(NodeType::User),
            _ => Err(format!("Invalid node type: {}", s)),
        }
    }
}

/// Flat node record as persisted. Children are never stored; they are
/// derived by grouping on `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub parent_id: Option<String>,
}

impl Node {
    /// Create a new node with a freshly minted id.
    pub fn new(name: impl Into<String>, node_type: NodeType, parent_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            node_type,
            parent_id,
        }
    }

    /// Check if this is a root node.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
