pub mod configuration;
pub mod node;

pub use configuration::{Configuration, ConfigurationReference, ReferenceKind};
pub use node::{Node, NodeType};
