pub mod configurations;
pub mod nodes;

pub use configurations::{
    CloneConfigurationRequest, ConfigurationRequest, CopyConfigurationsRequest,
    CopyConfigurationsResponse, DeleteConfigurationsRequest, DeleteConfigurationsResponse,
    DuplicateConfigurationsRequest, MoveConfigurationsRequest, MoveConfigurationsResponse,
};
pub use nodes::{ChildTypesResponse, CreateNodeRequest, DeleteNodeResponse, RenameNodeRequest};
