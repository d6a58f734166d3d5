pub mod cloning;
pub mod database;
pub mod error;
pub mod hierarchy;
pub mod manager;
pub mod metrics;
pub mod references;
pub mod resolver;
pub mod seed;
pub mod storage;

pub use cloning::{CloneLedger, CloneReport, ClosurePolicy};
pub use database::MongoStorage;
pub use error::ServiceError;
pub use manager::{ConfigurationDraft, ConfigurationManager};
pub use self::metrics::{get_metrics, init_metrics};
pub use storage::{InMemoryStorage, Storage};
