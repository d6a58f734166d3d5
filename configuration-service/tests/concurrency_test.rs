//! Concurrent mutations against one manager.

use configuration_service::models::NodeType;
use configuration_service::services::{
    ClosurePolicy, ConfigurationManager, InMemoryStorage, ServiceError,
};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_same_name_admit_one() {
    let manager = Arc::new(ConfigurationManager::new(
        Arc::new(InMemoryStorage::new()),
        ClosurePolicy::Isolated,
    ));
    let app = manager
        .create_node("Main Application", NodeType::Application, None)
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = manager.clone();
            let parent = app.id.clone();
            tokio::spawn(async move {
                manager
                    .create_node("Dup", NodeType::Region, Some(&parent))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => created += 1,
            Err(ServiceError::Validation(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, 15);
    let regions = manager
        .list_nodes()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.node_type == NodeType::Region)
        .count();
    assert_eq!(regions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clones_all_persist() {
    let manager = Arc::new(ConfigurationManager::new(
        Arc::new(InMemoryStorage::new()),
        ClosurePolicy::Isolated,
    ));
    let app = manager
        .create_node("Main Application", NodeType::Application, None)
        .await
        .unwrap();
    let city = manager
        .create_node("City1", NodeType::City, Some(&app.id))
        .await
        .unwrap();
    let draft = configuration_service::services::ConfigurationDraft {
        component_type: "Button".to_string(),
        component_sub_type: "Primary".to_string(),
        label: "Source".to_string(),
        ..Default::default()
    };
    let source = manager
        .create_configuration(&app.id, draft, "system")
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            let (id, destination) = (source.id.clone(), city.id.clone());
            tokio::spawn(async move { manager.clone_configuration(&id, &destination).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task panicked").unwrap();
    }

    let on_city = manager
        .list_configurations()
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.parent_id == city.id)
        .count();
    assert_eq!(on_city, 8);
}
