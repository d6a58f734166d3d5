//! Deep-clone engine for configuration reference closures.

use crate::models::{Configuration, Node};
use crate::services::error::ServiceError;
use crate::services::references::{configuration_references, rewrite_configuration};
use crate::services::storage::Storage;
use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a multi-select copy shares its original-to-clone id map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosurePolicy {
    /// Each selected configuration is cloned with a fresh map, so overlapping
    /// closures produce separate copies.
    #[default]
    Isolated,
    /// One map across the whole selection: a configuration reachable from two
    /// selected roots is cloned once and both clones point at it.
    Shared,
}

impl std::str::FromStr for ClosurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "isolated" => Ok(ClosurePolicy::Isolated),
            "shared" => Ok(ClosurePolicy::Shared),
            _ => Err(format!("Invalid closure policy: {}", s)),
        }
    }
}

/// Original-id to clone-id accumulator threaded through one clone run.
///
/// An id is recorded as soon as its clone id is allocated, before its
/// references are visited, which is what makes reference cycles terminate.
#[derive(Debug, Default, Clone)]
pub struct CloneLedger {
    processed: HashMap<String, String>,
    created: Vec<(String, String)>,
}

impl CloneLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original_id: &str) -> Option<&str> {
        self.processed.get(original_id).map(String::as_str)
    }

    pub fn contains(&self, original_id: &str) -> bool {
        self.processed.contains_key(original_id)
    }

    /// `(original, clone)` pairs in the order the clones were persisted.
    pub fn created(&self) -> &[(String, String)] {
        &self.created
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    fn allocate(&mut self, original: &Configuration) -> String {
        let new_id =
            Configuration::generate_id(&original.component_type, &original.component_sub_type);
        self.processed.insert(original.id.clone(), new_id.clone());
        new_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonedConfiguration {
    pub original_id: String,
    pub new_id: String,
}

/// Outcome of cloning one root configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneReport {
    pub root_id: String,
    pub new_root_id: String,
    pub destination_node_id: String,
    /// Records created by this call. Empty when a shared ledger already held
    /// the whole closure.
    pub cloned: Vec<ClonedConfiguration>,
}

/// Clone `config_id` and everything it transitively references onto
/// `destination`, returning the id of the clone of `config_id`.
///
/// A missing configuration anywhere in the closure fails the whole call.
/// Records already persisted before the failure are left in place.
pub fn clone_configuration<'a>(
    storage: &'a dyn Storage,
    config_id: &'a str,
    destination: &'a Node,
    ledger: &'a mut CloneLedger,
) -> BoxFuture<'a, Result<String, ServiceError>> {
    Box::pin(async move {
        if let Some(existing) = ledger.get(config_id) {
            return Ok(existing.to_string());
        }

        let original = storage
            .get_configuration_by_id(config_id)
            .await?
            .ok_or_else(|| ServiceError::ConfigurationNotFound(config_id.to_string()))?;

        let new_id = ledger.allocate(&original);

        for reference in configuration_references(&original) {
            if !ledger.contains(&reference) {
                clone_configuration(storage, &reference, destination, ledger).await?;
            }
        }

        let now = Utc::now();
        let mut copy = Configuration {
            id: new_id.clone(),
            parent_id: destination.id.clone(),
            create_time: now,
            update_time: now,
            source_node: destination.name.clone(),
            ..original
        };
        rewrite_configuration(&mut copy, &ledger.processed);
        copy.resync_active_setting();

        storage.create_configuration(copy).await?;
        ledger
            .created
            .push((config_id.to_string(), new_id.clone()));

        tracing::debug!(
            original_id = %config_id,
            new_id = %new_id,
            destination = %destination.id,
            "Cloned configuration"
        );
        Ok(new_id)
    })
}

/// Clone a closure rooted at `root_id` and report what was created.
pub async fn clone_with_references(
    storage: &dyn Storage,
    root_id: &str,
    destination: &Node,
    ledger: &mut CloneLedger,
) -> Result<CloneReport, ServiceError> {
    let already_created = ledger.created().len();
    let new_root_id = clone_configuration(storage, root_id, destination, ledger).await?;
    let cloned = ledger.created()[already_created..]
        .iter()
        .map(|(original_id, new_id)| ClonedConfiguration {
            original_id: original_id.clone(),
            new_id: new_id.clone(),
        })
        .collect::<Vec<_>>();

    metrics::counter!("configurations_cloned_total").increment(cloned.len() as u64);
    tracing::info!(
        root_id = %root_id,
        new_root_id = %new_root_id,
        destination = %destination.id,
        created = cloned.len(),
        "Cloned configuration closure"
    );

    Ok(CloneReport {
        root_id: root_id.to_string(),
        new_root_id,
        destination_node_id: destination.id.clone(),
        cloned,
    })
}
