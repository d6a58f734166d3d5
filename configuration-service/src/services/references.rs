//! Configuration reference discovery and rewriting over settings payloads.

use crate::models::{Configuration, ReferenceKind};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const CONFIG_REF_FIELD: &str = "configRef";

/// Typed view over one node of a settings payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue<'a> {
    Reference(&'a str),
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> SettingValue<'a> {
    pub fn classify(value: &'a Value) -> Self {
        if let Some(target) = reference_target(value) {
            return SettingValue::Reference(target);
        }
        match value {
            Value::Object(map) => SettingValue::Object(map),
            Value::Array(items) => SettingValue::Array(items),
            other => SettingValue::Scalar(other),
        }
    }
}

/// The single "is this a reference" predicate: an object carrying a string
/// `configRef` field. Returns the referenced configuration id.
pub fn reference_target(value: &Value) -> Option<&str> {
    value
        .as_object()
        .and_then(|map| map.get(CONFIG_REF_FIELD))
        .and_then(Value::as_str)
}

/// Reject objects that carry a `configRef` key but are not a well-formed
/// reference: the target must be a non-empty string, `type` must be
/// `direct` or `override` when present, `description` must be a string.
pub fn validate_reference_payload(value: &Value) -> Result<(), String> {
    match value {
        Value::Object(map) if map.contains_key(CONFIG_REF_FIELD) => {
            match map.get(CONFIG_REF_FIELD).and_then(Value::as_str) {
                Some(target) if !target.trim().is_empty() => {}
                _ => return Err("configRef must be a non-empty string".to_string()),
            }
            if let Some(kind) = map.get("type") {
                serde_json::from_value::<ReferenceKind>(kind.clone()).map_err(|_| {
                    format!("Reference type must be \"direct\" or \"override\", got {}", kind)
                })?;
            }
            if map.get("description").is_some_and(|d| !d.is_string()) {
                return Err("Reference description must be a string".to_string());
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(validate_reference_payload),
        Value::Array(items) => items.iter().try_for_each(validate_reference_payload),
        _ => Ok(()),
    }
}

fn collect_into<'a>(value: &'a Value, seen: &mut HashSet<&'a str>, out: &mut Vec<String>) {
    match SettingValue::classify(value) {
        SettingValue::Reference(target) => {
            if seen.insert(target) {
                out.push(target.to_string());
            }
        }
        SettingValue::Object(map) => {
            for child in map.values() {
                collect_into(child, seen, out);
            }
        }
        SettingValue::Array(items) => {
            for child in items {
                collect_into(child, seen, out);
            }
        }
        SettingValue::Scalar(_) => {}
    }
}

/// Distinct referenced ids in a single value, in first-seen order.
pub fn collect_references(value: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_into(value, &mut seen, &mut out);
    out
}

/// Distinct referenced ids across `setting` and `settings` combined.
pub fn configuration_references(config: &Configuration) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_into(&config.setting, &mut seen, &mut out);
    for option in &config.settings {
        collect_into(option, &mut seen, &mut out);
    }
    out
}

/// Replace every reference whose target is a key of `mapping`. Other
/// references keep pointing at their original target. Returns the number of
/// rewritten references.
pub fn rewrite_references(value: &mut Value, mapping: &HashMap<String, String>) -> usize {
    if let Some(target) = reference_target(value) {
        let Some(replacement) = mapping.get(target).cloned() else {
            return 0;
        };
        if let Some(map) = value.as_object_mut() {
            map.insert(CONFIG_REF_FIELD.to_string(), Value::String(replacement));
            return 1;
        }
        return 0;
    }
    match value {
        Value::Object(map) => map
            .values_mut()
            .map(|child| rewrite_references(child, mapping))
            .sum(),
        Value::Array(items) => items
            .iter_mut()
            .map(|child| rewrite_references(child, mapping))
            .sum(),
        _ => 0,
    }
}

/// Rewrite references inside both `setting` and `settings` of a configuration.
pub fn rewrite_configuration(config: &mut Configuration, mapping: &HashMap<String, String>) -> usize {
    let mut rewritten = rewrite_references(&mut config.setting, mapping);
    for option in config.settings.iter_mut() {
        rewritten += rewrite_references(option, mapping);
    }
    rewritten
}

/// Reference edges between stored configurations.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    outgoing: BTreeMap<String, Vec<String>>,
    incoming: BTreeMap<String, Vec<String>>,
}

impl ReferenceGraph {
    pub fn build(configs: &[Configuration]) -> Self {
        let mut graph = ReferenceGraph::default();
        for config in configs {
            let targets = configuration_references(config);
            for target in &targets {
                graph
                    .incoming
                    .entry(target.clone())
                    .or_default()
                    .push(config.id.clone());
            }
            graph.outgoing.insert(config.id.clone(), targets);
        }
        graph
    }

    pub fn contains(&self, id: &str) -> bool {
        self.outgoing.contains_key(id)
    }

    /// Ids referenced by `id`. Empty for unknown ids.
    pub fn references_of(&self, id: &str) -> &[String] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Configurations that reference `id`.
    pub fn dependents_of(&self, id: &str) -> &[String] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Transitive closure from `root` in depth-first pre-order, root first.
    /// Ids absent from the graph are returned in `missing` and not expanded.
    pub fn closure(&self, root: &str) -> Closure {
        let mut closure = Closure::default();
        let mut visited = HashSet::new();
        let mut stack = vec![root.to_string()];
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if !self.contains(&id) {
                closure.missing.push(id);
                continue;
            }
            for target in self.references_of(&id).iter().rev() {
                if !visited.contains(target) {
                    stack.push(target.clone());
                }
            }
            closure.members.push(id);
        }
        closure
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Closure {
    pub members: Vec<String>,
    pub missing: Vec<String>,
}
