use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

pub mod deployment;
pub mod service;
pub mod simple_app;

/// Label key asserting which engine owns a derived resource.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
/// Value written under [`MANAGED_BY_LABEL`] by this engine.
pub const MANAGED_BY_VALUE: &str = "simpleapp";

pub trait Object {
    fn kind(&self) -> &'static str;

    fn name(&self) -> &String;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    /// Namespace the object belongs to.
    pub namespace: String,
    /// Name must be unique within a namespace for a given kind.
    pub name: String,
    /// Map of string keys and values that can be used
    /// to organize and categorize objects.
    pub labels: Labels,
}

/// String key/value pairs attached to object metadata,
/// also used as selectors.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Labels(pub BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Whether every pair in `selector` is present with an equal value.
    pub fn matches(&self, selector: &Labels) -> bool {
        selector.0.iter().all(|(key, value)| self.0.get(key) == Some(value))
    }
}

/// Transport protocol of a port. Upper-cased on the wire;
/// Display yields the lower-cased form used in synthesized port names.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}
