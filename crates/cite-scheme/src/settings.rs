/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Scheme set configuration and the host settings store.
//!
//! [`SchemeSettings`] is the serialized form of a scheme set:
//!
//! ```json
//! {
//!   "hasSchemePrefix": false,
//!   "formats": { "greek": { "α": 1, "β": 2 } },
//!   "schemes": { "od": { "name": "Odyssey", "path": ["book", "verse"], ... } }
//! }
//! ```
//!
//! Every table under `formats` becomes a
//! [`MappedNumberFormatter`](crate::MappedNumberFormatter) under its key.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scheme::CitationScheme;

/// A complete scheme set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeSettings {
    /// Schemes keyed by id, in declaration order.
    #[serde(default)]
    pub schemes: IndexMap<String, CitationScheme>,

    /// Label tables for mapped number formats, keyed by format key.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub formats: IndexMap<String, IndexMap<String, i32>>,

    /// Whether citation text carries a leading `@schemeId:` marker.
    #[serde(default)]
    pub has_scheme_prefix: bool,
}

impl SchemeSettings {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Key/value store the host keeps its settings in.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// Settings store backed by a map, for hosts without persistence and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}
