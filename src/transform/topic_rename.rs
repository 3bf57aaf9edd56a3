// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Exact-match topic renaming.

use std::collections::HashMap;

use crate::core::{EditError, Result};

/// Topic renaming by exact topic name.
///
/// Every target topic must start with `/`; mappings are validated when
/// added so a bad rename fails before any file is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicRenameTransform {
    /// source -> target
    mappings: HashMap<String, String>,
}

impl TopicRenameTransform {
    /// Create an empty transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping, replacing any earlier mapping for `source`.
    pub fn add_mapping(&mut self, source: impl Into<String>, target: impl Into<String>) -> Result<()> {
        let source = source.into();
        let target = target.into();

        if source.is_empty() {
            return Err(EditError::invalid_config(
                "rename",
                format!("empty source topic for target '{target}'"),
            ));
        }
        if !target.starts_with('/') {
            return Err(EditError::invalid_config(
                "rename",
                format!("invalid new topic name: {target}"),
            ));
        }

        self.mappings.insert(source, target);
        Ok(())
    }

    /// Build a transform from a map, validating every target.
    pub fn from_map(mappings: HashMap<String, String>) -> Result<Self> {
        let mut transform = Self::new();
        for (source, target) in mappings {
            transform.add_mapping(source, target)?;
        }
        Ok(transform)
    }

    /// New topic for `topic`, if it is renamed.
    pub fn rename(&self, topic: &str) -> Option<&str> {
        self.mappings.get(topic).map(String::as_str)
    }

    /// Drop the mapping for `source`, returning its target.
    pub fn remove(&mut self, source: &str) -> Option<String> {
        self.mappings.remove(source)
    }

    /// Source topics with a mapping.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    /// Whether no mapping is configured.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }
}
