// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named configuration attributes.
//!
//! An [`AttributeSet`] is the host's equivalent of a styled attribute set:
//! raw string values keyed by attribute name. Typed getters parse on read
//! and fall back to the supplied default when a value is absent or
//! malformed, so no attribute is ever required.

use crate::error::PhysicsError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered set of raw attribute values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet {
    values: IndexMap<String, String>,
}

impl AttributeSet {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an attribute set from a RON map of strings
    pub fn from_ron(source: &str) -> Result<Self, PhysicsError> {
        Ok(ron::from_str(source)?)
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an attribute value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Check whether an attribute is present
    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Raw value of an attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no attributes
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Boolean attribute, or `default` when absent or malformed
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.parse_or(name, default, |raw| match raw {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    /// Float attribute, or `default` when absent or malformed
    pub fn get_float(&self, name: &str, default: f32) -> f32 {
        self.parse_or(name, default, |raw| {
            raw.parse::<f32>().ok().filter(|value| value.is_finite())
        })
    }

    /// Integer attribute, or `default` when absent or malformed
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        self.parse_or(name, default, |raw| raw.parse::<i64>().ok())
    }

    /// Dimension attribute in pixels, or `default` when absent or malformed
    pub fn get_dimension(&self, name: &str, default: f32, density: f32) -> f32 {
        self.parse_or(name, default, |raw| parse_dimension(raw, density).ok())
    }

    fn parse_or<T: Copy + std::fmt::Debug>(
        &self,
        name: &str,
        default: T,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        let Some(raw) = self.get(name) else {
            return default;
        };
        match parse(raw.trim()) {
            Some(value) => value,
            None => {
                tracing::warn!(
                    "Malformed attribute {}={:?}, using default {:?}",
                    name,
                    raw,
                    default
                );
                default
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

/// Parse a dimension into pixels.
///
/// Accepts `dp`/`dip` (scaled by `density`), `px` and bare numbers (pixels).
pub fn parse_dimension(raw: &str, density: f32) -> Result<f32, PhysicsError> {
    let raw = raw.trim();
    let (number, factor) = if let Some(value) = raw.strip_suffix("dip") {
        (value, density)
    } else if let Some(value) = raw.strip_suffix("dp") {
        (value, density)
    } else if let Some(value) = raw.strip_suffix("px") {
        (value, 1.0)
    } else {
        (raw, 1.0)
    };

    number
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value * factor)
        .ok_or_else(|| PhysicsError::InvalidDimension(raw.to_string()))
}
