// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute mapping returned by a state query.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Attribute id of the instantaneous power reading, in Watts.
pub const POWER_ATTRIBUTE: &str = "28";

/// Attribute values reported by a plug, keyed by attribute id.
///
/// Only [`POWER_ATTRIBUTE`] has a typed accessor. Everything else is passed
/// through untouched.
///
/// # Examples
///
/// ```
/// use cozy_power::response::StateData;
///
/// let data: StateData = serde_json::from_str(r#"{"1":255,"28":"41.5"}"#).unwrap();
/// assert_eq!(data.power_watts().unwrap(), 41.5);
/// assert!(data.contains("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateData(Map<String, Value>);

impl StateData {
    /// Returns the raw value of an attribute.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.0.get(id)
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no attribute was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(id, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Returns the instantaneous power in Watts.
    ///
    /// The firmware reports a number, but numeric strings are accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] if the attribute is absent and
    /// [`ParseError::InvalidValue`] if it is not numeric.
    pub fn power_watts(&self) -> Result<f64, ParseError> {
        let value = self
            .get(POWER_ATTRIBUTE)
            .ok_or_else(|| ParseError::MissingField(POWER_ATTRIBUTE.to_string()))?;
        coerce_f64(value).ok_or_else(|| ParseError::InvalidValue {
            field: POWER_ATTRIBUTE.to_string(),
            message: format!("expected a number, got {value}"),
        })
    }
}

impl From<Map<String, Value>> for StateData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|v: &f64| v.is_finite()),
        _ => None,
    }
}
