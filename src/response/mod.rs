// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for CozyLife JSON replies.
//!
//! A plug answers every request with one JSON line shaped like
//! `{"msg": {"data": {"<attr-id>": <value>, ...}}}`. The library keeps the
//! whole reply as a [`Response`] and exposes the attribute mapping as
//! [`StateData`].

mod state_data;

pub use state_data::{POWER_ATTRIBUTE, StateData};

use serde_json::{Map, Value};

use crate::error::ParseError;

/// One decoded reply line.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    body: Value,
}

impl Response {
    /// Wraps an already-parsed JSON document.
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Parses a reply line.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid JSON.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        Ok(Self::new(serde_json::from_str(line)?))
    }

    /// Returns the raw JSON document.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the `msg` object if the reply carries a non-empty one.
    #[must_use]
    pub fn message(&self) -> Option<&Map<String, Value>> {
        self.body
            .get("msg")
            .and_then(Value::as_object)
            .filter(|msg| !msg.is_empty())
    }

    /// Extracts the attribute mapping.
    ///
    /// A reply whose `msg` object has no `data` key yields an empty mapping;
    /// judging whether that is enough is left to the caller. Replies without
    /// a usable `msg`, or whose `data` is not an object, yield `None`.
    ///
    /// ```
    /// use cozy_power::response::Response;
    ///
    /// let reply = Response::parse(r#"{"msg":{"data":{"28":12.5}}}"#).unwrap();
    /// let data = reply.data().unwrap();
    /// assert_eq!(data.power_watts().unwrap(), 12.5);
    /// ```
    #[must_use]
    pub fn data(&self) -> Option<StateData> {
        let msg = self.message()?;
        match msg.get("data") {
            None => Some(StateData::default()),
            Some(Value::Object(map)) => Some(StateData::from(map.clone())),
            Some(_) => None,
        }
    }

    /// Consumes the reply and returns the attribute mapping.
    ///
    /// Same rules as [`data`](Self::data), without cloning.
    #[must_use]
    pub fn into_data(self) -> Option<StateData> {
        let Value::Object(mut body) = self.body else {
            return None;
        };
        let Some(Value::Object(mut msg)) = body.remove("msg") else {
            return None;
        };
        if msg.is_empty() {
            return None;
        }
        match msg.remove("data") {
            None => Some(StateData::default()),
            Some(Value::Object(map)) => Some(StateData::from(map)),
            Some(_) => None,
        }
    }
}
