//! Tagged success/failure envelopes for analysis results.
//!
//! Failures never carry a partial theme: the envelope is either
//! `{"success": true, ...report fields}` or `{"success": false, "error": ".."}`.

use crate::Result;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};

#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Failure(e.to_string()),
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Outcome::Success(value) => {
                let fields = match serde_json::to_value(value).map_err(S::Error::custom)? {
                    serde_json::Value::Object(fields) => fields,
                    other => {
                        let mut fields = serde_json::Map::new();
                        fields.insert("result".into(), other);
                        fields
                    }
                };
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                map.serialize_entry("success", &true)?;
                for (k, v) in &fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Outcome::Failure(error) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
