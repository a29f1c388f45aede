//! Wire text encoding
//!
//! Every string in the payload is re-encoded into the wire encoding before it
//! is sent, and message truncation is measured in that encoding.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Maximum encoded length of a test message in bytes
pub const MESSAGE_MAX_LENGTH: usize = 65535;

/// Text encoding used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireEncoding {
    /// UTF-8, the identity for Rust strings
    #[default]
    Utf8,
    /// 7-bit ASCII, other characters become `?`
    Ascii,
}

impl WireEncoding {
    /// Re-encode one string
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            WireEncoding::Utf8 => Cow::Borrowed(text),
            WireEncoding::Ascii if text.is_ascii() => Cow::Borrowed(text),
            WireEncoding::Ascii => Cow::Owned(
                text.chars()
                    .map(|c| if c.is_ascii() { c } else { '?' })
                    .collect(),
            ),
        }
    }

    /// Length of a string once encoded, in bytes
    pub fn encoded_len(&self, text: &str) -> usize {
        match self {
            WireEncoding::Utf8 => text.len(),
            WireEncoding::Ascii => text.chars().count(),
        }
    }

    /// Cut `text` so its encoded form fits in `max_bytes`
    ///
    /// Returns `None` when the text already fits. UTF-8 text is cut on the
    /// last character boundary at or below the limit.
    pub fn truncate(&self, text: &str, max_bytes: usize) -> Option<String> {
        if self.encoded_len(text) <= max_bytes {
            return None;
        }
        let end = match self {
            WireEncoding::Utf8 => {
                let mut end = max_bytes;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                end
            }
            WireEncoding::Ascii => text
                .char_indices()
                .nth(max_bytes)
                .map_or(text.len(), |(i, _)| i),
        };
        Some(text[..end].to_string())
    }

    /// Recursively re-encode every string of a JSON value
    ///
    /// Object keys and their order are kept; non-string leaves pass through.
    pub fn encode_value(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.encode(&s).into_owned()),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.encode_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, self.encode_value(v)))
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WireEncoding::Utf8 => "utf-8",
            WireEncoding::Ascii => "ascii",
        }
    }
}

impl fmt::Display for WireEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for WireEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(WireEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(WireEncoding::Ascii),
            _ => Err(format!(
                "Unknown payload encoding: {}. Valid encodings: utf-8, ascii",
                s
            )),
        }
    }
}

impl Serialize for WireEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for WireEncoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
