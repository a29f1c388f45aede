//! Roxable test descriptors
//!
//! A descriptor is the declarative metadata attached to a test that makes it
//! "roxable", i.e. reported to ROX Center. Raw descriptors are string maps;
//! [`parse`] validates them into a [`RoxableTestDescriptor`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RoxError;

/// Raw descriptor options as written by the test author
pub type RawOptions = BTreeMap<String, String>;

/// Sentinel `tickets` value marking a test inactive
pub const INVALID_TICKETS: &str = "INVALID";

/// Test flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestFlags {
    #[default]
    None,
    /// Inactive or skipped test
    Inactive,
}

impl TestFlags {
    /// Wire value of the flag
    pub fn bits(&self) -> u8 {
        match self {
            TestFlags::None => 0,
            TestFlags::Inactive => 1,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == TestFlags::None
    }
}

impl Serialize for TestFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for TestFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(TestFlags::None),
            1 => Ok(TestFlags::Inactive),
            other => Err(serde::de::Error::custom(format!("unknown test flag {}", other))),
        }
    }
}

/// Validated descriptor of a roxable test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoxableTestDescriptor {
    /// Unique test key
    pub key: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub tickets: Vec<String>,
    pub flags: TestFlags,
}

/// Parse and validate raw descriptor options
pub fn parse(raw: &RawOptions) -> Result<RoxableTestDescriptor, RoxError> {
    let key = non_empty(raw, "key").ok_or_else(|| {
        RoxError::validation_error(
            "A RoxableTest descriptor was found, but the ROX test key is missing or invalid.",
        )
    })?;

    // The sentinel is a flag, never a ticket
    let (flags, tickets) = if raw.get("tickets").map(String::as_str) == Some(INVALID_TICKETS) {
        (TestFlags::Inactive, Vec::new())
    } else {
        (TestFlags::None, split_list(raw.get("tickets")))
    };

    Ok(RoxableTestDescriptor {
        key,
        name: non_empty(raw, "name"),
        category: non_empty(raw, "category"),
        tags: split_list(raw.get("tags")),
        tickets,
        flags,
    })
}

fn non_empty(raw: &RawOptions, field: &str) -> Option<String> {
    raw.get(field).filter(|v| !v.is_empty()).cloned()
}

/// Split a comma-separated list, dropping empty segments and duplicates
fn split_list(value: Option<&String>) -> Vec<String> {
    let mut items = Vec::new();
    for part in value.into_iter().flat_map(|v| v.split(',')) {
        push_unique(&mut items, part.trim());
    }
    items
}

/// Append `item` unless empty or already present
pub(crate) fn push_unique(items: &mut Vec<String>, item: &str) {
    if !item.is_empty() && !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}
