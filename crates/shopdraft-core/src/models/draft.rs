//! Product draft model

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a remote draft record.
///
/// The server assigns ids on create; clients adopt them verbatim. `mint` is
/// used by the in-memory store to produce time-sortable UUID v7 ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    /// Mint a new unique draft id using UUID v7.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DraftId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DraftId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An in-progress, unpublished product document.
///
/// Flat and JSON-serializable; the same value is persisted to the local
/// snapshot and the remote draft record. `saved_at` is stamped by whichever
/// store performed the save, so the two copies may legitimately disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Product display name
    #[serde(default)]
    pub name: String,
    /// Long-form description
    #[serde(default)]
    pub description: String,
    /// Price in the smallest currency unit
    #[serde(default)]
    pub price_cents: Option<i64>,
    /// Catalog category slug
    #[serde(default)]
    pub category: Option<String>,
    /// Keys of uploaded media objects
    #[serde(default)]
    pub media_keys: Vec<String>,
    /// Key/value specification map
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
    /// Highlighted on the storefront
    #[serde(default)]
    pub featured: bool,
    /// Whether stock levels are tracked
    #[serde(default)]
    pub track_inventory: bool,
    /// Last successful save timestamp (Unix ms), set by the saving store
    #[serde(default)]
    pub saved_at: i64,
    /// Owner of the draft; `None` for anonymous sessions
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl ProductDraft {
    /// Create a fresh empty draft.
    ///
    /// Every "no usable snapshot" branch builds its document here, so the
    /// empty-document shape changes in exactly one place.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price_cents: None,
            category: None,
            media_keys: Vec::new(),
            specs: BTreeMap::new(),
            featured: false,
            track_inventory: false,
            saved_at: 0,
            owner_id: None,
        }
    }

    /// Check if the draft carries no authored content yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.description.trim().is_empty()
            && self.media_keys.is_empty()
            && self.specs.is_empty()
    }

    /// Get the name as a title preview, truncated to `max_len` characters.
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        self.name.chars().take(max_len).collect()
    }
}
