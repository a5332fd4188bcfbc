//! Sequential dustbin identifier.
//!
//! [`DustbinId`] is the zero-padded decimal string (`"001"`, `"002"`, ...)
//! that doubles as the bin's display suffix. Active bins always carry a
//! contiguous sequence starting at `"001"`; retired bins are moved to a
//! tombstone identifier so their history never collides with a renumbered
//! survivor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum number of digits in a sequential identifier.
pub const ID_WIDTH: usize = 3;

const TOMBSTONE_PREFIX: &str = "retired-";

/// Identifier of a dustbin row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DustbinId(String);

impl DustbinId {
    /// Builds the identifier for a 1-based position in the sequence
    /// (`1` → `"001"`).
    #[must_use]
    pub fn from_position(position: u32) -> Self {
        Self(format!("{position:0width$}", width = ID_WIDTH))
    }

    /// Wraps an identifier received from a client or the database without
    /// validation. Lookups with a malformed value simply match nothing.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Creates a fresh tombstone identifier for a retired bin.
    #[must_use]
    pub fn tombstone() -> Self {
        Self(format!("{TOMBSTONE_PREFIX}{}", uuid::Uuid::new_v4().simple()))
    }

    /// Returns the numeric position for sequential identifiers, `None` for
    /// tombstones and anything else that is not all ASCII digits.
    #[must_use]
    pub fn position(&self) -> Option<u32> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    /// Returns `true` if this identifier belongs to a retired bin.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.0.starts_with(TOMBSTONE_PREFIX)
    }

    /// Display name derived from the identifier (`"Dustbin #001"`).
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("Dustbin #{}", self.0)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DustbinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DustbinId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<DustbinId> for String {
    fn from(id: DustbinId) -> Self {
        id.0
    }
}

/// Returns the identifier a newly added bin receives: one past the highest
/// sequential identifier in `existing`, or `"001"` for an empty fleet.
#[must_use]
pub fn next_id<'a>(existing: impl IntoIterator<Item = &'a DustbinId>) -> DustbinId {
    let max = existing
        .into_iter()
        .filter_map(DustbinId::position)
        .max()
        .unwrap_or(0);
    DustbinId::from_position(max.saturating_add(1))
}
