//! Opaque identifiers for entries, lists, meals, and recipes.
//!
//! Ids are minted locally as UUIDv4 strings, but ids received from the
//! backend are accepted as arbitrary opaque strings: other clients may mint
//! ids their own way, and the core only ever compares ids for equality.

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// A stable identifier for a list entry. Created once at entry creation,
/// never reused, unchanged across edits.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EntryId(String);

impl EntryId {
    /// Mint a fresh id for a newly created entry.
    pub fn fresh() -> EntryId {
        return EntryId(Uuid::new_v4().to_string());
    }

    /// Wrap an id received from the backend.
    pub fn from_raw(raw: impl Into<String>) -> EntryId {
        return EntryId(raw.into());
    }

    /// The raw string form, as stored on the wire.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

/// The identifier of a grocery list.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    /// Mint a fresh list id.
    pub fn fresh() -> ListId {
        return ListId(Uuid::new_v4().to_string());
    }

    /// Wrap an id received from the backend.
    pub fn from_raw(raw: impl Into<String>) -> ListId {
        return ListId(raw.into());
    }

    /// The raw string form.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

/// The identifier of a meal grouping within a list.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealId(String);

impl MealId {
    /// Mint a fresh meal id.
    pub fn fresh() -> MealId {
        return MealId(Uuid::new_v4().to_string());
    }

    /// Wrap an id received from the backend.
    pub fn from_raw(raw: impl Into<String>) -> MealId {
        return MealId(raw.into());
    }

    /// The raw string form.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

/// The identifier of a recipe linked to a meal. Recipes are owned by an
/// external collaborator; this core never mints them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    /// Wrap an id received from the backend.
    pub fn from_raw(raw: impl Into<String>) -> RecipeId {
        return RecipeId(raw.into());
    }

    /// The raw string form.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl std::fmt::Debug for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "EntryId({})", self.0);
    }
}

impl std::fmt::Debug for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "ListId({})", self.0);
    }
}

impl std::fmt::Debug for MealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "MealId({})", self.0);
    }
}

impl std::fmt::Debug for RecipeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "RecipeId({})", self.0);
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(&self.0);
    }
}

impl std::fmt::Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = EntryId::fresh();
        let b = EntryId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn foreign_ids_round_trip() {
        let id = EntryId::from_raw("item-from-an-older-client");
        assert_eq!(id.as_str(), "item-from-an-older-client");
    }

    #[test]
    fn ids_compare_by_value() {
        let a = MealId::from_raw("monday-dinner");
        let b = MealId::from_raw("monday-dinner");
        assert_eq!(a, b);
    }
}
