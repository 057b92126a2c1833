//! The wire shape of list entries and the boundary that repairs it.
//!
//! Snapshots arrive from the backend as loosely typed rows: every field
//! except `id` may be missing, and order keys may be garbage written by
//! older or buggy clients. The boundary is liberal: missing and malformed
//! fields are defaulted or substituted, and only one corruption is worth
//! surfacing, two rows claiming the same id.

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::entry::ListEntry;
use crate::id::EntryId;
use crate::id::MealId;
use crate::rank::RankKey;

/// Snapshot corruption that cannot be repaired at the boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two rows in one snapshot carried the same id.
    #[error("duplicate entry id {id:?} in snapshot")]
    DuplicateId { id: String },
}

/// One row as stored by the backend: camelCase, order keys as plain
/// strings, everything optional except the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_section: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

impl SnapshotEntry {
    /// Render a local entry in the wire shape.
    pub fn of(entry: &ListEntry) -> SnapshotEntry {
        return SnapshotEntry {
            id: entry.id.as_str().to_string(),
            text: Some(entry.text.clone()),
            checked: Some(entry.checked),
            order: Some(entry.list_order.to_string()),
            is_section: Some(entry.is_section),
            meal_id: entry.meal_id.as_ref().map(|m| m.as_str().to_string()),
            meal_order: entry.meal_order.as_ref().map(|k| k.to_string()),
            quantity: entry.quantity.clone(),
        };
    }
}

/// Repair and decode a snapshot into entries sorted by list order.
///
/// Missing or malformed order keys are substituted from a fresh chain,
/// `middle` first and then `next` of the previous substitute, so rows that
/// all lost their keys at least keep their arrival order. Meal orders get
/// the same treatment per meal; a meal order without a meal id is dropped.
pub fn validate(raw: Vec<SnapshotEntry>) -> Result<Vec<ListEntry>, SnapshotError> {
    let mut seen = FxHashSet::default();
    for row in &raw {
        if !seen.insert(row.id.as_str()) {
            return Err(SnapshotError::DuplicateId { id: row.id.clone() });
        }
    }

    let mut list_chain: Option<RankKey> = None;
    let mut meal_chains: FxHashMap<MealId, Option<RankKey>> = FxHashMap::default();
    let mut entries = Vec::with_capacity(raw.len());

    for row in raw {
        let list_order = match row.order.as_deref() {
            Some(key) => match RankKey::parse(key) {
                Ok(key) => key,
                Err(err) => {
                    debug!(id = %row.id, %err, "substituting malformed list order");
                    bump(&mut list_chain)
                }
            },
            None => bump(&mut list_chain),
        };

        let meal_id = row.meal_id.map(MealId::from_raw);
        let meal_order = match (&meal_id, row.meal_order.as_deref()) {
            (None, None) => None,
            (None, Some(_)) => {
                debug!(id = %row.id, "dropping meal order without meal id");
                None
            }
            (Some(meal), given) => {
                let parsed = given.map(RankKey::parse);
                match parsed {
                    Some(Ok(key)) => Some(key),
                    other => {
                        if let Some(Err(err)) = other {
                            debug!(id = %row.id, %err, "substituting malformed meal order");
                        }
                        let chain = meal_chains.entry(meal.clone()).or_insert(None);
                        Some(bump(chain))
                    }
                }
            }
        };

        entries.push(ListEntry {
            id: EntryId::from_raw(row.id),
            text: row.text.unwrap_or_default(),
            checked: row.checked.unwrap_or(false),
            list_order,
            meal_id,
            meal_order,
            is_section: row.is_section.unwrap_or(false),
            quantity: row.quantity,
        });
    }

    entries.sort_by(|a, b| a.list_order.cmp(&b.list_order));
    return Ok(entries);
}

/// Advance a substitution chain. The fallback to `middle` is unreachable
/// for any snapshot smaller than the whole key space.
fn bump(chain: &mut Option<RankKey>) -> RankKey {
    let key = match chain.as_ref() {
        None => RankKey::middle(),
        Some(prev) => prev.next().unwrap_or_else(|_| RankKey::middle()),
    };
    *chain = Some(key.clone());
    return key;
}
