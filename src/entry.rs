//! List entries and the two independent orders they can participate in.

use crate::id::EntryId;
use crate::id::MealId;
use crate::rank::RankKey;

/// Which of an entry's orders an operation addresses.
///
/// Every entry has a position in the flat list order. Entries that belong
/// to a meal additionally have a position within that meal, with its own
/// key. The two orders never share keys: reordering ingredients inside a
/// meal leaves the grocery-list order untouched, and vice versa.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderScope {
    /// The flat order of the whole list.
    List,
    /// The ingredient order of one meal.
    Meal(MealId),
}

/// One row of a grocery list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    /// Stable identity. Minted at creation, unchanged by every edit.
    pub id: EntryId,
    /// Display text. Empty text marks a placeholder row.
    pub text: String,
    /// Whether the item has been ticked off.
    pub checked: bool,
    /// Position in the flat list order.
    pub list_order: RankKey,
    /// The meal this entry is an ingredient of, if any.
    pub meal_id: Option<MealId>,
    /// Position within the owning meal. Present only with `meal_id`.
    pub meal_order: Option<RankKey>,
    /// Section headers divide the list visually and are not items.
    pub is_section: bool,
    /// Free-form amount, like `"2 lbs"`. Carried verbatim, never parsed.
    pub quantity: Option<String>,
}

impl ListEntry {
    /// A fresh ordinary item at the given list position.
    pub fn new(text: impl Into<String>, list_order: RankKey) -> ListEntry {
        return ListEntry {
            id: EntryId::fresh(),
            text: text.into(),
            checked: false,
            list_order,
            meal_id: None,
            meal_order: None,
            is_section: false,
            quantity: None,
        };
    }

    /// A fresh section header at the given list position.
    pub fn section(title: impl Into<String>, list_order: RankKey) -> ListEntry {
        let mut entry = ListEntry::new(title, list_order);
        entry.is_section = true;
        return entry;
    }

    /// The blank row shown when a list would otherwise be empty.
    pub fn placeholder() -> ListEntry {
        return ListEntry::new("", RankKey::middle());
    }

    /// Attach this entry to a meal at the given position in it.
    pub fn with_meal(mut self, meal_id: MealId, meal_order: RankKey) -> ListEntry {
        self.meal_id = Some(meal_id);
        self.meal_order = Some(meal_order);
        return self;
    }

    /// Attach a quantity string.
    pub fn with_quantity(mut self, quantity: impl Into<String>) -> ListEntry {
        self.quantity = Some(quantity.into());
        return self;
    }

    /// Whether this is a blank placeholder row.
    pub fn is_placeholder(&self) -> bool {
        return self.text.is_empty() && !self.is_section;
    }

    /// Structural equality for snapshot arbitration: id, text, checked,
    /// list position, and section flag. Deliberately narrower than `Eq`;
    /// two rows that agree on these render identically in the list.
    pub fn same_shape(&self, other: &ListEntry) -> bool {
        return self.id == other.id
            && self.text == other.text
            && self.checked == other.checked
            && self.list_order == other.list_order
            && self.is_section == other.is_section;
    }
}

/// Elementwise [`ListEntry::same_shape`] over two whole lists.
pub fn same_shapes(a: &[ListEntry], b: &[ListEntry]) -> bool {
    return a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y));
}

/// Content for a row about to enter a list. Ids and order keys are
/// assigned by the list at insertion, so new content travels without them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub checked: bool,
    pub is_section: bool,
    pub quantity: Option<String>,
}

impl Draft {
    /// An ordinary unchecked item.
    pub fn item(text: impl Into<String>) -> Draft {
        return Draft {
            text: text.into(),
            ..Draft::default()
        };
    }

    /// A section header.
    pub fn section(title: impl Into<String>) -> Draft {
        return Draft {
            text: title.into(),
            is_section: true,
            ..Draft::default()
        };
    }

    /// Attach a quantity string.
    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Draft {
        self.quantity = Some(quantity.into());
        return self;
    }
}
