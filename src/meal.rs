//! Meals: named ingredient groupings planned across the week.
//!
//! Meals are not ranked. Their display order is derived, day of week
//! first and name second, so there are no meal-level keys to maintain
//! and nothing to re-rank. Persistence goes through a caller-supplied
//! function; the planner stays transport-agnostic and applies every edit
//! optimistically, rolling back when the push is refused.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::id::ListId;
use crate::id::MealId;
use crate::id::RecipeId;
use crate::optimistic;

/// Day of the week a meal is planned for. The derived ordering is the
/// planner's display order, Monday first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A named group of list entries, optionally pinned to a day and linked
/// to a recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    pub list_id: ListId,
    pub name: String,
    pub day: Option<Weekday>,
    pub recipe_id: Option<RecipeId>,
}

impl Meal {
    /// A fresh unplanned meal on the given list.
    pub fn new(list_id: ListId, name: impl Into<String>) -> Meal {
        return Meal {
            id: MealId::fresh(),
            list_id,
            name: name.into(),
            day: None,
            recipe_id: None,
        };
    }
}

/// Planner display order: planned days first, Monday through Sunday,
/// unplanned meals last, ties alphabetical without case.
fn planner_order(a: &Meal, b: &Meal) -> Ordering {
    let by_day = match (a.day, b.day) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    return by_day.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

/// The meals of one list, kept in planner order.
#[derive(Clone, Debug)]
pub struct MealPlanner {
    list_id: ListId,
    meals: Vec<Meal>,
}

impl MealPlanner {
    /// An empty planner for a list.
    pub fn new(list_id: ListId) -> MealPlanner {
        return MealPlanner {
            list_id,
            meals: Vec::new(),
        };
    }

    /// Adopt fetched meals, dropping any that belong to another list.
    pub fn load(list_id: ListId, mut meals: Vec<Meal>) -> MealPlanner {
        meals.retain(|meal| meal.list_id == list_id);
        meals.sort_by(planner_order);
        return MealPlanner { list_id, meals };
    }

    /// All meals in planner order.
    pub fn meals(&self) -> &[Meal] {
        return &self.meals;
    }

    /// Look up a meal by id.
    pub fn get(&self, id: &MealId) -> Option<&Meal> {
        return self.meals.iter().find(|m| &m.id == id);
    }

    /// Create a meal, persisting optimistically. Returns the new id.
    pub fn add<E>(
        &mut self,
        name: impl Into<String>,
        persist: impl FnOnce(&[Meal]) -> Result<(), E>,
    ) -> Result<MealId, E> {
        let meal = Meal::new(self.list_id.clone(), name);
        let id = meal.id.clone();
        optimistic::mutate(
            &mut self.meals,
            |meals| {
                meals.push(meal);
                meals.sort_by(planner_order);
            },
            |meals| persist(meals),
        )?;
        return Ok(id);
    }

    /// Rename a meal. `Ok(false)` when the id is unknown.
    pub fn rename<E>(
        &mut self,
        id: &MealId,
        name: impl Into<String>,
        persist: impl FnOnce(&[Meal]) -> Result<(), E>,
    ) -> Result<bool, E> {
        let name = name.into();
        return self.edit(id, persist, move |meal| meal.name = name);
    }

    /// Plan or unplan a meal's day. `Ok(false)` when the id is unknown.
    pub fn set_day<E>(
        &mut self,
        id: &MealId,
        day: Option<Weekday>,
        persist: impl FnOnce(&[Meal]) -> Result<(), E>,
    ) -> Result<bool, E> {
        return self.edit(id, persist, move |meal| meal.day = day);
    }

    /// Link or unlink the meal's source recipe. `Ok(false)` when the id
    /// is unknown.
    pub fn link_recipe<E>(
        &mut self,
        id: &MealId,
        recipe: Option<RecipeId>,
        persist: impl FnOnce(&[Meal]) -> Result<(), E>,
    ) -> Result<bool, E> {
        return self.edit(id, persist, move |meal| meal.recipe_id = recipe);
    }

    /// Remove a meal. `Ok(false)` when the id is unknown. Entries keep
    /// their `meal_id`; unlinking them is the list owner's move.
    pub fn remove<E>(
        &mut self,
        id: &MealId,
        persist: impl FnOnce(&[Meal]) -> Result<(), E>,
    ) -> Result<bool, E> {
        let Some(pos) = self.meals.iter().position(|m| &m.id == id) else {
            debug!(?id, "ignoring removal of unknown meal");
            return Ok(false);
        };
        optimistic::mutate(
            &mut self.meals,
            |meals| {
                meals.remove(pos);
            },
            |meals| persist(meals),
        )?;
        return Ok(true);
    }

    fn edit<E>(
        &mut self,
        id: &MealId,
        persist: impl FnOnce(&[Meal]) -> Result<(), E>,
        edit: impl FnOnce(&mut Meal),
    ) -> Result<bool, E> {
        let Some(pos) = self.meals.iter().position(|m| &m.id == id) else {
            debug!(?id, "ignoring edit of unknown meal");
            return Ok(false);
        };
        optimistic::mutate(
            &mut self.meals,
            |meals| {
                edit(&mut meals[pos]);
                meals.sort_by(planner_order);
            },
            |meals| persist(meals),
        )?;
        return Ok(true);
    }
}
