//! Working-set construction: which items and recipes enter the linear program

use indexmap::IndexMap;
use tracing::debug;

use crate::error::SolverError;
use crate::models::{Dataset, ItemId, RationalRecipe, RecipeId, SolverSettings, Step};
use crate::rational::Rational;

/// Transient state for a single solve.
///
/// `recipes` is keyed by recipe id, except for synthesized unit recipes which
/// are keyed by the item they supply.
#[derive(Debug, Clone)]
pub struct MatrixState<'a> {
    pub recipes: IndexMap<String, RationalRecipe>,
    pub items: IndexMap<ItemId, Rational>,
    pub recipe_ids: Vec<RecipeId>,
    pub item_ids: Vec<ItemId>,
    pub data: &'a Dataset,
}

impl<'a> MatrixState<'a> {
    pub fn new(settings: &SolverSettings, data: &'a Dataset) -> Self {
        Self {
            recipes: IndexMap::new(),
            items: IndexMap::new(),
            recipe_ids: data
                .recipe_ids
                .iter()
                .filter(|r| !settings.excluded_recipes.contains(*r))
                .cloned()
                .collect(),
            item_ids: data
                .item_ids
                .iter()
                .filter(|i| !settings.ignored_items.contains(*i))
                .cloned()
                .collect(),
            data,
        }
    }

    fn is_admissible_recipe(&self, recipe: &RationalRecipe) -> bool {
        recipe.id.as_ref().is_some_and(|id| self.recipe_ids.contains(id))
    }

    /// Admissible recipes that output `item`, in dataset order.
    fn admissible_producers<'s>(
        &'s self,
        item: &'s str,
    ) -> impl Iterator<Item = &'s RationalRecipe> + 's {
        self.data
            .matching_recipes(item)
            .filter(move |r| self.is_admissible_recipe(r))
    }

    fn is_admissible_item(&self, item: &str) -> bool {
        self.item_ids.iter().any(|i| i == item)
    }

    fn has_admissible_producer(&self, item: &str) -> bool {
        self.admissible_producers(item).next().is_some()
    }
}

enum Work {
    Item(ItemId),
    Recipe(String),
}

/// Builds the working set for the steps that still need a recipe.
///
/// Returns `Ok(None)` when every step is already resolved.
pub fn build_state<'a>(
    steps: &[Step],
    settings: &SolverSettings,
    data: &'a Dataset,
) -> Result<Option<MatrixState<'a>>, SolverError> {
    let mut state = MatrixState::new(settings, data);
    let unsolved = unsolved_steps(steps, &state);
    if unsolved.is_empty() {
        return Ok(None);
    }

    for step in unsolved {
        let Some(item) = &step.item_id else { continue };
        let amount = step.items.clone().unwrap_or_default();
        *state.items.entry(item.clone()).or_default() += amount;
        parse_item_recursively(item, &mut state);
    }

    if let Some(item) = state
        .items
        .keys()
        .find(|item| !state.recipes.values().any(|r| r.produces(item)))
    {
        return Err(SolverError::Unproducible(item.clone()));
    }

    debug!(
        items = state.items.len(),
        recipes = state.recipes.len(),
        "built matrix state"
    );
    Ok(Some(state))
}

/// Steps without a recipe whose item is admissible and has an admissible producer.
pub fn unsolved_steps<'s>(steps: &'s [Step], state: &MatrixState<'_>) -> Vec<&'s Step> {
    steps
        .iter()
        .filter(|s| s.recipe_id.is_none())
        .filter(|s| {
            s.item_id.as_deref().is_some_and(|item| {
                state.is_admissible_item(item) && state.has_admissible_producer(item)
            })
        })
        .collect()
}

/// Registers every admissible recipe producing `item` that is not yet in the
/// state, returning the keys of the newly registered ones.
pub fn recipe_matches(item: &str, state: &mut MatrixState<'_>) -> Vec<String> {
    let matches: Vec<RationalRecipe> = state
        .admissible_producers(item)
        .filter(|r| r.id.as_ref().is_some_and(|id| !state.recipes.contains_key(id)))
        .cloned()
        .collect();

    let mut added = Vec::with_capacity(matches.len());
    for recipe in matches {
        let Some(id) = recipe.id.clone() else { continue };
        state.recipes.insert(id.clone(), recipe);
        added.push(id);
    }
    added
}

/// Registers the items a recipe touches and synthesizes unit recipes for
/// inputs that cannot be produced, returning the recipe's inputs.
pub fn item_matches(recipe: &RationalRecipe, state: &mut MatrixState<'_>) -> Vec<ItemId> {
    for item in recipe.outputs.keys() {
        state.items.entry(item.clone()).or_default();
    }

    let mut inputs = Vec::with_capacity(recipe.inputs.len());
    for item in recipe.inputs.keys() {
        state.items.entry(item.clone()).or_default();
        let unmatched = !state.is_admissible_item(item) || !state.has_admissible_producer(item);
        if unmatched && !state.recipes.contains_key(item) {
            state.recipes.insert(item.clone(), RationalRecipe::unit(item));
        }
        inputs.push(item.clone());
    }
    inputs
}

/// Expands `item` and everything upstream of it into the state.
///
/// Depth-first, in the order a recursive walk would visit, but driven by an
/// explicit stack. Keys already present in `state.recipes` stop the walk.
pub fn parse_item_recursively(item: &str, state: &mut MatrixState<'_>) {
    let mut stack = vec![Work::Item(item.to_string())];

    while let Some(work) = stack.pop() {
        match work {
            Work::Item(item) => {
                if state.recipes.contains_key(&item) {
                    continue;
                }
                let simple = state
                    .data
                    .simple_recipe(&item)
                    .filter(|r| state.is_admissible_recipe(r));
                if let Some(recipe) = simple {
                    state.recipes.insert(item.clone(), recipe.clone());
                    stack.push(Work::Recipe(item));
                } else {
                    let added = recipe_matches(&item, state);
                    stack.extend(added.into_iter().rev().map(Work::Recipe));
                }
            }
            Work::Recipe(key) => {
                let Some(recipe) = state.recipes.get(&key).cloned() else { continue };
                let inputs = item_matches(&recipe, state);
                stack.extend(inputs.into_iter().rev().map(Work::Item));
            }
        }
    }
}
