//! Data models for items, recipes, factories and production steps

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::rational::Rational;

pub type ItemId = String;
pub type RecipeId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: Option<String>,
}

/// A building that runs recipes.
#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    pub id: ItemId,
    pub name: String,
    pub speed: Rational,
    pub power_kw: Rational,     // Drawn per running factory
    pub pollution: Rational,    // Per minute per running factory
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecipeKind {
    #[default]
    Crafted,
    Mined,
    Pumped,
}

impl RecipeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipeKind::Crafted => "crafted",
            RecipeKind::Mined => "mined",
            RecipeKind::Pumped => "pumped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "crafted" => Some(RecipeKind::Crafted),
            "mined" => Some(RecipeKind::Mined),
            "pumped" => Some(RecipeKind::Pumped),
            _ => None,
        }
    }
}

/// A recipe as stored: base crafting time, unadjusted for producer speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub time: Rational,
    pub kind: RecipeKind,
    pub inputs: Vec<(ItemId, Rational)>,
    pub outputs: Vec<(ItemId, Rational)>,
    pub producers: Vec<ItemId>,
}

/// A recipe with its time adjusted for the producer that will run it.
///
/// `id` is `None` for the unit recipes synthesized for ignored or unmatched
/// items.
#[derive(Debug, Clone, PartialEq)]
pub struct RationalRecipe {
    pub id: Option<RecipeId>,
    pub time: Rational,
    pub inputs: IndexMap<ItemId, Rational>,
    pub outputs: IndexMap<ItemId, Rational>,
    pub producers: Vec<ItemId>,
    pub kind: RecipeKind,
}

impl RationalRecipe {
    /// Zero-time placeholder that yields exactly one of `item`.
    pub fn unit(item: &str) -> Self {
        Self {
            id: None,
            time: Rational::zero(),
            inputs: IndexMap::new(),
            outputs: IndexMap::from([(item.to_string(), Rational::one())]),
            producers: Vec::new(),
            kind: RecipeKind::Crafted,
        }
    }

    pub fn produces(&self, item: &str) -> bool {
        self.outputs.get(item).is_some_and(Rational::is_positive)
    }

    /// Whether `item` appears on either side of the recipe.
    pub fn touches(&self, item: &str) -> bool {
        self.outputs.contains_key(item) || self.inputs.contains_key(item)
    }

    /// Output minus input of `item` per craft.
    pub fn net(&self, item: &str) -> Rational {
        let zero = Rational::zero();
        self.outputs.get(item).unwrap_or(&zero) - self.inputs.get(item).unwrap_or(&zero)
    }
}

/// Immutable game data with recipe times adjusted for their producers.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub item_ids: Vec<ItemId>,
    pub recipe_ids: Vec<RecipeId>,
    pub items: IndexMap<ItemId, Item>,
    pub factories: IndexMap<ItemId, Factory>,
    pub recipes: IndexMap<RecipeId, Recipe>,
    pub recipe_r: IndexMap<RecipeId, RationalRecipe>,
    /// Item id to the recipe that shares its id and yields only that item.
    pub item_recipe_ids: HashMap<ItemId, RecipeId>,
}

impl Dataset {
    pub fn new(items: Vec<Item>, factories: Vec<Factory>, recipes: Vec<Recipe>) -> Self {
        let items: IndexMap<_, _> = items.into_iter().map(|i| (i.id.clone(), i)).collect();
        let factories: IndexMap<_, _> = factories.into_iter().map(|f| (f.id.clone(), f)).collect();

        let mut recipe_r = IndexMap::new();
        let mut item_recipe_ids = HashMap::new();
        for recipe in &recipes {
            let speed = recipe
                .producers
                .first()
                .and_then(|p| factories.get(p))
                .map(|f| f.speed.clone())
                .filter(Rational::is_positive)
                .unwrap_or_else(Rational::one);

            let adjusted = RationalRecipe {
                id: Some(recipe.id.clone()),
                time: &recipe.time / &speed,
                inputs: recipe.inputs.iter().cloned().collect(),
                outputs: recipe.outputs.iter().cloned().collect(),
                producers: recipe.producers.clone(),
                kind: recipe.kind,
            };

            if adjusted.outputs.len() == 1 && adjusted.produces(&recipe.id) {
                item_recipe_ids.insert(recipe.id.clone(), recipe.id.clone());
            }
            recipe_r.insert(recipe.id.clone(), adjusted);
        }

        Self {
            item_ids: items.keys().cloned().collect(),
            recipe_ids: recipe_r.keys().cloned().collect(),
            items,
            factories,
            recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            recipe_r,
            item_recipe_ids,
        }
    }

    /// Recipes that output `item`, in dataset order.
    pub fn matching_recipes<'a>(
        &'a self,
        item: &'a str,
    ) -> impl Iterator<Item = &'a RationalRecipe> + 'a {
        self.recipe_r.values().filter(move |r| r.produces(item))
    }

    pub fn simple_recipe(&self, item: &str) -> Option<&RationalRecipe> {
        self.item_recipe_ids.get(item).and_then(|id| self.recipe_r.get(id))
    }

    pub fn item_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.items.get(id).map_or(id, |i| i.name.as_str())
    }
}

/// One row of a production plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub item_id: Option<ItemId>,
    pub recipe_id: Option<RecipeId>,
    pub items: Option<Rational>,
    pub surplus: Option<Rational>,
    pub factories: Option<Rational>,
    pub power: Option<Rational>,
    pub pollution: Option<Rational>,
    pub parents: Option<IndexMap<RecipeId, Rational>>,
    pub depth: usize,
}

impl Step {
    pub fn for_item(item: &str, items: Rational) -> Self {
        Self {
            item_id: Some(item.to_string()),
            items: Some(items),
            ..Self::default()
        }
    }

    pub fn is_item(&self, item: &str) -> bool {
        self.item_id.as_deref() == Some(item)
    }

    pub fn is_recipe(&self, recipe: &str) -> bool {
        self.recipe_id.as_deref() == Some(recipe)
    }
}

/// Per-solve settings chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverSettings {
    pub ignored_items: IndexSet<ItemId>,
    pub excluded_recipes: IndexSet<RecipeId>,
}

impl SolverSettings {
    pub fn merge(&mut self, other: SolverSettings) {
        self.ignored_items.extend(other.ignored_items);
        self.excluded_recipes.extend(other.excluded_recipes);
    }
}
