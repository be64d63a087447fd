//! Canonical tableau for the production program
//!
//! The tableau encodes the dual of "minimize weighted recipe runs subject to
//! every item meeting its demand". Its slack basis is feasible from the start,
//! so plain primal pivoting applies and the primal recipe rates can be read
//! back from the objective row.
//!
//! Layout, with `I` items and `R` recipes:
//!
//! ```text
//!          marker | items 1..=I      | slacks I+1..=I+R | rhs
//! row 0:   1      | -demand_i        | 0                | 0
//! row r:   0      | net_{r,i}        | unit vector e_r  | cost(r)
//! ```

use crate::models::{RationalRecipe, RecipeKind};
use crate::rational::Rational;

use super::state::MatrixState;

pub type Tableau = Vec<Vec<Rational>>;

/// Weight of running one craft of a recipe, by what kind of source it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cost {
    Recipe,
    Manual,
    Water,
    Mined,
}

pub const COST_RECIPE: i64 = 1;
pub const COST_WATER: i64 = 10;
pub const COST_MINED: i64 = 100;
pub const COST_MANUAL: i64 = 1000;

impl Cost {
    pub fn of(recipe: &RationalRecipe) -> Self {
        if recipe.id.is_none() {
            return Cost::Manual;
        }
        match recipe.kind {
            RecipeKind::Crafted => Cost::Recipe,
            RecipeKind::Mined => Cost::Mined,
            RecipeKind::Pumped => Cost::Water,
        }
    }

    pub fn value(self) -> Rational {
        Rational::from(match self {
            Cost::Recipe => COST_RECIPE,
            Cost::Manual => COST_MANUAL,
            Cost::Water => COST_WATER,
            Cost::Mined => COST_MINED,
        })
    }
}

pub fn canonical(state: &MatrixState<'_>) -> Tableau {
    let items = state.items.len();
    let recipes = state.recipes.len();
    let width = items + recipes + 2;

    let mut objective = vec![Rational::zero(); width];
    objective[0] = Rational::one();
    for (i, demand) in state.items.values().enumerate() {
        objective[i + 1] = -demand;
    }

    let mut tableau = Vec::with_capacity(recipes + 1);
    tableau.push(objective);

    for (r, recipe) in state.recipes.values().enumerate() {
        let mut row = vec![Rational::zero(); width];
        for (i, item) in state.items.keys().enumerate() {
            row[i + 1] = recipe.net(item);
        }
        row[items + r + 1] = Rational::one();
        row[width - 1] = Cost::of(recipe).value();
        tableau.push(row);
    }

    tableau
}
