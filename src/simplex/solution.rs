//! Reading recipe rates, surplus and raw inputs back out of a solved tableau

use indexmap::IndexMap;

use crate::models::ItemId;
use crate::rational::Rational;

use super::state::MatrixState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    pub surplus: IndexMap<ItemId, Rational>,
    pub inputs: IndexMap<ItemId, Rational>,
    /// Crafts per time unit, keyed like `MatrixState::recipes`.
    pub recipes: IndexMap<String, Rational>,
}

/// Reads the objective row: item columns carry the surplus of each item and
/// slack columns carry the rate of each recipe.
pub fn parse_solution(a: &[Vec<Rational>], state: &MatrixState<'_>) -> Solution {
    let mut solution = Solution::default();
    let objective = &a[0];

    for (i, item) in state.items.keys().enumerate() {
        let value = &objective[i + 1];
        if !value.is_zero() {
            solution.surplus.insert(item.clone(), value.clone());
        }
    }

    let offset = state.items.len() + 1;
    for (r, (key, recipe)) in state.recipes.iter().enumerate() {
        let value = &objective[offset + r];
        if value.is_zero() {
            continue;
        }
        if recipe.id.is_none() {
            solution.inputs.insert(key.clone(), value.clone());
        } else {
            solution.recipes.insert(key.clone(), value.clone());
        }
    }

    solution
}
