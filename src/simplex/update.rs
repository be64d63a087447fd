//! Merging a parsed solution back into the step list

use crate::models::{Dataset, RationalRecipe, Step};
use crate::rates::RateUtility;
use crate::rational::Rational;

use super::solution::Solution;
use super::state::MatrixState;

/// Applies `solution` to `steps` in place.
///
/// Item quantities are merged first, then solved recipes are bound to steps,
/// factory counts are added and parent values are propagated. Zero results
/// are skipped, so an all-zero solution leaves the steps untouched.
pub fn update_steps(
    steps: &mut Vec<Step>,
    solution: &Solution,
    state: &MatrixState<'_>,
    rates: &dyn RateUtility,
) {
    let depth = steps.iter().map(|s| s.depth).max().map_or(0, |d| d + 1);

    fold_demanded_steps(steps, state);
    for item in state.items.keys() {
        add_item_step(item, steps, depth, solution, state);
    }

    assign_recipes(steps, solution, state);

    for (key, recipe) in &state.recipes {
        if recipe.id.is_some() && solution.recipes.contains_key(key) {
            add_recipe_step(recipe, steps, depth, solution, state.data, rates);
        }
    }

    update_parents(steps, solution, state, rates);
}

/// Drops every recipe-less step of a demanded item except its first step.
///
/// Their demand was already summed into `state.items`, so the first step of
/// the item receives the whole solved quantity.
pub fn fold_demanded_steps(steps: &mut Vec<Step>, state: &MatrixState<'_>) {
    for (item, demand) in &state.items {
        if demand.is_zero() {
            continue;
        }
        let Some(first) = steps.iter().position(|s| s.is_item(item)) else {
            continue;
        };
        let mut index = 0;
        steps.retain(|s| {
            let duplicate = index > first && s.is_item(item) && s.recipe_id.is_none();
            index += 1;
            !duplicate
        });
    }
}

/// Position of the first step whose item or recipe is linked to one of `recipes`.
fn related_index(steps: &[Step], recipes: &[&RationalRecipe]) -> Option<usize> {
    steps.iter().position(|step| {
        recipes.iter().any(|r| {
            step.item_id.as_deref().is_some_and(|i| r.touches(i))
                || r.id.as_deref().is_some_and(|id| step.is_recipe(id))
        })
    })
}

/// Inserts right after the first related step, or appends.
fn insert_near(steps: &mut Vec<Step>, step: Step, related: &[&RationalRecipe]) -> usize {
    match related_index(steps, related) {
        Some(i) => {
            steps.insert(i + 1, step);
            i + 1
        }
        None => {
            steps.push(step);
            steps.len() - 1
        }
    }
}

pub fn add_item_step(
    item: &str,
    steps: &mut Vec<Step>,
    depth: usize,
    solution: &Solution,
    state: &MatrixState<'_>,
) {
    let mut output: Rational = state
        .recipes
        .iter()
        .filter(|(_, r)| r.id.is_some())
        .filter_map(|(key, r)| Some(solution.recipes.get(key)? * r.outputs.get(item)?))
        .sum();
    if let Some(input) = solution.inputs.get(item) {
        output += input;
    }
    if output.is_zero() {
        return;
    }

    let surplus = solution.surplus.get(item).filter(|s| !s.is_zero());
    let items = match surplus {
        Some(s) => &output - s,
        None => output,
    };

    match steps.iter().position(|s| s.is_item(item)) {
        Some(i) => {
            let step = &mut steps[i];
            // An unsolved demanded step already has its demand in the LP output.
            let demanded = state.items.get(item).is_some_and(|d| !d.is_zero());
            step.items = Some(if demanded && step.recipe_id.is_none() {
                items
            } else {
                step.items.take().unwrap_or_default() + items
            });
            if let Some(s) = surplus {
                step.surplus = Some(step.surplus.take().unwrap_or_default() + s);
            }
            step.depth = depth;
        }
        None => {
            let related: Vec<&RationalRecipe> = state
                .recipes
                .values()
                .filter(|r| r.id.is_some() && r.touches(item))
                .collect();
            let step = Step {
                item_id: Some(item.to_string()),
                items: Some(items),
                surplus: surplus.cloned(),
                depth,
                ..Step::default()
            };
            insert_near(steps, step, &related);
        }
    }
}

/// Binds each solved recipe that no step carries yet to the first
/// recipe-less step whose item it outputs.
pub fn assign_recipes(steps: &mut [Step], solution: &Solution, state: &MatrixState<'_>) {
    for (key, rate) in &solution.recipes {
        if rate.is_zero() {
            continue;
        }
        let Some(recipe) = state.recipes.get(key) else { continue };
        let Some(id) = &recipe.id else { continue };
        if steps.iter().any(|s| s.is_recipe(id)) {
            continue;
        }
        if let Some(step) = steps.iter_mut().find(|s| {
            s.recipe_id.is_none() && s.item_id.as_deref().is_some_and(|i| recipe.produces(i))
        }) {
            step.recipe_id = Some(id.clone());
        }
    }
}

pub fn add_recipe_step(
    recipe: &RationalRecipe,
    steps: &mut Vec<Step>,
    depth: usize,
    solution: &Solution,
    data: &Dataset,
    rates: &dyn RateUtility,
) {
    let Some(id) = &recipe.id else { return };
    let Some(rate) = solution.recipes.get(id).filter(|r| !r.is_zero()) else {
        return;
    };
    let factories = rate * &recipe.time;

    let existing = steps.iter().position(|s| s.is_recipe(id)).or_else(|| {
        steps.iter().position(|s| {
            s.recipe_id.is_none() && s.item_id.as_deref().is_some_and(|i| recipe.produces(i))
        })
    });

    let index = match existing {
        Some(i) => {
            let step = &mut steps[i];
            step.recipe_id = Some(id.clone());
            step.factories = Some(step.factories.take().unwrap_or_default() + factories);
            step.depth = depth;
            i
        }
        None => {
            let step = Step {
                recipe_id: Some(id.clone()),
                factories: Some(factories),
                depth,
                ..Step::default()
            };
            insert_near(steps, step, &[recipe])
        }
    };

    rates.adjust_power_pollution(&mut steps[index], data);
}

/// Credits every consumed input to the step of that item.
pub fn update_parents(
    steps: &mut [Step],
    solution: &Solution,
    state: &MatrixState<'_>,
    rates: &dyn RateUtility,
) {
    for (key, rate) in &solution.recipes {
        if rate.is_zero() {
            continue;
        }
        let Some(recipe) = state.recipes.get(key) else { continue };
        let Some(id) = &recipe.id else { continue };
        for (item, amount) in &recipe.inputs {
            if let Some(step) = steps.iter_mut().find(|s| s.is_item(item)) {
                rates.add_parent_value(step, id, rate * amount);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{RecipeId, SolverSettings};
    use crate::sample;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl RateUtility for Recorder {
        fn adjust_power_pollution(&self, step: &mut Step, _data: &Dataset) {
            let recipe = step.recipe_id.as_deref().unwrap_or("-");
            self.calls.borrow_mut().push(format!("adjust {recipe}"));
        }

        fn add_parent_value(&self, step: &mut Step, recipe: &RecipeId, value: Rational) {
            let item = step.item_id.as_deref().unwrap_or("-");
            self.calls.borrow_mut().push(format!("parent {item} {recipe} {value}"));
        }
    }

    fn rates_of(entries: &[(&str, Rational)]) -> IndexMap<String, Rational> {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn item_step(item: &str, items: Rational) -> Step {
        Step::for_item(item, items)
    }

    #[test]
    fn updates_an_existing_demanded_step() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::from(3));
        state.recipes.insert("coal".to_string(), data.recipe_r["coal"].clone());
        let solution = Solution {
            recipes: rates_of(&[("coal", Rational::two())]),
            ..Solution::default()
        };
        let mut steps = vec![item_step("coal", Rational::one())];

        add_item_step("coal", &mut steps, 1, &solution, &state);

        assert_eq!(
            steps,
            vec![Step {
                depth: 1,
                ..item_step("coal", Rational::two())
            }]
        );
    }

    #[test]
    fn folds_duplicate_demanded_steps() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::from(3));
        state.items.insert("wood".to_string(), Rational::zero());
        let mut steps = vec![
            item_step("coal", Rational::one()),
            item_step("wood", Rational::two()),
            item_step("coal", Rational::two()),
            item_step("wood", Rational::one()),
        ];

        fold_demanded_steps(&mut steps, &state);

        assert_eq!(
            steps,
            vec![
                item_step("coal", Rational::one()),
                item_step("wood", Rational::two()),
                item_step("wood", Rational::one()),
            ]
        );
    }

    #[test]
    fn adds_new_demand_to_a_solved_step() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::two());
        state.recipes.insert("coal".to_string(), data.recipe_r["coal"].clone());
        let solution = Solution {
            recipes: rates_of(&[("coal", Rational::two())]),
            ..Solution::default()
        };
        let solved = Step {
            recipe_id: Some("coal".to_string()),
            factories: Some(Rational::from(6)),
            ..item_step("coal", Rational::from(3))
        };
        let mut steps = vec![solved.clone()];

        add_item_step("coal", &mut steps, 2, &solution, &state);

        assert_eq!(
            steps,
            vec![Step {
                items: Some(Rational::from(5)),
                depth: 2,
                ..solved
            }]
        );
    }

    #[test]
    fn adds_to_an_input_step() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::zero());
        state.recipes.insert("coal".to_string(), RationalRecipe::unit("coal"));
        let solution = Solution {
            inputs: rates_of(&[("coal", Rational::two())]),
            ..Solution::default()
        };
        let mut steps = vec![item_step("coal", Rational::one())];

        add_item_step("coal", &mut steps, 1, &solution, &state);

        assert_eq!(steps[0].items, Some(Rational::from(3)));
        assert_eq!(steps[0].depth, 1);
    }

    #[test]
    fn ignores_an_item_with_no_output() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::one());
        state.recipes.insert("coal".to_string(), data.recipe_r["coal"].clone());
        let solution = Solution {
            surplus: rates_of(&[("coal", Rational::zero())]),
            inputs: rates_of(&[("coal", Rational::zero())]),
            recipes: rates_of(&[("coal", Rational::zero())]),
        };
        let original = vec![item_step("coal", Rational::one())];
        let mut steps = original.clone();

        add_item_step("coal", &mut steps, 1, &solution, &state);

        assert_eq!(steps, original);
    }

    #[test]
    fn adds_a_new_item_step() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::from(3));
        state.recipes.insert("coal".to_string(), data.recipe_r["coal"].clone());
        let solution = Solution {
            recipes: rates_of(&[("coal", Rational::two())]),
            ..Solution::default()
        };
        let mut steps = Vec::new();

        add_item_step("coal", &mut steps, 1, &solution, &state);

        assert_eq!(
            steps,
            vec![Step {
                depth: 1,
                ..item_step("coal", Rational::two())
            }]
        );
    }

    #[test]
    fn places_a_new_item_step_next_to_related_steps() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.recipes.insert(
            "advanced-oil-processing".to_string(),
            data.recipe_r["advanced-oil-processing"].clone(),
        );
        let solution = Solution {
            inputs: rates_of(&[("heavy-oil", Rational::one())]),
            ..Solution::default()
        };
        let mut steps = vec![
            item_step("petroleum-gas", Rational::zero()),
            item_step("wood", Rational::zero()),
        ];

        add_item_step("heavy-oil", &mut steps, 1, &solution, &state);

        assert_eq!(
            steps,
            vec![
                item_step("petroleum-gas", Rational::zero()),
                Step {
                    depth: 1,
                    ..item_step("heavy-oil", Rational::one())
                },
                item_step("wood", Rational::zero()),
            ]
        );
    }

    #[test]
    fn assigns_a_surplus_value() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::zero());
        state.recipes.insert("coal".to_string(), data.recipe_r["coal"].clone());
        let solution = Solution {
            surplus: rates_of(&[("coal", Rational::from(3))]),
            recipes: rates_of(&[("coal", Rational::from(4))]),
            ..Solution::default()
        };
        let mut steps = vec![item_step("coal", Rational::zero())];

        add_item_step("coal", &mut steps, 1, &solution, &state);

        assert_eq!(
            steps,
            vec![Step {
                surplus: Some(Rational::from(3)),
                depth: 1,
                ..item_step("coal", Rational::one())
            }]
        );
    }

    #[test]
    fn assigns_recipes_to_appropriate_steps() {
        let data = sample::dataset();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        for id in ["advanced-oil-processing", "basic-oil-processing"] {
            state.recipes.insert(id.to_string(), data.recipe_r[id].clone());
        }
        let solution = Solution {
            recipes: rates_of(&[
                ("advanced-oil-processing", Rational::one()),
                ("basic-oil-processing", Rational::one()),
            ]),
            ..Solution::default()
        };
        let mut steps = vec![
            item_step("heavy-oil", Rational::zero()),
            item_step("petroleum-gas", Rational::zero()),
        ];

        assign_recipes(&mut steps, &solution, &state);

        assert_eq!(steps[0].recipe_id.as_deref(), Some("advanced-oil-processing"));
        assert_eq!(steps[1].recipe_id.as_deref(), Some("basic-oil-processing"));
    }

    #[test]
    fn updates_an_existing_item_step_with_factories() {
        let data = sample::dataset();
        let rates = Recorder::default();
        let solution = Solution {
            recipes: rates_of(&[("coal", Rational::one())]),
            ..Solution::default()
        };
        let mut steps = vec![item_step("coal", Rational::one())];

        add_recipe_step(&data.recipe_r["coal"], &mut steps, 1, &solution, &data, &rates);

        assert_eq!(
            steps,
            vec![Step {
                recipe_id: Some("coal".to_string()),
                factories: Some(Rational::two()),
                depth: 1,
                ..item_step("coal", Rational::one())
            }]
        );
        assert_eq!(*rates.calls.borrow(), vec!["adjust coal".to_string()]);
    }

    #[test]
    fn finds_a_matching_step_by_recipe() {
        let data = sample::dataset();
        let rates = Recorder::default();
        let solution = Solution {
            recipes: rates_of(&[("coal", Rational::one())]),
            ..Solution::default()
        };
        let mut steps = vec![Step {
            recipe_id: Some("coal".to_string()),
            items: Some(Rational::one()),
            factories: Some(Rational::one()),
            ..Step::default()
        }];

        add_recipe_step(&data.recipe_r["coal"], &mut steps, 1, &solution, &data, &rates);

        assert_eq!(steps[0].item_id, None);
        assert_eq!(steps[0].factories, Some(Rational::from(3)));
        assert_eq!(steps[0].depth, 1);
        assert_eq!(rates.calls.borrow().len(), 1);
    }

    #[test]
    fn adds_a_new_recipe_step() {
        let data = sample::dataset();
        let rates = Recorder::default();
        let solution = Solution {
            recipes: rates_of(&[("coal", Rational::one())]),
            ..Solution::default()
        };
        let mut steps = Vec::new();

        add_recipe_step(&data.recipe_r["coal"], &mut steps, 1, &solution, &data, &rates);

        assert_eq!(
            steps,
            vec![Step {
                recipe_id: Some("coal".to_string()),
                factories: Some(Rational::two()),
                depth: 1,
                ..Step::default()
            }]
        );
    }

    #[test]
    fn places_a_new_recipe_step_next_to_related_steps() {
        let data = sample::dataset();
        let rates = Recorder::default();
        let solution = Solution {
            recipes: rates_of(&[("advanced-oil-processing", Rational::one())]),
            ..Solution::default()
        };
        let gas = Step {
            recipe_id: Some("basic-oil-processing".to_string()),
            ..item_step("petroleum-gas", Rational::zero())
        };
        let mut steps = vec![gas.clone(), item_step("wood", Rational::zero())];

        add_recipe_step(
            &data.recipe_r["advanced-oil-processing"],
            &mut steps,
            1,
            &solution,
            &data,
            &rates,
        );

        assert_eq!(
            steps,
            vec![
                gas,
                Step {
                    recipe_id: Some("advanced-oil-processing".to_string()),
                    factories: Some(Rational::from(5)),
                    depth: 1,
                    ..Step::default()
                },
                item_step("wood", Rational::zero()),
            ]
        );
    }

    #[test]
    fn updates_parents_for_solved_recipes() {
        let data = sample::dataset();
        let rates = Recorder::default();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state
            .recipes
            .insert("plastic-bar".to_string(), data.recipe_r["plastic-bar"].clone());
        let solution = Solution {
            recipes: rates_of(&[("plastic-bar", Rational::one())]),
            ..Solution::default()
        };
        let mut steps = vec![item_step("coal", Rational::one())];

        update_parents(&mut steps, &solution, &state, &rates);

        assert_eq!(*rates.calls.borrow(), vec!["parent coal plastic-bar 1".to_string()]);
    }

    #[test]
    fn zero_solution_leaves_steps_unchanged() {
        let data = sample::dataset();
        let rates = Recorder::default();
        let mut state = MatrixState::new(&SolverSettings::default(), &data);
        state.items.insert("coal".to_string(), Rational::one());
        state.recipes.insert("coal".to_string(), data.recipe_r["coal"].clone());
        let solution = Solution {
            surplus: rates_of(&[("coal", Rational::zero())]),
            inputs: IndexMap::new(),
            recipes: rates_of(&[("coal", Rational::zero())]),
        };
        let original = vec![item_step("coal", Rational::one()), item_step("wood", Rational::two())];
        let mut steps = original.clone();

        update_steps(&mut steps, &solution, &state, &rates);
        update_steps(&mut steps, &solution, &state, &rates);

        assert_eq!(steps, original);
        assert!(rates.calls.borrow().is_empty());
    }
}
