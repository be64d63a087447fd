//! Rate adjustments applied to steps after the solver assigns factories

use crate::models::{Dataset, RecipeId, Step};
use crate::rational::Rational;

/// Non-LP bookkeeping the step updater delegates to.
pub trait RateUtility {
    /// Recompute power and pollution from the step's factory count.
    fn adjust_power_pollution(&self, step: &mut Step, data: &Dataset);

    /// Record that `recipe` consumes `value` of the step's item.
    fn add_parent_value(&self, step: &mut Step, recipe: &RecipeId, value: Rational);
}

/// Scales power and pollution by the first producer of the step's recipe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryRates;

impl RateUtility for FactoryRates {
    fn adjust_power_pollution(&self, step: &mut Step, data: &Dataset) {
        let (Some(recipe_id), Some(factories)) = (&step.recipe_id, &step.factories) else {
            return;
        };
        let Some(factory) = data
            .recipe_r
            .get(recipe_id)
            .and_then(|r| r.producers.first())
            .and_then(|p| data.factories.get(p))
        else {
            return;
        };

        step.power = Some(factories * &factory.power_kw);
        step.pollution = Some(factories * &factory.pollution);
    }

    fn add_parent_value(&self, step: &mut Step, recipe: &RecipeId, value: Rational) {
        let parents = step.parents.get_or_insert_with(Default::default);
        *parents.entry(recipe.clone()).or_default() += value;
    }
}
