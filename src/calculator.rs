//! Production plan calculator logic

use std::fmt::{self, Write as _};

use anyhow::{bail, Result};
use indexmap::IndexMap;
use tracing::info;

use crate::models::{Dataset, ItemId, SolverSettings, Step};
use crate::rates::RateUtility;
use crate::rational::Rational;
use crate::simplex::{self, SolveOutcome};

/// Calculate a production plan for the requested products
///
/// Seeds one item-only step per product and lets the solver fill in the
/// recipes, intermediates and raw inputs needed to meet the demand.
pub fn calculate_production_plan(
    data: &Dataset,
    products: &[(ItemId, Rational)],
    settings: &SolverSettings,
    rates: &dyn RateUtility,
) -> Result<Vec<Step>> {
    let mut steps: Vec<Step> = products
        .iter()
        .map(|(item, rate)| Step::for_item(item, rate.clone()))
        .collect();

    match simplex::solve(&mut steps, settings, data, rates)? {
        SolveOutcome::Solved => {
            info!(steps = steps.len(), "production plan solved");
            Ok(steps)
        }
        SolveOutcome::Unchanged => bail!(
            "no admissible recipe produces {}",
            products
                .iter()
                .map(|(item, _)| data.item_name(item))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        SolveOutcome::Infeasible => {
            bail!("no feasible production plan (cycle without a raw source?)")
        }
    }
}

/// Summary of a production plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub products: Vec<(String, Rational)>,
    /// Recipe name, factory name and factory count.
    pub factories: Vec<(String, String, Rational)>,
    pub raw_inputs: Vec<(String, Rational)>,
    pub surplus: Vec<(String, Rational)>,
    pub total_power: Rational,
    pub total_pollution: Rational,
    pub precision: usize,
}

/// Whether a running recipe of the plan outputs `item`, by-products included.
fn made_in_plan(steps: &[Step], data: &Dataset, item: &str) -> bool {
    steps.iter().any(|s| {
        let running = s.factories.as_ref().is_some_and(|f| !f.is_zero());
        running
            && s.recipe_id
                .as_ref()
                .and_then(|id| data.recipe_r.get(id))
                .is_some_and(|r| r.produces(item))
    })
}

/// Generate a summary of a solved plan
pub fn summarize_plan(
    steps: &[Step],
    products: &[(ItemId, Rational)],
    data: &Dataset,
    precision: usize,
) -> PlanSummary {
    let mut factories: IndexMap<(String, String), Rational> = IndexMap::new();
    let mut raw_inputs = Vec::new();
    let mut surplus = Vec::new();
    let mut total_power = Rational::zero();
    let mut total_pollution = Rational::zero();

    for step in steps {
        if let Some(recipe_id) = &step.recipe_id {
            let recipe = data.recipes.get(recipe_id);
            let recipe_name = recipe.map_or(recipe_id.as_str(), |r| r.name.as_str()).to_string();
            let factory_name = recipe
                .and_then(|r| r.producers.first())
                .map_or("", |f| data.factories.get(f).map_or(f.as_str(), |f| f.name.as_str()))
                .to_string();
            if let Some(count) = &step.factories {
                *factories.entry((recipe_name, factory_name)).or_default() += count;
            }
        } else if let (Some(item), Some(amount)) = (&step.item_id, &step.items) {
            if !amount.is_zero() && !made_in_plan(steps, data, item) {
                raw_inputs.push((data.item_name(item).to_string(), amount.clone()));
            }
        }

        if let (Some(item), Some(amount)) = (&step.item_id, &step.surplus) {
            surplus.push((data.item_name(item).to_string(), amount.clone()));
        }
        if let Some(power) = &step.power {
            total_power += power;
        }
        if let Some(pollution) = &step.pollution {
            total_pollution += pollution;
        }
    }

    PlanSummary {
        products: products
            .iter()
            .map(|(item, rate)| (data.item_name(item).to_string(), rate.clone()))
            .collect(),
        factories: factories
            .into_iter()
            .map(|((recipe, factory), count)| (recipe, factory, count))
            .collect(),
        raw_inputs,
        surplus,
        total_power,
        total_pollution,
        precision,
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.precision;

        writeln!(f, "=== Production Summary ===")?;
        for (name, rate) in &self.products {
            writeln!(f, "Target: {} @ {}/s", name, rate.to_decimal(p))?;
        }
        writeln!(f)?;

        writeln!(f, "Factories required:")?;
        for (recipe, factory, count) in &self.factories {
            writeln!(f, "  {}x {} ({})", count.to_decimal(p), factory, recipe)?;
        }
        writeln!(f)?;

        if !self.raw_inputs.is_empty() {
            writeln!(f, "Raw inputs required:")?;
            for (name, rate) in &self.raw_inputs {
                writeln!(f, "  {} @ {}/s", name, rate.to_decimal(p))?;
            }
            writeln!(f)?;
        }

        if !self.surplus.is_empty() {
            writeln!(f, "Surplus:")?;
            for (name, rate) in &self.surplus {
                writeln!(f, "  {} @ {}/s", name, rate.to_decimal(p))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Power:     {} kW", self.total_power.to_decimal(p))?;
        writeln!(f, "Pollution: {}/min", self.total_pollution.to_decimal(p))?;

        Ok(())
    }
}

fn cell(value: &Option<Rational>, precision: usize) -> String {
    value.as_ref().map_or_else(String::new, |v| v.to_decimal(precision))
}

/// Format solved steps as a readable table
pub fn format_steps(steps: &[Step], data: &Dataset, precision: usize) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<24} {:<24} {:>12} {:>10} {:>10} {:>10} {:>10}",
        "Item", "Recipe", "Items/s", "Surplus", "Factories", "Power", "Pollution"
    );
    let _ = writeln!(output, "{}", "-".repeat(106));

    for step in steps {
        let item = step.item_id.as_deref().map_or("", |i| data.item_name(i));
        let recipe = match &step.recipe_id {
            Some(id) => data.recipes.get(id).map_or(id.as_str(), |r| r.name.as_str()),
            None => match step.item_id.as_deref() {
                Some(i) if !made_in_plan(steps, data, i) => "(input)",
                _ => "",
            },
        };
        let _ = writeln!(
            output,
            "{:<24} {:<24} {:>12} {:>10} {:>10} {:>10} {:>10}",
            item,
            recipe,
            cell(&step.items, precision),
            cell(&step.surplus, precision),
            cell(&step.factories, precision),
            cell(&step.power, precision),
            cell(&step.pollution, precision),
        );

        if let Some(parents) = &step.parents {
            for (recipe_id, value) in parents {
                let name = data
                    .recipes
                    .get(recipe_id)
                    .map_or(recipe_id.as_str(), |r| r.name.as_str());
                let _ = writeln!(output, "  used by {} @ {}/s", name, value.to_decimal(precision));
            }
        }
    }

    output
}
