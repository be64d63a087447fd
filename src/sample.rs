//! Built-in sample data for trying the solver without an imported dataset

use crate::models::{Dataset, Factory, Item, Recipe, RecipeKind};
use crate::rational::Rational;

fn item(id: &str, name: &str, category: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        category: Some(category.to_string()),
    }
}

fn factory(id: &str, name: &str, speed: Rational, power_kw: i64, pollution: i64) -> Factory {
    Factory {
        id: id.to_string(),
        name: name.to_string(),
        speed,
        power_kw: Rational::from(power_kw),
        pollution: Rational::from(pollution),
    }
}

fn amounts(list: &[(&str, i64)]) -> Vec<(String, Rational)> {
    list.iter()
        .map(|(id, n)| (id.to_string(), Rational::from(*n)))
        .collect()
}

fn recipe(
    id: &str,
    name: &str,
    time: Rational,
    kind: RecipeKind,
    inputs: &[(&str, i64)],
    outputs: &[(&str, i64)],
    producer: &str,
) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        time,
        kind,
        inputs: amounts(inputs),
        outputs: amounts(outputs),
        producers: vec![producer.to_string()],
    }
}

pub fn items() -> Vec<Item> {
    vec![
        item("coal", "Coal", "resource"),
        item("iron-ore", "Iron ore", "resource"),
        item("copper-ore", "Copper ore", "resource"),
        item("wood", "Wood", "resource"),
        item("water", "Water", "fluid"),
        item("crude-oil", "Crude oil", "fluid"),
        item("heavy-oil", "Heavy oil", "fluid"),
        item("light-oil", "Light oil", "fluid"),
        item("petroleum-gas", "Petroleum gas", "fluid"),
        item("iron-plate", "Iron plate", "intermediate"),
        item("copper-plate", "Copper plate", "intermediate"),
        item("copper-cable", "Copper cable", "intermediate"),
        item("electronic-circuit", "Electronic circuit", "intermediate"),
        item("plastic-bar", "Plastic bar", "intermediate"),
        item("wooden-chest", "Wooden chest", "logistics"),
    ]
}

pub fn factories() -> Vec<Factory> {
    vec![
        factory("electric-mining-drill", "Electric mining drill", Rational::ratio(1, 2), 90, 10),
        factory("offshore-pump", "Offshore pump", Rational::one(), 0, 0),
        factory("pumpjack", "Pumpjack", Rational::one(), 90, 10),
        factory("stone-furnace", "Stone furnace", Rational::one(), 90, 2),
        factory("assembling-machine-2", "Assembling machine 2", Rational::ratio(3, 4), 150, 3),
        factory("oil-refinery", "Oil refinery", Rational::one(), 420, 6),
        factory("chemical-plant", "Chemical plant", Rational::one(), 210, 4),
    ]
}

pub fn recipes() -> Vec<Recipe> {
    use RecipeKind::{Crafted, Mined, Pumped};

    vec![
        recipe(
            "coal",
            "Coal",
            Rational::one(),
            Mined,
            &[],
            &[("coal", 1)],
            "electric-mining-drill",
        ),
        recipe(
            "iron-ore",
            "Iron ore",
            Rational::one(),
            Mined,
            &[],
            &[("iron-ore", 1)],
            "electric-mining-drill",
        ),
        recipe(
            "copper-ore",
            "Copper ore",
            Rational::one(),
            Mined,
            &[],
            &[("copper-ore", 1)],
            "electric-mining-drill",
        ),
        recipe("water", "Water", Rational::one(), Pumped, &[], &[("water", 1200)], "offshore-pump"),
        recipe(
            "crude-oil",
            "Crude oil",
            Rational::one(),
            Mined,
            &[],
            &[("crude-oil", 10)],
            "pumpjack",
        ),
        recipe(
            "iron-plate",
            "Iron plate",
            Rational::ratio(16, 5),
            Crafted,
            &[("iron-ore", 1)],
            &[("iron-plate", 1)],
            "stone-furnace",
        ),
        recipe(
            "copper-plate",
            "Copper plate",
            Rational::ratio(16, 5),
            Crafted,
            &[("copper-ore", 1)],
            &[("copper-plate", 1)],
            "stone-furnace",
        ),
        recipe(
            "copper-cable",
            "Copper cable",
            Rational::ratio(1, 2),
            Crafted,
            &[("copper-plate", 1)],
            &[("copper-cable", 2)],
            "assembling-machine-2",
        ),
        recipe(
            "electronic-circuit",
            "Electronic circuit",
            Rational::ratio(1, 2),
            Crafted,
            &[("iron-plate", 1), ("copper-cable", 3)],
            &[("electronic-circuit", 1)],
            "assembling-machine-2",
        ),
        recipe(
            "basic-oil-processing",
            "Basic oil processing",
            Rational::from(5),
            Crafted,
            &[("crude-oil", 100)],
            &[("petroleum-gas", 45)],
            "oil-refinery",
        ),
        recipe(
            "advanced-oil-processing",
            "Advanced oil processing",
            Rational::from(5),
            Crafted,
            &[("crude-oil", 100), ("water", 50)],
            &[("heavy-oil", 25), ("light-oil", 45), ("petroleum-gas", 55)],
            "oil-refinery",
        ),
        recipe(
            "heavy-oil-cracking",
            "Heavy oil cracking",
            Rational::two(),
            Crafted,
            &[("water", 30), ("heavy-oil", 40)],
            &[("light-oil", 30)],
            "chemical-plant",
        ),
        recipe(
            "light-oil-cracking",
            "Light oil cracking",
            Rational::two(),
            Crafted,
            &[("water", 30), ("light-oil", 30)],
            &[("petroleum-gas", 20)],
            "chemical-plant",
        ),
        recipe(
            "plastic-bar",
            "Plastic bar",
            Rational::one(),
            Crafted,
            &[("petroleum-gas", 20), ("coal", 1)],
            &[("plastic-bar", 2)],
            "chemical-plant",
        ),
        recipe(
            "wooden-chest",
            "Wooden chest",
            Rational::ratio(1, 2),
            Crafted,
            &[("wood", 2)],
            &[("wooden-chest", 1)],
            "assembling-machine-2",
        ),
    ]
}

pub fn dataset() -> Dataset {
    Dataset::new(items(), factories(), recipes())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn adjusts_recipe_time_by_producer_speed() {
        let data = dataset();
        assert_eq!(data.recipe_r["coal"].time, Rational::two());
        assert_eq!(data.recipe_r["copper-cable"].time, Rational::ratio(2, 3));
        assert_eq!(data.recipe_r["iron-plate"].time, Rational::ratio(16, 5));
    }

    #[test]
    fn indexes_simple_recipes_only() {
        let data = dataset();
        assert_eq!(
            data.simple_recipe("copper-cable").and_then(|r| r.id.as_deref()),
            Some("copper-cable")
        );
        assert!(data.simple_recipe("petroleum-gas").is_none());
        assert!(data.simple_recipe("heavy-oil").is_none());
        assert!(data.simple_recipe("wood").is_none());
    }

    #[test]
    fn matches_every_recipe_producing_an_item() {
        let data = dataset();
        let ids: Vec<_> = data
            .matching_recipes("petroleum-gas")
            .filter_map(|r| r.id.as_deref())
            .collect();
        assert_eq!(ids, ["basic-oil-processing", "advanced-oil-processing", "light-oil-cracking"]);
    }
}
