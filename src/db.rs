//! Database schema and operations

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{Dataset, Factory, Item, Recipe, RecipeKind, SolverSettings};
use crate::rational::Rational;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Rational quantities are stored exactly as "n" or "n/d" text
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT
        );

        CREATE TABLE IF NOT EXISTS factories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            speed TEXT NOT NULL,
            power_kw TEXT NOT NULL,
            pollution TEXT NOT NULL
        );

        -- Recipes keep their dataset order through the rowid
        CREATE TABLE IF NOT EXISTS recipes (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            time TEXT NOT NULL,
            kind TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            amount TEXT NOT NULL,
            PRIMARY KEY (recipe_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            amount TEXT NOT NULL,
            PRIMARY KEY (recipe_id, item_id)
        );

        -- First producer is the one used for speed, power and pollution
        CREATE TABLE IF NOT EXISTS recipe_producers (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            factory_id TEXT NOT NULL,
            PRIMARY KEY (recipe_id, factory_id)
        );

        CREATE TABLE IF NOT EXISTS ignored_items (
            item_id TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS excluded_recipes (
            recipe_id TEXT PRIMARY KEY
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_item ON recipe_outputs(item_id);
        "#,
    )?;
    Ok(())
}

/// Clear all game data, keeping user settings
pub fn clear_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_producers;
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM factories;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

fn rational_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Rational> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, category) VALUES (?1, ?2, ?3)",
        (&item.id, &item.name, &item.category),
    )?;
    Ok(())
}

/// Insert or replace a factory
pub fn upsert_factory(conn: &Connection, factory: &Factory) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO factories (id, name, speed, power_kw, pollution)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &factory.id,
            &factory.name,
            factory.speed.to_string(),
            factory.power_kw.to_string(),
            factory.pollution.to_string(),
        ),
    )?;
    Ok(())
}

/// Insert a recipe together with its inputs, outputs and producers
pub fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT INTO recipes (id, name, time, kind) VALUES (?1, ?2, ?3, ?4)",
        (&recipe.id, &recipe.name, recipe.time.to_string(), recipe.kind.as_str()),
    )
    .with_context(|| format!("failed to insert recipe {}", recipe.id))?;

    for (position, (item, amount)) in recipe.inputs.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_inputs (recipe_id, position, item_id, amount)
             VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, position, item, amount.to_string()),
        )?;
    }
    for (position, (item, amount)) in recipe.outputs.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_outputs (recipe_id, position, item_id, amount)
             VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, position, item, amount.to_string()),
        )?;
    }
    for (position, factory) in recipe.producers.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_producers (recipe_id, position, factory_id)
             VALUES (?1, ?2, ?3)",
            (&recipe.id, position, factory),
        )?;
    }
    Ok(())
}

/// Replace all game data with the contents of `data`
pub fn store_dataset(conn: &mut Connection, data: &Dataset) -> Result<()> {
    let tx = conn.transaction()?;
    clear_data(&tx)?;
    for item in data.items.values() {
        upsert_item(&tx, item)?;
    }
    for factory in data.factories.values() {
        upsert_factory(&tx, factory)?;
    }
    for recipe in data.recipes.values() {
        insert_recipe(&tx, recipe)?;
    }
    tx.commit()?;
    Ok(())
}

/// List all items in dataset order
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, name, category FROM items ORDER BY rowid")?;

    let rows = stmt.query_map([], |row| {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn list_factories(conn: &Connection) -> Result<Vec<Factory>> {
    let mut stmt =
        conn.prepare("SELECT id, name, speed, power_kw, pollution FROM factories ORDER BY rowid")?;

    let rows = stmt.query_map([], |row| {
        Ok(Factory {
            id: row.get(0)?,
            name: row.get(1)?,
            speed: rational_at(row, 2)?,
            power_kw: rational_at(row, 3)?,
            pollution: rational_at(row, 4)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn recipe_amounts(
    conn: &Connection,
    table: &str,
    recipe_id: &str,
) -> Result<Vec<(String, Rational)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT item_id, amount FROM {table} WHERE recipe_id = ?1 ORDER BY position"
    ))?;

    let rows = stmt.query_map([recipe_id], |row| Ok((row.get(0)?, rational_at(row, 1)?)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn recipe_producers(conn: &Connection, recipe_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT factory_id FROM recipe_producers WHERE recipe_id = ?1 ORDER BY position",
    )?;

    let rows = stmt.query_map([recipe_id], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Fill in the inputs, outputs and producers of a bare recipe row
fn complete_recipe(conn: &Connection, mut recipe: Recipe) -> Result<Recipe> {
    recipe.inputs = recipe_amounts(conn, "recipe_inputs", &recipe.id)?;
    recipe.outputs = recipe_amounts(conn, "recipe_outputs", &recipe.id)?;
    recipe.producers = recipe_producers(conn, &recipe.id)?;
    Ok(recipe)
}

fn recipe_header(row: &Row<'_>) -> rusqlite::Result<(Recipe, String)> {
    Ok((
        Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            time: rational_at(row, 2)?,
            kind: RecipeKind::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            producers: Vec::new(),
        },
        row.get(3)?,
    ))
}

fn with_kind((mut recipe, kind): (Recipe, String)) -> Result<Recipe> {
    recipe.kind = RecipeKind::parse(&kind)
        .with_context(|| format!("recipe {} has unknown kind '{}'", recipe.id, kind))?;
    Ok(recipe)
}

/// List all recipes in dataset order
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare("SELECT id, name, time, kind FROM recipes ORDER BY seq")?;

    let rows = stmt.query_map([], recipe_header)?;

    let mut results = Vec::new();
    for row in rows {
        let recipe = with_kind(row?)?;
        results.push(complete_recipe(conn, recipe)?);
    }
    Ok(results)
}

/// Get a single recipe by id
pub fn get_recipe(conn: &Connection, id: &str) -> Result<Option<Recipe>> {
    let header = conn
        .query_row(
            "SELECT id, name, time, kind FROM recipes WHERE id = ?1",
            [id],
            recipe_header,
        )
        .optional()?;

    match header {
        Some(header) => Ok(Some(complete_recipe(conn, with_kind(header)?)?)),
        None => Ok(None),
    }
}

/// Load the whole dataset, adjusting recipe times for their producers
pub fn load_dataset(conn: &Connection) -> Result<Dataset> {
    let items = list_items(conn).context("failed to load items")?;
    let factories = list_factories(conn).context("failed to load factories")?;
    let recipes = list_recipes(conn).context("failed to load recipes")?;
    Ok(Dataset::new(items, factories, recipes))
}

/// Mark or unmark an item as ignored by the solver
pub fn set_item_ignored(conn: &Connection, item_id: &str, ignored: bool) -> Result<()> {
    if ignored {
        conn.execute("INSERT OR IGNORE INTO ignored_items (item_id) VALUES (?1)", [item_id])?;
    } else {
        conn.execute("DELETE FROM ignored_items WHERE item_id = ?1", [item_id])?;
    }
    Ok(())
}

/// Mark or unmark a recipe as excluded from the solver
pub fn set_recipe_excluded(conn: &Connection, recipe_id: &str, excluded: bool) -> Result<()> {
    if excluded {
        conn.execute(
            "INSERT OR IGNORE INTO excluded_recipes (recipe_id) VALUES (?1)",
            [recipe_id],
        )?;
    } else {
        conn.execute("DELETE FROM excluded_recipes WHERE recipe_id = ?1", [recipe_id])?;
    }
    Ok(())
}

/// Load the persisted solver settings
pub fn load_settings(conn: &Connection) -> Result<SolverSettings> {
    let mut settings = SolverSettings::default();

    let mut stmt = conn.prepare("SELECT item_id FROM ignored_items ORDER BY rowid")?;
    for row in stmt.query_map([], |row| row.get(0))? {
        settings.ignored_items.insert(row?);
    }

    let mut stmt = conn.prepare("SELECT recipe_id FROM excluded_recipes ORDER BY rowid")?;
    for row in stmt.query_map([], |row| row.get(0))? {
        settings.excluded_recipes.insert(row?);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sample;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn init_schema_is_idempotent() {
        let conn = conn();
        init_schema(&conn).unwrap();
        assert!(list_items(&conn).unwrap().is_empty());
    }

    #[test]
    fn round_trips_the_sample_dataset() {
        let mut conn = conn();
        let data = sample::dataset();
        store_dataset(&mut conn, &data).unwrap();

        let loaded = load_dataset(&conn).unwrap();
        assert_eq!(loaded.item_ids, data.item_ids);
        assert_eq!(loaded.recipe_ids, data.recipe_ids);
        assert_eq!(loaded.factories, data.factories);
        assert_eq!(loaded.recipes, data.recipes);
        assert_eq!(loaded.recipe_r, data.recipe_r);
    }

    #[test]
    fn stores_rationals_exactly() {
        let conn = conn();
        let factory = Factory {
            id: "assembler".to_string(),
            name: "Assembler".to_string(),
            speed: Rational::ratio(3, 4),
            power_kw: Rational::from(150),
            pollution: Rational::ratio(-1, 3),
        };
        upsert_factory(&conn, &factory).unwrap();

        let speed: String = conn
            .query_row("SELECT speed FROM factories WHERE id = 'assembler'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(speed, "3/4");
        assert_eq!(list_factories(&conn).unwrap(), vec![factory]);
    }

    #[test]
    fn get_recipe_returns_none_for_unknown_ids() {
        let mut conn = conn();
        store_dataset(&mut conn, &sample::dataset()).unwrap();
        assert!(get_recipe(&conn, "rocket-silo").unwrap().is_none());

        let cable = get_recipe(&conn, "copper-cable").unwrap().unwrap();
        assert_eq!(cable.inputs, vec![("copper-plate".to_string(), Rational::one())]);
        assert_eq!(cable.outputs, vec![("copper-cable".to_string(), Rational::two())]);
        assert_eq!(cable.producers, vec!["assembling-machine-2".to_string()]);
    }

    #[test]
    fn rejects_corrupt_quantities() {
        let conn = conn();
        conn.execute(
            "INSERT INTO factories (id, name, speed, power_kw, pollution)
             VALUES ('x', 'X', '1/0', '0', '0')",
            [],
        )
        .unwrap();
        assert!(list_factories(&conn).is_err());
    }

    #[test]
    fn clear_data_keeps_settings() {
        let mut conn = conn();
        store_dataset(&mut conn, &sample::dataset()).unwrap();
        set_item_ignored(&conn, "coal", true).unwrap();
        clear_data(&conn).unwrap();

        assert!(list_recipes(&conn).unwrap().is_empty());
        assert!(load_settings(&conn).unwrap().ignored_items.contains("coal"));
    }

    #[test]
    fn toggles_settings() {
        let conn = conn();
        set_item_ignored(&conn, "coal", true).unwrap();
        set_item_ignored(&conn, "coal", true).unwrap();
        set_recipe_excluded(&conn, "basic-oil-processing", true).unwrap();
        set_recipe_excluded(&conn, "light-oil-cracking", true).unwrap();
        set_recipe_excluded(&conn, "light-oil-cracking", false).unwrap();

        let settings = load_settings(&conn).unwrap();
        assert_eq!(settings.ignored_items.iter().collect::<Vec<_>>(), vec!["coal"]);
        assert_eq!(
            settings.excluded_recipes.iter().collect::<Vec<_>>(),
            vec!["basic-oil-processing"]
        );
    }
}
