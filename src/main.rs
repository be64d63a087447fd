//! Lab Solver
//!
//! Command-line front end for the exact production chain solver.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use lab_solver::calculator;
use lab_solver::db;
use lab_solver::models::SolverSettings;
use lab_solver::rates::FactoryRates;
use lab_solver::rational::Rational;
use lab_solver::sample;

#[derive(Parser)]
#[command(name = "lab-solver")]
#[command(about = "Exact production chain solver")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "lab_data.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a production plan for a target item
    Calc {
        /// Target item id (e.g., "electronic-circuit")
        item: String,

        /// Target rate in items per second, as "n", "n/d" or a decimal
        #[arg(short, long, default_value = "1")]
        rate: String,

        /// Decimal places shown in the output
        #[arg(short, long, default_value_t = 2)]
        precision: usize,

        /// Show every step of the plan
        #[arg(short, long)]
        verbose: bool,

        /// Treat an item as a raw input for this run
        #[arg(long = "ignore", value_name = "ITEM")]
        ignored: Vec<String>,

        /// Leave a recipe out of this run
        #[arg(long = "exclude", value_name = "RECIPE")]
        excluded: Vec<String>,
    },

    /// List all items in the database
    ListItems,

    /// List all recipes in the database
    ListRecipes,

    /// Show details for a specific recipe
    Recipe {
        /// Recipe ID
        id: String,
    },

    /// Always treat an item as a raw input
    Ignore {
        item: String,

        /// Remove the item from the ignored list instead
        #[arg(long)]
        undo: bool,
    },

    /// Always leave a recipe out of the solver
    Exclude {
        recipe: String,

        /// Remove the recipe from the excluded list instead
        #[arg(long)]
        undo: bool,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample dataset
    LoadSample,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut conn = Connection::open(&cli.database)
        .with_context(|| format!("failed to open database {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Calc {
            item,
            rate,
            precision,
            verbose,
            ignored,
            excluded,
        } => {
            let rate: Rational = rate
                .parse()
                .with_context(|| format!("invalid rate '{}'", rate))?;
            let data = db::load_dataset(&conn)?;
            if data.recipes.is_empty() {
                println!("No recipes in database. Run 'load-sample' first.");
                return Ok(());
            }

            let mut settings = db::load_settings(&conn)?;
            settings.merge(SolverSettings {
                ignored_items: ignored.into_iter().collect(),
                excluded_recipes: excluded.into_iter().collect(),
            });

            let products = vec![(item, rate)];
            let steps =
                calculator::calculate_production_plan(&data, &products, &settings, &FactoryRates)?;

            if verbose {
                println!("Production steps:\n");
                println!("{}", calculator::format_steps(&steps, &data, precision));
            }

            let summary = calculator::summarize_plan(&steps, &products, &data, precision);
            println!("{}", summary);
        }

        Commands::ListItems => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'load-sample' first.");
            } else {
                println!("{:<24} {:<24} {:<16}", "ID", "Item", "Category");
                println!("{}", "-".repeat(66));
                for i in items {
                    println!("{:<24} {:<24} {:<16}", i.id, i.name, i.category.unwrap_or_default());
                }
            }
        }

        Commands::ListRecipes => {
            let recipes = db::list_recipes(&conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'load-sample' first.");
            } else {
                println!("{:<28} {:<28} {:>8} {:<8}", "ID", "Recipe", "Time (s)", "Kind");
                println!("{}", "-".repeat(75));
                for r in recipes {
                    println!(
                        "{:<28} {:<28} {:>8} {:<8}",
                        r.id,
                        r.name,
                        r.time.to_string(),
                        r.kind.as_str()
                    );
                }
            }
        }

        Commands::Recipe { id } => match db::get_recipe(&conn, &id)? {
            Some(r) => {
                println!("Recipe: {}", r.name);
                println!("  ID: {}", r.id);
                println!("  Time: {}s", r.time);
                println!("  Kind: {}", r.kind.as_str());

                if !r.inputs.is_empty() {
                    println!("  Inputs:");
                    for (item, amount) in &r.inputs {
                        println!("    {} x {}", amount, item);
                    }
                }
                if !r.outputs.is_empty() {
                    println!("  Outputs:");
                    for (item, amount) in &r.outputs {
                        println!("    {} x {}", amount, item);
                    }
                }
                if !r.producers.is_empty() {
                    println!("  Producers: {}", r.producers.join(", "));
                }
            }
            None => println!("Recipe '{}' not found", id),
        },

        Commands::Ignore { item, undo } => {
            db::set_item_ignored(&conn, &item, !undo)?;
            if undo {
                println!("'{}' is no longer ignored", item);
            } else {
                println!("'{}' will be treated as a raw input", item);
            }
        }

        Commands::Exclude { recipe, undo } => {
            db::set_recipe_excluded(&conn, &recipe, !undo)?;
            if undo {
                println!("'{}' is no longer excluded", recipe);
            } else {
                println!("'{}' will be left out of plans", recipe);
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let data = sample::dataset();
            db::store_dataset(&mut conn, &data)?;
            println!(
                "Loaded {} items, {} factories and {} recipes",
                data.items.len(),
                data.factories.len(),
                data.recipes.len()
            );
        }
    }

    Ok(())
}
