//! Production chain solver
//!
//! Resolves which recipes to run, and how fast, to meet a set of product
//! demands. Quantities are exact rationals and the plan is found with a
//! simplex linear program.

pub mod calculator;
pub mod db;
pub mod error;
pub mod models;
pub mod rates;
pub mod rational;
pub mod sample;
pub mod simplex;

pub use error::{RationalError, SolverError};
pub use rational::Rational;
pub use simplex::{solve, SolveOutcome};
