//! Linear-programming solver for unresolved production steps
//!
//! Each phase is a plain function over explicit inputs:
//! [`build_state`] → [`canonical`] → [`simplex`] → [`parse_solution`] →
//! [`update_steps`].

pub mod canonical;
pub mod solution;
pub mod state;
pub mod tableau;
pub mod update;

use tracing::{debug, error};

use crate::error::SolverError;
use crate::models::{Dataset, SolverSettings, Step};
use crate::rates::RateUtility;

pub use canonical::{canonical, Cost, Tableau};
pub use solution::{parse_solution, Solution};
pub use state::{build_state, MatrixState};
pub use tableau::{pivot, pivot_col, simplex};
pub use update::update_steps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Every step already had a recipe; nothing was touched.
    Unchanged,
    Solved,
    /// The simplex method found no optimum; steps were left as they were.
    Infeasible,
}

/// Resolves every step that still lacks a recipe, mutating `steps` in place.
pub fn solve(
    steps: &mut Vec<Step>,
    settings: &SolverSettings,
    data: &Dataset,
    rates: &dyn RateUtility,
) -> Result<SolveOutcome, SolverError> {
    if steps.is_empty() {
        return Ok(SolveOutcome::Unchanged);
    }
    let Some(state) = build_state(steps, settings, data)? else {
        debug!("all steps resolved, skipping simplex");
        return Ok(SolveOutcome::Unchanged);
    };

    match get_solution(&state) {
        Some(solution) => {
            update_steps(steps, &solution, &state, rates);
            Ok(SolveOutcome::Solved)
        }
        None => {
            error!(
                items = state.items.len(),
                recipes = state.recipes.len(),
                "failed to solve matrix using simplex method"
            );
            Ok(SolveOutcome::Infeasible)
        }
    }
}

/// Builds and solves the tableau for `state`, or `None` if it is unbounded.
pub fn get_solution(state: &MatrixState<'_>) -> Option<Solution> {
    let mut tableau = canonical(state);
    if !simplex(&mut tableau) {
        return None;
    }
    Some(parse_solution(&tableau, state))
}
