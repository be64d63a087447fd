//! Error types for the solver core

use thiserror::Error;

use crate::models::ItemId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RationalError {
    #[error("denominator must not be zero")]
    ZeroDenominator,
    #[error("invalid rational literal `{0}`")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// An item reached the working set with no registered recipe producing it.
    ///
    /// Inputs without a producer get a unit recipe, so this only fires for an
    /// output listed at a non-positive amount that nothing else produces.
    #[error("item `{0}` is not produced by any recipe in the working set")]
    Unproducible(ItemId),
}
