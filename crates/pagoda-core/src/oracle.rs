//! The independence oracle contract.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::OracleError;
use crate::variable::Variable;

/// Verdict of a single conditional independence query `X ⟂ Y | Z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndependenceResult {
    pub independent: bool,
    /// p-value of the test. Larger means stronger evidence of independence.
    pub p_value: f64,
    /// Optional auxiliary score (e.g. a BIC difference) for tests that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl IndependenceResult {
    pub fn independent(p_value: f64) -> Self {
        Self {
            independent: true,
            p_value,
            score: None,
        }
    }

    pub fn dependent(p_value: f64) -> Self {
        Self {
            independent: false,
            p_value,
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Answers conditional independence queries.
///
/// Implementations must be safe to call concurrently from the worker pool.
/// How the verdict is computed is entirely up to the implementation.
pub trait IndependenceOracle: Send + Sync {
    fn test(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "oracle"
    }
}

impl<T: IndependenceOracle + ?Sized> IndependenceOracle for Arc<T> {
    fn test(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError> {
        (**self).test(x, y, z)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: IndependenceOracle + ?Sized> IndependenceOracle for &T {
    fn test(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError> {
        (**self).test(x, y, z)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
