//! Golden end-to-end scenarios.

use pagoda_core::{IndependenceOracle, Variable};
use serde::{Deserialize, Serialize};

use crate::dag::Dag;
use crate::oracles::{DsepOracle, Fact, TableOracle};

/// Where a scenario's independence facts come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OracleSpec {
    /// Exact d-separation in this DAG.
    Dag { dag: Dag },
    /// Only these facts are independences.
    Table { facts: Vec<Fact> },
}

/// A search input and the edges it must produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub variables: Vec<Variable>,
    pub oracle: OracleSpec,
    /// A `SearchConfig` TOML document; empty means defaults.
    #[serde(default)]
    pub config_toml: String,
    /// A `Knowledge` TOML document; empty means none.
    #[serde(default)]
    pub knowledge_toml: String,
    /// Sorted edge strings of the expected output.
    pub expected_edges: Vec<String>,
}

impl Scenario {
    pub fn build_oracle(&self) -> Box<dyn IndependenceOracle> {
        match &self.oracle {
            OracleSpec::Dag { dag } => Box::new(DsepOracle::new(dag.clone())),
            OracleSpec::Table { facts } => Box::new(TableOracle::from_facts(facts)),
        }
    }
}

/// Load `golden/<file_name>` as a scenario.
pub fn load_scenario(file_name: &str) -> Scenario {
    crate::load_fixture(file_name)
}
