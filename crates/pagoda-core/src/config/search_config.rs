//! Top-level search configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::{MAX_DEPTH_CAP, MAX_DISCRIMINATING_PATH_CAP, MAX_REPAIR_BOUND};
use crate::errors::ConfigError;
use crate::variable::Variable;

/// How unshielded triples are judged to be colliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderPolicy {
    /// Consult the separating set recorded during adjacency search.
    #[default]
    Sepsets,
    /// Require every independence-satisfying conditioning set to agree.
    Conservative,
    /// Follow the conditioning set with the largest p-value.
    MaxP,
}

impl ColliderPolicy {
    pub const ALL: [ColliderPolicy; 3] = [Self::Sepsets, Self::Conservative, Self::MaxP];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sepsets => "sepsets",
            Self::Conservative => "conservative",
            Self::MaxP => "max_p",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "sepsets" => Some(Self::Sepsets),
            "conservative" => Some(Self::Conservative),
            "max_p" | "maxp" => Some(Self::MaxP),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColliderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which equivalence class the search produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Tail/arrow marks only, no latent confounders assumed.
    #[default]
    Cpdag,
    /// Circle marks allowed, latent confounders and selection tolerated.
    Pag,
}

/// Configuration for a single search run.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`PAGODA_*`, via `apply_env_overrides`)
/// 2. TOML file or string
/// 3. Compiled defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum conditioning set size; `-1` is unbounded.
    pub depth: i32,
    /// Freeze adjacencies per depth level so the result is order independent.
    pub stable: bool,
    pub collider_policy: ColliderPolicy,
    pub max_p_margin: f64,
    /// Apply max-p colliders in one global p-value order.
    pub max_p_global: bool,
    /// Within the global order, apply smaller conditioning sets first.
    pub max_p_depth_stratified: bool,
    pub target: TargetKind,
    /// `-1` is unbounded.
    pub max_discriminating_path_length: i32,
    pub possible_dsep: bool,
    pub possible_dsep_max_path_length: usize,
    /// Run R5-R10 after R1-R4 for PAG targets.
    pub complete_rule_set: bool,
    pub guarantee_valid_output: bool,
    /// Largest number of triples flipped at once during repair.
    pub repair_bound: usize,
    /// Never used inside a conditioning set.
    pub excluded_from_conditioning: Vec<Variable>,
    pub timeout_ms: Option<u64>,
    /// Worker threads; `None` runs sequentially, `Some(0)` lets rayon choose.
    pub threads: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: defaults::DEFAULT_DEPTH,
            stable: defaults::DEFAULT_STABLE,
            collider_policy: ColliderPolicy::default(),
            max_p_margin: defaults::DEFAULT_MAX_P_MARGIN,
            max_p_global: defaults::DEFAULT_MAX_P_GLOBAL,
            max_p_depth_stratified: defaults::DEFAULT_MAX_P_DEPTH_STRATIFIED,
            target: TargetKind::default(),
            max_discriminating_path_length: defaults::DEFAULT_MAX_DISCRIMINATING_PATH_LENGTH,
            possible_dsep: defaults::DEFAULT_POSSIBLE_DSEP,
            possible_dsep_max_path_length: defaults::DEFAULT_POSSIBLE_DSEP_MAX_PATH_LENGTH,
            complete_rule_set: defaults::DEFAULT_COMPLETE_RULE_SET,
            guarantee_valid_output: defaults::DEFAULT_GUARANTEE_VALID_OUTPUT,
            repair_bound: defaults::DEFAULT_REPAIR_BOUND,
            excluded_from_conditioning: Vec::new(),
            timeout_ms: None,
            threads: None,
        }
    }
}

impl SearchConfig {
    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply `PAGODA_*` overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let mut config: SearchConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `PAGODA_*` environment variable overrides.
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PAGODA_DEPTH") {
            if let Ok(v) = val.parse::<i32>() {
                self.depth = v;
            }
        }
        if let Ok(val) = std::env::var("PAGODA_STABLE") {
            if let Ok(v) = val.parse::<bool>() {
                self.stable = v;
            }
        }
        if let Ok(val) = std::env::var("PAGODA_COLLIDER_POLICY") {
            if let Some(v) = ColliderPolicy::from_str_name(&val) {
                self.collider_policy = v;
            }
        }
        if let Ok(val) = std::env::var("PAGODA_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                self.timeout_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("PAGODA_THREADS") {
            if let Ok(v) = val.parse::<usize>() {
                self.threads = Some(v);
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth < -1 {
            return Err(ConfigError::ValidationFailed {
                field: "depth".to_string(),
                message: "must be -1 (unbounded) or >= 0".to_string(),
            });
        }
        if !self.max_p_margin.is_finite() || self.max_p_margin < 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "max_p_margin".to_string(),
                message: "must be a finite value >= 0".to_string(),
            });
        }
        if self.max_discriminating_path_length < -1 {
            return Err(ConfigError::ValidationFailed {
                field: "max_discriminating_path_length".to_string(),
                message: "must be -1 (unbounded) or >= 0".to_string(),
            });
        }
        if self.possible_dsep_max_path_length == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "possible_dsep_max_path_length".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.repair_bound > MAX_REPAIR_BOUND {
            return Err(ConfigError::ValidationFailed {
                field: "repair_bound".to_string(),
                message: format!("must be at most {MAX_REPAIR_BOUND}"),
            });
        }
        Ok(())
    }

    /// Depth cap actually used for `num_vars` variables.
    pub fn effective_depth(&self, num_vars: usize) -> usize {
        let bound = num_vars.saturating_sub(2);
        if self.depth < 0 {
            MAX_DEPTH_CAP.min(bound)
        } else {
            (self.depth as usize).min(bound)
        }
    }

    pub fn effective_max_path_length(&self) -> usize {
        if self.max_discriminating_path_length < 0 {
            MAX_DISCRIMINATING_PATH_CAP
        } else {
            self.max_discriminating_path_length as usize
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
