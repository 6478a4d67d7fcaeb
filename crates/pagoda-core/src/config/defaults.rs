//! Single source of truth for all default configuration values.

// Adjacency search
/// `-1` means unbounded.
pub const DEFAULT_DEPTH: i32 = -1;
pub const DEFAULT_STABLE: bool = true;

// Collider orientation
pub const DEFAULT_MAX_P_MARGIN: f64 = 0.0;
pub const DEFAULT_MAX_P_GLOBAL: bool = false;
pub const DEFAULT_MAX_P_DEPTH_STRATIFIED: bool = false;

// Rule engine
/// `-1` means unbounded.
pub const DEFAULT_MAX_DISCRIMINATING_PATH_LENGTH: i32 = -1;
pub const DEFAULT_COMPLETE_RULE_SET: bool = true;
pub const DEFAULT_POSSIBLE_DSEP: bool = false;
pub const DEFAULT_POSSIBLE_DSEP_MAX_PATH_LENGTH: usize = 3;

// Output legality
pub const DEFAULT_GUARANTEE_VALID_OUTPUT: bool = false;
pub const DEFAULT_REPAIR_BOUND: usize = 2;
