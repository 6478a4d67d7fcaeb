/// Crate version, taken from Cargo at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Internal cap applied when the adjacency search depth is unbounded (`-1`).
pub const MAX_DEPTH_CAP: usize = 1000;

/// Internal cap applied when the discriminating path length is unbounded (`-1`).
pub const MAX_DISCRIMINATING_PATH_CAP: usize = 1000;

/// Upper bound on sweeps of any orientation fixed-point loop.
pub const MAX_RULE_ITERATIONS: usize = 10_000;

/// Largest subset size tried by the legality repair step.
pub const MAX_REPAIR_BOUND: usize = 8;

/// Environment variable read by `tracing_setup::init_tracing`.
pub const LOG_ENV_VAR: &str = "PAGODA_LOG";
