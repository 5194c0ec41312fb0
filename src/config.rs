#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::OnceLock;

use tracing::level_filters::LevelFilter;

/// Node limit applied to wire trees when `TREEGRADE_MAX_NODES` is unset.
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Process-wide settings read from the environment.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Maximum log level emitted by the binary.
    log_level: LevelFilter,
    /// Maximum number of nodes accepted in a single wire tree.
    max_nodes: usize,
    /// Whether JSON output is pretty-printed.
    pretty:    bool,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::INFO,
            max_nodes: DEFAULT_MAX_NODES,
            pretty:    false,
        }
    }
}

impl GraderConfig {
    /// Builds a configuration from `TREEGRADE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: read_level("TREEGRADE_LOG", defaults.log_level),
            max_nodes: read_usize("TREEGRADE_MAX_NODES", defaults.max_nodes),
            pretty:    read_flag("TREEGRADE_PRETTY", defaults.pretty),
        }
    }

    /// Returns the configured log level filter.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// Returns the node limit for parsed trees.
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Returns whether JSON output should be pretty-printed.
    pub fn pretty(&self) -> bool {
        self.pretty
    }
}

/// Global storage for the lazily read configuration.
static CONFIG: OnceLock<GraderConfig> = OnceLock::new();

/// Returns the active configuration, reading the environment on first use.
pub fn get() -> &'static GraderConfig {
    CONFIG.get_or_init(GraderConfig::from_env)
}

/// Parses a log level, falling back to `default` when the variable is missing
/// or not a recognised level.
fn read_level(env: &str, default: LevelFilter) -> LevelFilter {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(default)
}

/// Parses a positive count, falling back to `default` when parsing fails or
/// the variable is missing.
fn read_usize(env: &str, default: usize) -> usize {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default)
}

/// Parses a boolean switch (`1`, `true`, `yes`, `on`).
fn read_flag(env: &str, default: bool) -> bool {
    match std::env::var(env) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
