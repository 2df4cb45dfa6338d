//! CLI configuration from environment.

use gridroute_core::SearchConfig;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    /// Tokio worker threads, also the cap on blocking grid searches.
    pub workers: usize,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = SearchConfig::default();
        Self {
            search: SearchConfig {
                k_neighbors: parse_var("GRIDROUTE_K_NEIGHBORS").unwrap_or(defaults.k_neighbors),
                min_nodes: parse_var("GRIDROUTE_MIN_NODES").unwrap_or(defaults.min_nodes),
                max_nodes: parse_var("GRIDROUTE_MAX_NODES").unwrap_or(defaults.max_nodes),
                max_concurrent_routes: parse_var("GRIDROUTE_MAX_CONCURRENT_ROUTES")
                    .unwrap_or(defaults.max_concurrent_routes),
            },
            workers: parse_var("GRIDROUTE_WORKERS")
                .filter(|&workers: &usize| workers > 0)
                .unwrap_or_else(default_workers),
            log_format: match env::var("GRIDROUTE_LOG_FORMAT") {
                Ok(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
