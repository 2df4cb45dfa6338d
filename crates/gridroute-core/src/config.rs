//! Search parameters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Nearest neighbors selected per node before symmetrization.
    pub k_neighbors: usize,
    /// Minimum node count of a candidate path, inclusive.
    pub min_nodes: usize,
    /// Maximum node count of a candidate path, inclusive.
    pub max_nodes: usize,
    /// Upper bound on routes evaluated at the same time.
    pub max_concurrent_routes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 3,
            min_nodes: 3,
            max_nodes: 5,
            max_concurrent_routes: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"max_nodes": 7}"#).unwrap();
        assert_eq!(config.max_nodes, 7);
        assert_eq!(config.k_neighbors, 3);
        assert_eq!(config.min_nodes, 3);
    }
}
