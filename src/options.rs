// SPDX-License-Identifier: Apache-2.0

//! Configuration of the partition-and-optimize flows.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PartitionError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowOptions {
    /// Number of partitions requested from the partitioner; 1 keeps the
    /// whole network as a single partition.
    pub num_partitions: usize,
    /// Allowed size imbalance passed through to the partitioner.
    pub imbalance: f64,
    pub worker_threads: usize,
    /// Random simulation vectors used to check the patched network against
    /// the original. 0 disables the check.
    pub verify_samples: usize,
    pub verify_seed: u64,
    /// Where classifier-driven flows persist Karnaugh rasters, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karnaugh_dir: Option<PathBuf>,
    /// Cones too wide to tabulate vote MIG when deeper than this fraction of
    /// the network depth.
    pub big_cone_depth_ratio: f64,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            num_partitions: 1,
            imbalance: 0.5,
            worker_threads: num_cpus::get(),
            verify_samples: 0,
            verify_seed: 0,
            karnaugh_dir: None,
            big_cone_depth_ratio: 0.4,
        }
    }
}

impl FlowOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| PartitionError::Serialization(format!("flow options: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PartitionError::Serialization(format!("flow options: {}", e)))
    }

    /// Worker count actually used for `num_jobs` independent jobs.
    pub fn effective_threads(&self, num_jobs: usize) -> usize {
        self.worker_threads.max(1).min(num_jobs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_fields_take_defaults() {
        let options = FlowOptions::from_json(r#"{"num_partitions": 4, "verify_samples": 256}"#)
            .unwrap();
        assert_eq!(options.num_partitions, 4);
        assert_eq!(options.verify_samples, 256);
        assert_eq!(options.imbalance, 0.5);
        assert_eq!(options.big_cone_depth_ratio, 0.4);
        assert_eq!(options.karnaugh_dir, None);
        assert!(options.worker_threads >= 1);
    }

    #[test]
    fn test_json_round_trip() {
        let options = FlowOptions {
            num_partitions: 3,
            worker_threads: 2,
            karnaugh_dir: Some(PathBuf::from("/tmp/rasters")),
            ..Default::default()
        };
        let text = options.to_json().unwrap();
        assert_eq!(FlowOptions::from_json(&text).unwrap(), options);
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        match FlowOptions::from_json("{\"num_partitions\": \"many\"}") {
            Err(PartitionError::Serialization(msg)) => assert!(msg.contains("flow options")),
            other => panic!("expected Serialization error; got {:?}", other),
        }
    }

    #[test]
    fn test_effective_threads() {
        let options = FlowOptions {
            worker_threads: 8,
            ..Default::default()
        };
        assert_eq!(options.effective_threads(3), 3);
        assert_eq!(options.effective_threads(0), 1);
        let options = FlowOptions {
            worker_threads: 0,
            ..Default::default()
        };
        assert_eq!(options.effective_threads(5), 1);
    }
}
