// SPDX-License-Identifier: Apache-2.0

//! Per-partition representation choice driven by an image classifier.

use crate::error::{PartitionError, Result};
use crate::network::{Network, Representation};
use crate::partition::cone::{ConeAnalyzer, ConeFeatures};
use crate::partition::karnaugh::{KarnaughImage, MIN_IMAGE_INPUTS};
use crate::partition::{PartitionId, PartitionLedger};

/// Predicts which representation optimizes a cone better from its Karnaugh
/// image.
pub trait Classifier: Sync {
    fn classify(&self, image: &KarnaughImage) -> anyhow::Result<Representation>;
}

impl<F> Classifier for F
where
    F: Fn(&KarnaughImage) -> anyhow::Result<Representation> + Sync,
{
    fn classify(&self, image: &KarnaughImage) -> anyhow::Result<Representation> {
        self(image)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionScore {
    pub partition: PartitionId,
    pub aig_score: f64,
    pub mig_score: f64,
    pub winner: Representation,
}

fn depth_weight(depth: f64, avg_depth: f64) -> f64 {
    if depth > avg_depth + 2.0 {
        3.0
    } else if depth > avg_depth + 1.0 {
        2.0
    } else if depth > avg_depth {
        1.3
    } else {
        1.0
    }
}

impl PartitionLedger {
    /// Scores every non-empty partition and records the winner in the AIG or
    /// MIG bucket.
    ///
    /// Tabulated outputs add `w_nodes * cone_size + w_depth * depth` to the
    /// bucket the classifier predicts, where the weights grow for cones larger
    /// or deeper than the partition's average. Outputs too wide to tabulate,
    /// or with fewer than `MIN_IMAGE_INPUTS` inputs, add
    /// `cone_size + 3 * depth` to MIG when deeper than
    /// `big_cone_depth_ratio` times the network depth, else to AIG. AIG wins
    /// only with a strictly greater score.
    pub fn run_classification(
        &mut self,
        net: &Network,
        classifier: &dyn Classifier,
        big_cone_depth_ratio: f64,
    ) -> Result<Vec<PartitionScore>> {
        let network_depth = net.depth() as f64;
        let mut scores = Vec::new();
        for p in 0..self.num_partitions() {
            let features: Vec<ConeFeatures> = {
                let analyzer = ConeAnalyzer::for_partition(net, self, p);
                self.outputs(p)
                    .iter()
                    .filter(|o| !net.is_constant(**o))
                    .map(|o| analyzer.features(*o))
                    .collect()
            };
            if features.is_empty() {
                log::debug!("partition {}: no outputs to classify", p);
                continue;
            }
            let count = features.len() as f64;
            let avg_depth = features.iter().map(|f| f.depth as f64).sum::<f64>() / count;
            let avg_nodes = features.iter().map(|f| f.cone_size as f64).sum::<f64>() / count;

            let mut aig_score = 0.0;
            let mut mig_score = 0.0;
            for f in &features {
                let depth = f.depth as f64;
                let nodes = f.cone_size as f64;
                match f.truth_table.as_ref().filter(|_| f.inputs.len() >= MIN_IMAGE_INPUTS) {
                    Some(tt) => {
                        let image = KarnaughImage::from_truth_table(tt);
                        let label = classifier.classify(&image).map_err(|e| {
                            PartitionError::Classifier(format!(
                                "partition {} output {}: {:#}",
                                p, f.output, e
                            ))
                        })?;
                        let w_nodes = if nodes > avg_nodes { 1.5 } else { 1.0 };
                        let score = w_nodes * nodes + depth_weight(depth, avg_depth) * depth;
                        match label {
                            Representation::Aig => aig_score += score,
                            Representation::Mig => mig_score += score,
                        }
                    }
                    None => {
                        let score = nodes + 3.0 * depth;
                        if depth > big_cone_depth_ratio * network_depth {
                            mig_score += score;
                        } else {
                            aig_score += score;
                        }
                    }
                }
            }
            let winner = if aig_score > mig_score {
                Representation::Aig
            } else {
                Representation::Mig
            };
            log::debug!(
                "partition {}: AIG score {:.2}, MIG score {:.2} -> {}",
                p,
                aig_score,
                mig_score,
                winner
            );
            self.assign_representation(p, winner);
            scores.push(PartitionScore {
                partition: p,
                aig_score,
                mig_score,
                winner,
            });
        }
        log::info!(
            "classification: {} AIG partitions, {} MIG partitions",
            self.aig_partitions().len(),
            self.mig_partitions().len()
        );
        Ok(scores)
    }
}
