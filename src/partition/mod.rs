// SPDX-License-Identifier: Apache-2.0

//! Partitioning of a network into independently optimizable pieces and the
//! machinery to analyze them and patch optimized results back.

pub mod classify;
pub mod cone;
pub mod karnaugh;
pub mod ledger;
pub mod sync;
pub mod view;

pub type PartitionId = usize;

pub use classify::{Classifier, PartitionScore};
pub use cone::{ConeAnalyzer, ConeFeatures, LogicCone, MAX_TABULATED_INPUTS};
pub use karnaugh::{KarnaughGrid, KarnaughImage};
pub use ledger::{BoundaryTables, MergedBoundary, PartitionLedger};
pub use sync::{SubstitutionMap, SyncReport};
pub use view::{LocalSignal, PartitionView, ViewIndex};
