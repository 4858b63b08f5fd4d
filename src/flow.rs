// SPDX-License-Identifier: Apache-2.0

//! Partition-and-optimize flows.
//!
//! Both flows extract one sub-network per partition and optimize them on a
//! worker pool, then splice the results back on the calling thread:
//! synchronization in ascending partition order, `connect_outputs`, dead-node
//! elimination and an optional random-simulation check against the input
//! network.
//!
//! * `mixed_brute` runs an AIG script and a MIG script on every partition and
//!   keeps the result with the smaller `gates * depth` (AIG on ties).
//! * `mixed_classified` lets a classifier pick the representation from the
//!   partition's Karnaugh images and runs only the chosen script.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{PartitionError, Result};
use crate::gate_sim::random_equivalence_check;
use crate::hypergraph::HypergraphPartitioner;
use crate::network::{Network, NetworkOptions, Representation};
use crate::options::FlowOptions;
use crate::partition::{Classifier, PartitionId, PartitionLedger, PartitionView, SyncReport};
use crate::scripts::OptimizationScript;

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome {
    pub partition: PartitionId,
    pub representation: Representation,
    pub gates_before: usize,
    pub depth_before: usize,
    pub gates_after: usize,
    pub depth_after: usize,
    /// `gates * depth` of the AIG result, when the AIG script ran.
    pub aig_cost: Option<usize>,
    pub mig_cost: Option<usize>,
    pub sync: SyncReport,
}

#[derive(Debug, Clone)]
pub struct FlowReport {
    /// The patched network after dead-node elimination.
    pub network: Network,
    pub outcomes: Vec<PartitionOutcome>,
    pub substitutions: usize,
    pub gates_before: usize,
    pub gates_after: usize,
    pub depth_before: usize,
    pub depth_after: usize,
}

/// Work product of one partition, carried from a worker to the splice step.
struct PartitionJob<'a> {
    partition: PartitionId,
    view: PartitionView<'a>,
    representation: Representation,
    optimized: Network,
    gates_before: usize,
    depth_before: usize,
    aig_cost: Option<usize>,
    mig_cost: Option<usize>,
}

fn cost(net: &Network) -> usize {
    net.num_gates() * net.depth()
}

/// Partitions `net` as configured by `options`.
pub fn partition_network(
    net: &Network,
    options: &FlowOptions,
    partitioner: &dyn HypergraphPartitioner,
) -> Result<PartitionLedger> {
    PartitionLedger::with_partitioner(net, options.num_partitions, options.imbalance, partitioner)
}

fn run_script(script: &dyn OptimizationScript, sub: &Network) -> Result<Network> {
    script.run(sub).map_err(|e| PartitionError::Script {
        name: script.name().to_string(),
        message: format!("{} on {}: {:#}", script.representation(), sub.name, e),
    })
}

/// Runs `work` for every id in `jobs` on up to `threads` scoped workers.
/// Results come back in job order; after the first failure no new job is
/// started and the earliest failure is returned.
fn run_parallel<T, F>(jobs: &[PartitionId], threads: usize, work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(PartitionId) -> Result<T> + Sync,
{
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let slots: Mutex<Vec<Option<Result<T>>>> = Mutex::new((0..jobs.len()).map(|_| None).collect());

    std::thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| {
                loop {
                    if failed.load(Ordering::SeqCst) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    if index >= jobs.len() {
                        break;
                    }
                    let result = work(jobs[index]);
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    let mut guard = slots.lock().unwrap();
                    guard[index] = Some(result);
                }
            });
        }
    });

    let mut results = Vec::with_capacity(jobs.len());
    for (index, slot) in slots.into_inner().unwrap().into_iter().enumerate() {
        match slot {
            Some(result) => results.push(result?),
            // Jobs are claimed in order, so an unclaimed one follows a failure.
            None => unreachable!("job {} skipped without an earlier failure", index),
        }
    }
    Ok(results)
}

/// Partitions that still own nodes and have something to optimize.
fn live_partitions(ledger: &PartitionLedger) -> Vec<PartitionId> {
    (0..ledger.num_partitions())
        .filter(|p| !ledger.is_retired(*p))
        .filter(|p| !(ledger.outputs(*p).is_empty() && ledger.reg_inputs(*p).is_empty()))
        .collect()
}

fn extract<'a>(
    net: &'a Network,
    ledger: &PartitionLedger,
    p: PartitionId,
) -> Result<(PartitionView<'a>, Network)> {
    let view = ledger.create_part(net, p)?;
    let sub = view.to_network(format!("{}_part_{}", net.name, p));
    Ok((view, sub))
}

/// Optimizes every partition with both scripts and keeps the cheaper result.
pub fn mixed_brute(
    net: &Network,
    ledger: &mut PartitionLedger,
    aig_script: &dyn OptimizationScript,
    mig_script: &dyn OptimizationScript,
    options: &FlowOptions,
) -> Result<FlowReport> {
    let jobs = live_partitions(ledger);
    let threads = options.effective_threads(jobs.len());
    log::info!(
        "mixed_brute: {} partitions of {} on {} threads ({} / {})",
        jobs.len(),
        net.name,
        threads,
        aig_script.name(),
        mig_script.name()
    );
    let shared: &PartitionLedger = ledger;
    let results = run_parallel(&jobs, threads, |p| {
        let (view, sub) = extract(net, shared, p)?;
        let aig = run_script(aig_script, &sub)?;
        let mig = run_script(mig_script, &sub)?;
        let (aig_cost, mig_cost) = (cost(&aig), cost(&mig));
        let (representation, optimized) = if aig_cost <= mig_cost {
            (Representation::Aig, aig)
        } else {
            (Representation::Mig, mig)
        };
        log::debug!(
            "partition {}: AIG cost {}, MIG cost {} -> {}",
            p,
            aig_cost,
            mig_cost,
            representation
        );
        Ok(PartitionJob {
            partition: p,
            view,
            representation,
            optimized,
            gates_before: sub.num_gates(),
            depth_before: sub.depth(),
            aig_cost: Some(aig_cost),
            mig_cost: Some(mig_cost),
        })
    })?;
    for job in &results {
        ledger.assign_representation(job.partition, job.representation);
    }
    splice(net, ledger, results, options)
}

/// Classifies every partition and optimizes it with the script of the
/// winning representation only.
pub fn mixed_classified(
    net: &Network,
    ledger: &mut PartitionLedger,
    classifier: &dyn Classifier,
    aig_script: &dyn OptimizationScript,
    mig_script: &dyn OptimizationScript,
    options: &FlowOptions,
) -> Result<FlowReport> {
    let candidates = live_partitions(ledger);
    if let Some(dir) = &options.karnaugh_dir {
        std::fs::create_dir_all(dir)?;
        for p in &candidates {
            ledger.write_karnaugh_maps(net, *p, dir)?;
        }
    }
    ledger.run_classification(net, classifier, options.big_cone_depth_ratio)?;

    let jobs: Vec<PartitionId> = candidates
        .into_iter()
        .filter(|p| ledger.representation_of(*p).is_some())
        .collect();
    let threads = options.effective_threads(jobs.len());
    log::info!(
        "mixed_classified: {} AIG and {} MIG partitions of {} on {} threads",
        ledger.aig_partitions().len(),
        ledger.mig_partitions().len(),
        net.name,
        threads
    );
    let shared: &PartitionLedger = ledger;
    let results = run_parallel(&jobs, threads, |p| {
        let representation = shared
            .representation_of(p)
            .unwrap_or_else(|| panic!("partition {} was filtered as classified", p));
        let script = match representation {
            Representation::Aig => aig_script,
            Representation::Mig => mig_script,
        };
        let (view, sub) = extract(net, shared, p)?;
        let optimized = run_script(script, &sub)?;
        let optimized_cost = Some(cost(&optimized));
        let (aig_cost, mig_cost) = match representation {
            Representation::Aig => (optimized_cost, None),
            Representation::Mig => (None, optimized_cost),
        };
        Ok(PartitionJob {
            partition: p,
            view,
            representation,
            optimized,
            gates_before: sub.num_gates(),
            depth_before: sub.depth(),
            aig_cost,
            mig_cost,
        })
    })?;
    splice(net, ledger, results, options)
}

fn splice(
    net: &Network,
    ledger: &mut PartitionLedger,
    jobs: Vec<PartitionJob<'_>>,
    options: &FlowOptions,
) -> Result<FlowReport> {
    // Hashing stays off while splicing so every replacement is a fresh node
    // or a view leaf, never an unrelated node of the parent.
    let mut patched = net.clone();
    patched.set_options(NetworkOptions {
        fold: true,
        hash: false,
    });
    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        let sync = ledger.synchronize_part(job.partition, &job.view, &job.optimized, &mut patched)?;
        outcomes.push(PartitionOutcome {
            partition: job.partition,
            representation: job.representation,
            gates_before: job.gates_before,
            depth_before: job.depth_before,
            gates_after: job.optimized.num_gates(),
            depth_after: job.optimized.depth(),
            aig_cost: job.aig_cost,
            mig_cost: job.mig_cost,
            sync,
        });
    }
    let substitutions = ledger.connect_outputs(&mut patched);
    let (mut network, _) = patched.cleanup_dangling();
    network.set_options(net.options());

    if options.verify_samples > 0 {
        random_equivalence_check(net, &network, options.verify_samples, options.verify_seed)?;
        log::info!(
            "verified {} against the input on {} random vectors",
            network.name,
            options.verify_samples
        );
    }
    let report = FlowReport {
        gates_before: net.num_gates(),
        gates_after: network.num_gates(),
        depth_before: net.depth(),
        depth_after: network.depth(),
        network,
        outcomes,
        substitutions,
    };
    log::info!(
        "{}: gates {} -> {}, depth {} -> {}, {} substitutions",
        net.name,
        report.gates_before,
        report.gates_after,
        report.depth_before,
        report.depth_after,
        report.substitutions
    );
    Ok(report)
}
