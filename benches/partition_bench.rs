// SPDX-License-Identifier: Apache-2.0

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mixsynth::flow;
use mixsynth::hypergraph::{ChunkPartitioner, Hypergraph};
use mixsynth::options::FlowOptions;
use mixsynth::partition::PartitionLedger;
use mixsynth::scripts::RebuildScript;
use mixsynth::test_utils::{RandomNetworkParams, random_network};

fn partition_benchmark(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = RandomNetworkParams {
        inputs: 32,
        registers: 16,
        gates: 4000,
        outputs: 32,
        maj_fraction: 0.3,
    };
    let net = random_network(0xbe7c, &params);

    c.bench_function("hypergraph_from_network", |b| {
        b.iter(|| black_box(Hypergraph::from_network(&net)))
    });

    let mut group = c.benchmark_group("ledger_and_views");
    for num_partitions in [2usize, 8, 32] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_partitions),
            &num_partitions,
            |b, &k| {
                b.iter(|| {
                    let ledger =
                        PartitionLedger::with_partitioner(&net, k, 0.5, &ChunkPartitioner).unwrap();
                    for p in 0..k {
                        black_box(ledger.create_part(&net, p).unwrap());
                    }
                })
            },
        );
    }
    group.finish();

    let mut group = c.benchmark_group("mixed_brute");
    group.sample_size(10);
    for num_partitions in [4usize, 16] {
        let options = FlowOptions {
            num_partitions,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(num_partitions),
            &options,
            |b, options| {
                b.iter(|| {
                    let mut ledger =
                        flow::partition_network(&net, options, &ChunkPartitioner).unwrap();
                    let report = flow::mixed_brute(
                        &net,
                        &mut ledger,
                        &RebuildScript::aig(),
                        &RebuildScript::mig(),
                        options,
                    )
                    .unwrap();
                    black_box(report.gates_after)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, partition_benchmark);
criterion_main!(benches);
