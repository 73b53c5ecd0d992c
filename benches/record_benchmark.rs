/*!
 * Record Parsing Benchmarks
 * Cost of parsing stat records and scanning a synthetic proc tree
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use procman::procfs::{ProcTable, ProcessRecord, ThreadRecord};
use std::fs;
use tempfile::TempDir;

const SHORT_RECORD: &str = "1 (init) S 0\n";
const FULL_RECORD: &str = "1 (systemd) S 0 1 1 0 -1 4194560 52310 3521779 93 1453 116 262 7613 \
                           3462 20 0 1 0 28 172826624 3291 18446744073709551615 1 1 0 0 0 0 \
                           671173123 4096 1260 0 0 0 17 3 0 0 0 0 0 0 0 0 0 0 0 0 0\n";

fn bench_parse_process_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_process_record");

    for (label, raw) in [("short", SHORT_RECORD), ("full", FULL_RECORD)] {
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), raw, |b, raw| {
            b.iter(|| ProcessRecord::parse(black_box(raw)))
        });
    }

    group.finish();
}

fn bench_parse_thread_record(c: &mut Criterion) {
    c.bench_function("parse_thread_record", |b| {
        b.iter(|| ThreadRecord::parse(black_box(FULL_RECORD), black_box(1)))
    });
}

fn bench_parse_malformed(c: &mut Criterion) {
    c.bench_function("parse_malformed_record", |b| {
        b.iter(|| ProcessRecord::parse(black_box("77 (cut-short)\n")))
    });
}

fn bench_scan_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_tree");

    for entries in [16usize, 256, 1024] {
        let root = TempDir::new().expect("tempdir");
        for pid in 1..=entries {
            let dir = root.path().join(pid.to_string());
            fs::create_dir(&dir).expect("entry dir");
            fs::write(dir.join("stat"), format!("{} (worker-{}) S 1 1 1 0\n", pid, pid))
                .expect("stat file");
        }
        let table = ProcTable::new(root.path());

        group.throughput(Throughput::Elements(entries as u64));
        group.bench_with_input(BenchmarkId::from_parameter(entries), &table, |b, table| {
            b.iter(|| table.enumerate_processes())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_process_record,
    bench_parse_thread_record,
    bench_parse_malformed,
    bench_scan_tree,
);

criterion_main!(benches);
