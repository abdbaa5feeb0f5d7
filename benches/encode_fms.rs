//! Benchmark for `FMS` score encoding.

use fms_rs::fms::{
    config::{EncodeConfig, EventOrder},
    decode::decode_str,
    encode::encode,
    model::Score,
    registry::Metadata,
};
use criterion::{Criterion, Throughput};

fn load_scores(meta: &Metadata) -> Vec<(String, Score)> {
    let dir = "tests/files";

    std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "fms"))
        .filter_map(|path| {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(String::from)?;
            let source = std::fs::read_to_string(&path).expect("Failed to load test file");
            let mut score = Score::new(meta);
            let _ = decode_str(&source, meta, &mut score);
            Some((name, score))
        })
        .collect()
}

fn bench_encode_fms(c: &mut Criterion) {
    let meta = Metadata::standard();
    let scores = load_scores(&meta);
    let mut group = c.benchmark_group("encode_fms");

    for order in [EventOrder::ByPart, EventOrder::Interleaved] {
        let config = EncodeConfig::default().event_order(order);
        for (name, score) in &scores {
            let size = encode(score, &meta, &config).len();
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_function(format!("{name}/{order:?}"), |b| {
                b.iter(|| encode(std::hint::black_box(score), &meta, &config));
            });
        }
    }

    group.finish();
}

fn main() {
    let mut criterion = Criterion::default();
    bench_encode_fms(&mut criterion);
}
