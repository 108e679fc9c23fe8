//! Producer-side cost of submitting messages.

use criterion::{criterion_group, criterion_main, Criterion};
use qlogger::{FixedCaller, LogLevel, Logger, LoggerConfig, RotationMode};
use std::hint::black_box;

fn bench_submit(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = LoggerConfig::builder()
        .directory(dir.path())
        .rotation(RotationMode::ByLineCount)
        .max_lines_per_file(100_000)
        .level(LogLevel::Info)
        .build();
    let logger = Logger::builder(config)
        .caller_resolver(FixedCaller::new("bench"))
        .build()
        .expect("Failed to create logger");

    c.bench_function("submit_accepted", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            logger.info(format_args!("benchmark message {}", black_box(i)));
        })
    });

    c.bench_function("submit_filtered", |b| {
        b.iter(|| logger.debug(format_args!("filtered {}", black_box(1))))
    });

    logger.shutdown();
}

criterion_group!(benches, bench_submit);
criterion_main!(benches);
