//! Tests exercising the logger from many threads at once.

use qlogger::{FixedCaller, LogLevel, Logger, LoggerConfig, RotationMode, WorkerState};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn parse(line: &str) -> (u64, String) {
    let mut fields = line.splitn(6, ' ');
    let _level = fields.next().unwrap();
    let sequence = fields.next().unwrap().replace(',', "").parse().unwrap();
    let _timestamp = fields.next();
    let _thread = fields.next();
    let _caller = fields.next();
    (sequence, fields.next().unwrap().to_string())
}

fn all_lines(dir: &Path) -> Vec<String> {
    let mut files: Vec<(u64, std::path::PathBuf)> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .map(|p| {
            let stem = p.file_stem().unwrap().to_str().unwrap().to_string();
            let index = stem.rsplit_once("_Seg").unwrap().1.parse().unwrap();
            (index, p)
        })
        .collect();
    files.sort();
    files
        .iter()
        .flat_map(|(_, p)| {
            fs::read_to_string(p)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn test_sequence_numbers_are_contiguous_across_threads() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = LoggerConfig::builder()
        .directory(dir.path())
        .rotate_by_lines(250)
        .build();
    let logger = Arc::new(
        Logger::builder(config)
            .caller_resolver(FixedCaller::new("worker"))
            .build()
            .expect("Failed to create logger"),
    );

    let num_threads = 8;
    let per_thread = 500;
    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..per_thread {
                    logger.info(format_args!("t{t} m{i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }
    logger.shutdown();

    let lines = all_lines(dir.path());
    assert_eq!(lines.len(), num_threads * per_thread);

    let parsed: Vec<(u64, String)> = lines.iter().map(|l| parse(l)).collect();
    for (expected, (sequence, _)) in (1u64..).zip(&parsed) {
        assert_eq!(*sequence, expected);
    }

    // each producer's own messages keep their submission order
    let mut last_seen: HashMap<String, i64> = HashMap::new();
    for (_, message) in &parsed {
        let (thread_tag, index) = message.split_once(" m").unwrap();
        let index: i64 = index.parse().unwrap();
        let previous = last_seen.insert(thread_tag.to_string(), index).unwrap_or(-1);
        assert_eq!(index, previous + 1, "out of order for {thread_tag}");
    }
}

#[test]
fn test_filter_changes_while_producing() {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::builder()
        .directory(dir.path())
        .rotation(RotationMode::Never)
        .build();
    let logger = Arc::new(Logger::new(config).unwrap());

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..2_000 {
                logger.debug(format_args!("debug {i}"));
                logger.error(format_args!("error {i}"));
            }
        })
    };
    let toggler = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..200 {
                let level = if i % 2 == 0 { LogLevel::Error } else { LogLevel::Debug };
                logger.set_minimum_level(level);
            }
        })
    };
    producer.join().unwrap();
    toggler.join().unwrap();
    logger.shutdown();

    let stats = logger.stats();
    let lines = all_lines(dir.path());
    assert_eq!(lines.len() as u64, stats.total_messages);
    assert_eq!(stats.total_messages + stats.filtered_messages, 4_000);
    assert_eq!(stats.messages_by_level.get(&LogLevel::Error), Some(&2_000));

    let sequences: Vec<u64> = lines.iter().map(|l| parse(l).0).collect();
    assert_eq!(sequences, (1..=stats.total_messages).collect::<Vec<_>>());
}

#[test]
fn test_shutdown_from_another_thread_while_producing() {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::builder()
        .directory(dir.path())
        .rotation(RotationMode::Never)
        .build();
    let logger = Arc::new(Logger::new(config).unwrap());

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for i in 0..5_000 {
                logger.warn(format_args!("w {i}"));
            }
        })
    };
    thread::sleep(std::time::Duration::from_millis(1));
    logger.shutdown();
    producer.join().unwrap();

    assert_eq!(logger.worker_state(), WorkerState::Terminated);

    // everything accepted before shutdown is on disk, nothing after it
    let stats = logger.stats();
    assert_eq!(stats.total_messages + stats.rejected_messages, 5_000);
    let lines = all_lines(dir.path());
    assert_eq!(lines.len() as u64, stats.total_messages);
    assert_eq!(logger.next_sequence(), stats.total_messages + 1);
}

#[test]
fn test_independent_loggers_do_not_share_state() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    let a = Logger::new(LoggerConfig::builder().directory(dir_a.path()).build()).unwrap();
    let b = Logger::new(LoggerConfig::builder().directory(dir_b.path()).build()).unwrap();

    a.info(format_args!("a1"));
    a.info(format_args!("a2"));
    b.info(format_args!("b1"));
    a.shutdown();
    b.shutdown();

    assert_eq!(a.next_sequence(), 3);
    assert_eq!(b.next_sequence(), 2);
    assert_eq!(all_lines(dir_a.path()).len(), 2);
    let b_lines = all_lines(dir_b.path());
    assert_eq!(b_lines.len(), 1);
    assert_eq!(parse(&b_lines[0]), (1, "b1".to_string()));
}

#[test]
fn test_loggers_sharing_a_directory_never_share_a_segment() {
    let dir = tempdir().unwrap();
    let a = Logger::new(LoggerConfig::builder().directory(dir.path()).build()).unwrap();
    let b = Logger::new(LoggerConfig::builder().directory(dir.path()).build()).unwrap();

    a.info(format_args!("from a"));
    b.info(format_args!("from b"));
    a.shutdown();
    b.shutdown();

    let files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    assert_eq!(files.len(), 2);

    let mut messages: Vec<String> = files
        .iter()
        .map(|path| {
            let lines: Vec<String> = fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect();
            assert_eq!(lines.len(), 1, "{} holds more than one record", path.display());
            let (sequence, message) = parse(&lines[0]);
            assert_eq!(sequence, 1);
            message
        })
        .collect();
    messages.sort();
    assert_eq!(messages, vec!["from a", "from b"]);
}
