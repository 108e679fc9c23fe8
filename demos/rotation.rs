//! Segment rotation example for qlogger.

use chrono::{DateTime, Duration, Local};
use parking_lot::Mutex;
use qlogger::{qlog_info, qlog_warn, Clock, LogLevel, Logger, LoggerConfig, RotationMode};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Clock the demo moves forward by hand to cross day boundaries.
struct StepClock(Mutex<DateTime<Local>>);

impl StepClock {
    fn advance(&self, step: Duration) {
        *self.0.lock() += step;
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Local> {
        *self.0.lock()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Segment Rotation Demo ===\n");

    println!("1. Line-count rotation:");
    println!("   - Max lines per segment: 5");
    println!("   - Directory: logs/by_lines\n");
    line_count_demo()?;
    show_segments(Path::new("logs/by_lines"))?;

    println!("\n{}\n", "=".repeat(50));

    println!("2. Daily rotation:");
    println!("   - Clock advanced six hours between batches");
    println!("   - Directory: logs/daily\n");
    daily_demo()?;
    show_segments(Path::new("logs/daily"))?;

    println!("\nRotation demo completed!");
    Ok(())
}

fn line_count_demo() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoggerConfig::builder()
        .level(LogLevel::Info)
        .directory("logs/by_lines")
        .rotate_by_lines(5)
        .application_name("rotation-demo")
        .build();
    let logger = Logger::new(config)?;

    for i in 1..=12 {
        qlog_info!(logger, "line-count message #{:02}", i);
    }
    logger.debug(format_args!("filtered out, never numbered"));

    // 12 records at 5 per segment: 5, 5 and 2 lines
    logger.shutdown();
    Ok(())
}

fn daily_demo() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Arc::new(StepClock(Mutex::new(Local::now())));
    let config = LoggerConfig::builder()
        .directory("logs/daily")
        .rotation(RotationMode::Daily)
        .application_name("rotation-demo")
        .build();
    let logger = Logger::builder(config).clock(clock.clone()).build()?;

    for batch in 1..=5 {
        qlog_info!(logger, "batch {} at {}", batch, clock.now().format("%d/%m %H:%M"));
        if batch % 2 == 0 {
            qlog_warn!(logger, "checkpoint after batch {}", batch);
        }
        logger.flush()?;
        clock.advance(Duration::hours(6));
    }

    logger.shutdown();
    Ok(())
}

fn show_segments(directory: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries: Vec<_> = fs::read_dir(directory)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    println!("   Segments in {}:", directory.display());
    for path in entries {
        let lines = fs::read_to_string(&path)?.lines().count();
        if let Some(name) = path.file_name() {
            println!("   - {} ({} lines)", name.to_string_lossy(), lines);
        }
    }
    Ok(())
}
