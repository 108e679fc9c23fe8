//! Process identity and wall clock used by the writer thread.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use std::path::Path;
use sysinfo::System;

/// Identity of the running process, embedded in every segment file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Host name of the machine
    pub machine_name: String,
    /// Executable name without directory or extension
    pub application_name: String,
    /// Operating system process id
    pub process_id: u32,
}

static PROCESS_INFO: Lazy<ProcessInfo> = Lazy::new(ProcessInfo::detect);

impl ProcessInfo {
    /// Returns the identity captured the first time it was requested.
    pub fn current() -> &'static ProcessInfo {
        &PROCESS_INFO
    }

    fn detect() -> Self {
        Self {
            machine_name: machine_name(),
            application_name: application_name(),
            process_id: std::process::id(),
        }
    }

    /// Returns a copy with the application name replaced.
    pub fn with_application_name<S: Into<String>>(&self, name: S) -> Self {
        Self {
            application_name: name.into(),
            ..self.clone()
        }
    }
}

fn machine_name() -> String {
    let from_env = || {
        ["HOSTNAME", "COMPUTERNAME"]
            .iter()
            .find_map(|key| std::env::var(key).ok())
    };
    pick_machine_name(System::host_name().or_else(from_env))
}

fn pick_machine_name(candidate: Option<String>) -> String {
    candidate
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .map(|name| sanitize(&name))
        .unwrap_or_else(|| "localhost".to_string())
}

fn application_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| stem(&exe))
        .or_else(|| std::env::args().next().and_then(|arg| stem(Path::new(&arg))))
        .map(|name| sanitize(&name))
        .unwrap_or_else(|| "unknown".to_string())
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Replaces characters that cannot appear in a file name component.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_whitespace() || c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// Source of wall-clock time for timestamps and rotation boundaries.
pub trait Clock: Send + Sync {
    /// Returns the current local time.
    fn now(&self) -> DateTime<Local>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
