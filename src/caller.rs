//! Caller identity resolution.
//!
//! Submission methods are `#[track_caller]`, so the resolver receives the source
//! location of the code that called the logger. Macros bypass the resolver and
//! pass `module_path!()` directly.

use std::panic::Location;

/// Written in place of the caller when it cannot be determined.
pub const UNRESOLVED_CALLER: &str = "<unresolved>";

/// Turns a call-site location into the caller field of a record.
pub trait CallerResolver: Send + Sync {
    /// Returns the caller identity, or [`UNRESOLVED_CALLER`].
    fn resolve(&self, location: &'static Location<'static>) -> String;
}

/// Resolves to `file:line` of the call site.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationResolver;

impl CallerResolver for LocationResolver {
    fn resolve(&self, location: &'static Location<'static>) -> String {
        if location.file().is_empty() {
            return UNRESOLVED_CALLER.to_string();
        }
        // fields are space separated in the output line
        let file = location.file().replace(' ', "_");
        format!("{}:{}", file, location.line())
    }
}

/// Resolves every call site to the same name.
#[derive(Debug, Clone)]
pub struct FixedCaller(String);

impl FixedCaller {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }
}

impl CallerResolver for FixedCaller {
    fn resolve(&self, _location: &'static Location<'static>) -> String {
        if self.0.is_empty() {
            UNRESOLVED_CALLER.to_string()
        } else {
            self.0.clone()
        }
    }
}
