// SPDX-License-Identifier: AGPL-3.0

//! Logging and user-facing diagnostics
//!
//! Two layers: `tracing` events for internal progress (installed with
//! [`init_tracing`]), and colored, de-duplicated warnings printed for the
//! person running the mapper.

use colored::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Warning categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParsingError,
    ContractNameIsFileName,
    UntestedCompilerVersion,
    SourceEncoding,
    MissingSourceText,
    ReconstructedSource,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::ParsingError => "parsing-error",
            ErrorCode::ContractNameIsFileName => "contract-name-is-file-name",
            ErrorCode::UntestedCompilerVersion => "untested-compiler-version",
            ErrorCode::SourceEncoding => "source-encoding",
            ErrorCode::MissingSourceText => "missing-source-text",
            ErrorCode::ReconstructedSource => "reconstructed-source",
        }
    }
}

static UNIQUE_MESSAGES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Returns true if this message was not recorded before, recording it.
fn first_occurrence(message: &str) -> bool {
    match UNIQUE_MESSAGES.lock() {
        Ok(mut messages) => messages.insert(message.to_string()),
        // a poisoned set only loses de-duplication
        Err(_) => true,
    }
}

/// Whether `message` was already printed once.
pub fn is_logged(message: &str) -> bool {
    UNIQUE_MESSAGES
        .lock()
        .map(|messages| messages.contains(message))
        .unwrap_or(false)
}

fn should_print(text: &str, allow_duplicate: bool) -> bool {
    allow_duplicate || first_occurrence(text)
}

/// Log a debug message
pub fn debug(text: &str, allow_duplicate: bool) {
    if should_print(text, allow_duplicate) {
        eprintln!("{}", text.dimmed());
    }
}

/// Log an info message
pub fn info(text: &str, allow_duplicate: bool) {
    if should_print(text, allow_duplicate) {
        eprintln!("{}", text);
    }
}

/// Log a warning message
pub fn warn(text: &str, allow_duplicate: bool) {
    if should_print(text, allow_duplicate) {
        eprintln!("{}", text.yellow());
    }
}

/// Log a warning tagged with its category
pub fn warn_code(error_code: ErrorCode, msg: &str, allow_duplicate: bool) {
    let full_msg = format!("WARNING: {} [{}]", msg, error_code.code());
    warn(&full_msg, allow_duplicate);
}

/// Log a unique warning (alias for warn with allow_duplicate=false)
pub fn warn_unique(text: &str) {
    warn(text, false);
}

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity count. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Enable or disable ANSI colors for the diagnostics printed by this crate.
pub fn set_color(enabled: bool) {
    colored::control::set_override(enabled);
}
