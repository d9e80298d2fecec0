//! Load failure classification

use super::types::{LoadErrorClass, LoadFailure};
use regex::Regex;
use std::sync::LazyLock;

/// Message the warehouse reports when COPY rejects the file's data
static DATA_REJECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:ERROR:\s*)?Load into table '[^']+' failed")
        .expect("load failure regex is valid")
});

/// Decide whether a failed COPY is soft (bad data) or fatal
///
/// Redshift reports rejected data under the generic `XX000` SQLSTATE, so
/// only the message tells the cases apart. Nothing but this one message is
/// treated as soft.
pub fn classify_load_error(failure: &LoadFailure) -> LoadErrorClass {
    if DATA_REJECTED.is_match(&failure.message) {
        LoadErrorClass::Soft
    } else {
        LoadErrorClass::Fatal
    }
}
