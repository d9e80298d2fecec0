//! Staging object keys
//!
//! Keys look like `<base_path><strftime(pattern)>_<NN>.gz`; `NN` starts at
//! `00` and grows until a free key is found.

use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;

/// Builds candidate keys for one upload
#[derive(Debug, Clone)]
pub struct KeyTemplate {
    /// Prefix, used verbatim
    base_path: String,
    /// strftime pattern for the timestamp part
    pattern: String,
    /// Format in UTC rather than local time
    utc: bool,
}

impl KeyTemplate {
    /// Create a template, rejecting invalid strftime patterns
    pub fn new(
        base_path: impl Into<String>,
        pattern: impl Into<String>,
        utc: bool,
    ) -> Result<Self> {
        let pattern = pattern.into();
        validate_pattern(&pattern)?;
        Ok(Self {
            base_path: base_path.into(),
            pattern,
            utc,
        })
    }

    /// The timestamp part of the key for `now`
    pub fn timestamp(&self, now: DateTime<Utc>) -> Result<String> {
        let mut out = String::new();
        let written = if self.utc {
            write!(out, "{}", now.format(&self.pattern))
        } else {
            write!(out, "{}", now.with_timezone(&Local).format(&self.pattern))
        };
        written.map_err(|_| {
            Error::invalid_value("staging.timestamp_key_format", "cannot format timestamp")
        })?;
        Ok(out)
    }

    /// Full key for a timestamp part and suffix counter
    pub fn key(&self, timestamp: &str, suffix: u32) -> String {
        format!("{}{timestamp}_{suffix:02}.gz", self.base_path)
    }
}

/// Check that a strftime pattern has no invalid directives
pub fn validate_pattern(pattern: &str) -> Result<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(Error::invalid_value(
            "staging.timestamp_key_format",
            format!("invalid strftime pattern '{pattern}'"),
        ));
    }
    Ok(())
}
