//! Best-effort parameter extraction from raw user input.
//!
//! After a trigger or example matches, the original (un-normalized) input is
//! scanned for a time, a date, a location and a bare number.  Each value is
//! stored under a fixed key only when found; nothing here ever fails.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{IntentError, Result};

pub const TIME_KEY: &str = "time";
pub const DATE_KEY: &str = "date";
pub const LOCATION_KEY: &str = "location";
pub const QUANTITY_KEY: &str = "quantity";

const TIME_PATTERNS: &[&str] = &[
    r"(?i)\d{1,2}:\d{2}\s*(?:am|pm)?",
    r"(?i)\d{1,2}\s*(?:am|pm)",
    r"(?i)morning|afternoon|evening|night|noon|midnight",
];

// Applied to the lowercased input.
const DATE_PATTERNS: &[&str] = &[
    r"today|tomorrow|yesterday",
    r"monday|tuesday|wednesday|thursday|friday|saturday|sunday",
    r"\d{1,2}/\d{1,2}(?:/\d{2,4})?",
    r"next week|this week|next month",
];

const LOCATION_PATTERN: &str =
    r"\b(?:in|at|near|around)\s+([A-Z][a-zA-Z\s]+?)(?:\s+(?:at|on|for|tomorrow|today)|$)";

const QUANTITY_PATTERN: &str = r"\b\d+\b";

/// Compiled extraction patterns.
#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    time: Vec<Regex>,
    date: Vec<Regex>,
    location: Regex,
    quantity: Regex,
}

impl ParameterExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            time: compile_all(TIME_PATTERNS)?,
            date: compile_all(DATE_PATTERNS)?,
            location: compile(LOCATION_PATTERN)?,
            quantity: compile(QUANTITY_PATTERN)?,
        })
    }

    /// Extract every recognizable parameter from `input`.
    pub fn extract(&self, input: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();

        if let Some(time) = self.time(input) {
            params.insert(TIME_KEY.to_owned(), time);
        }
        if let Some(date) = self.date(input) {
            params.insert(DATE_KEY.to_owned(), date);
        }
        if let Some(location) = self.location(input) {
            params.insert(LOCATION_KEY.to_owned(), location);
        }
        if let Some(quantity) = self.quantity(input) {
            params.insert(QUANTITY_KEY.to_owned(), quantity);
        }

        params
    }

    /// First time phrase, in the order the patterns are listed.
    pub fn time(&self, input: &str) -> Option<String> {
        first_match(&self.time, input)
    }

    /// First date phrase, lowercased.
    pub fn date(&self, input: &str) -> Option<String> {
        first_match(&self.date, &input.to_lowercase())
    }

    /// A capitalized place name following a preposition.
    pub fn location(&self, input: &str) -> Option<String> {
        self.location
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|s| !s.is_empty())
    }

    /// The first standalone integer.
    pub fn quantity(&self, input: &str) -> Option<String> {
        self.quantity.find(input).map(|m| m.as_str().to_owned())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| IntentError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile(p)).collect()
}

fn first_match(patterns: &[Regex], input: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.find(input))
        .map(|m| m.as_str().to_owned())
}
