//! Category keyword table.
//!
//! Each known skill category maps to a handful of keywords.  Counting how
//! many of them appear in an input is one ingredient of the keyword score.
//! All keywords for a category are compiled into a single Aho-Corasick
//! automaton so one pass over the input finds every hit.

use std::collections::{HashMap, HashSet};

use aho_corasick::AhoCorasick;

use crate::error::Result;

/// Category names (lowercase) and the keywords they contribute.
const CATEGORY_TABLE: &[(&[&str], &[&str])] = &[
    (
        &["meal planning", "food"],
        &[
            "meal",
            "recipe",
            "cook",
            "dinner",
            "lunch",
            "breakfast",
            "food",
            "eat",
            "grocery",
        ],
    ),
    (
        &["calendar", "scheduling"],
        &[
            "calendar",
            "schedule",
            "event",
            "appointment",
            "meeting",
            "remind",
        ],
    ),
    (
        &["healthcare", "health"],
        &[
            "health",
            "doctor",
            "appointment",
            "medical",
            "symptom",
            "medicine",
        ],
    ),
    (
        &["weather"],
        &[
            "weather",
            "forecast",
            "temperature",
            "rain",
            "sunny",
            "cold",
            "hot",
        ],
    ),
    (
        &["home services", "services"],
        &[
            "hire", "help", "service", "repair", "clean", "handyman", "plumber",
        ],
    ),
];

/// Compiled keyword automata, one per keyword group.
#[derive(Debug)]
pub struct CategoryKeywords {
    groups: Vec<AhoCorasick>,
    by_category: HashMap<&'static str, usize>,
}

impl CategoryKeywords {
    /// Compile the built-in category table.
    pub fn new() -> Result<Self> {
        let mut groups = Vec::with_capacity(CATEGORY_TABLE.len());
        let mut by_category = HashMap::new();

        for (index, (categories, keywords)) in CATEGORY_TABLE.iter().enumerate() {
            groups.push(AhoCorasick::new(keywords.iter())?);
            for category in categories.iter() {
                by_category.insert(*category, index);
            }
        }

        tracing::debug!(categories = by_category.len(), "category keywords compiled");
        Ok(Self {
            groups,
            by_category,
        })
    }

    /// Number of distinct category keywords that occur as substrings of
    /// `input`.  Unknown categories have no keywords.
    pub fn hits(&self, category: &str, input: &str) -> usize {
        let Some(&index) = self.by_category.get(category.to_lowercase().as_str()) else {
            return 0;
        };
        let automaton = &self.groups[index];

        automaton
            .find_overlapping_iter(input)
            .map(|m| m.pattern())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Keywords for a category, for display.
    pub fn keywords(category: &str) -> &'static [&'static str] {
        let category = category.to_lowercase();
        CATEGORY_TABLE
            .iter()
            .find(|(names, _)| names.iter().any(|name| *name == category))
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}
