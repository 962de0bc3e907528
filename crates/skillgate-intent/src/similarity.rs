//! Similarity scoring between normalized strings.
//!
//! Everything here is a pure function.  The thresholds and scaling factors
//! are part of the matching contract: callers compare confidences against
//! fixed cut-offs, so changing a constant changes which skills fast-path.

use std::collections::HashSet;

/// Score for a trigger identical to the input.
pub const EXACT_SCORE: f64 = 1.0;
/// Score when the input contains the whole trigger.
pub const CONTAINS_TRIGGER_SCORE: f64 = 0.9;
/// Score when the trigger contains the (non-trivial) input.
pub const CONTAINED_IN_TRIGGER_SCORE: f64 = 0.7;
/// Inputs this short never match by being contained in a trigger.
pub const MIN_CONTAINED_INPUT_LEN: usize = 3;
/// Jaccard similarity must exceed this for a fuzzy trigger match.
pub const FUZZY_THRESHOLD: f64 = 0.7;
/// Fuzzy trigger matches are scaled down by this factor.
pub const FUZZY_SCALE: f64 = 0.8;
/// Jaccard similarity must exceed this for a direct example match.
pub const EXAMPLE_THRESHOLD: f64 = 0.8;
/// Direct example matches are scaled by this factor.
pub const EXAMPLE_SCALE: f64 = 0.95;
/// Words longer than this count as significant in example prompts.
pub const SIGNIFICANT_WORD_LEN: usize = 3;
/// Significant-word overlap must exceed this ratio.
pub const OVERLAP_THRESHOLD: f64 = 0.5;
/// Significant-word overlaps are scaled by this factor.
pub const OVERLAP_SCALE: f64 = 0.75;

/// How a trigger matched the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMatchKind {
    /// Normalized trigger and input are identical.
    Exact,
    /// The input contains the whole trigger.
    ContainsTrigger,
    /// The trigger contains the input.
    ContainedInTrigger,
    /// Token overlap only.
    Fuzzy,
}

/// A scored trigger match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerMatch {
    pub score: f64,
    pub kind: TriggerMatchKind,
}

/// Lowercase, replace every non-word character with a space, and collapse
/// runs of whitespace into single spaces with no leading or trailing space.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if is_word_char(c) { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Space-separated tokens of an already normalized string.
pub fn tokens(normalized: &str) -> HashSet<&str> {
    normalized.split_whitespace().collect()
}

/// Token-set Jaccard similarity of two normalized strings.
///
/// Returns `0.0` when both are empty.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);

    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}

/// Match a raw trigger phrase against a normalized input.
///
/// Returns `None` when the trigger does not match at all.
pub fn match_trigger(trigger: &str, input: &str, fuzzy: bool) -> Option<TriggerMatch> {
    let trigger = normalize(trigger);
    if trigger.is_empty() || input.is_empty() {
        return None;
    }

    if input == trigger {
        return Some(TriggerMatch {
            score: EXACT_SCORE,
            kind: TriggerMatchKind::Exact,
        });
    }

    if input.contains(trigger.as_str()) {
        return Some(TriggerMatch {
            score: CONTAINS_TRIGGER_SCORE,
            kind: TriggerMatchKind::ContainsTrigger,
        });
    }

    if trigger.contains(input) && input.chars().count() > MIN_CONTAINED_INPUT_LEN {
        return Some(TriggerMatch {
            score: CONTAINED_IN_TRIGGER_SCORE,
            kind: TriggerMatchKind::ContainedInTrigger,
        });
    }

    if fuzzy {
        let similarity = jaccard(input, &trigger);
        if similarity > FUZZY_THRESHOLD {
            return Some(TriggerMatch {
                score: clamp_confidence(similarity * FUZZY_SCALE),
                kind: TriggerMatchKind::Fuzzy,
            });
        }
    }

    None
}

/// Confidence that `input` (normalized) asks for `trigger` (raw).
pub fn trigger_score(trigger: &str, input: &str, fuzzy: bool) -> f64 {
    match_trigger(trigger, input, fuzzy).map_or(0.0, |m| m.score)
}

/// Confidence that `input` (normalized) resembles the raw example prompt.
pub fn example_score(example: &str, input: &str) -> f64 {
    let example = normalize(example);

    let similarity = jaccard(input, &example);
    if similarity > EXAMPLE_THRESHOLD {
        return clamp_confidence(similarity * EXAMPLE_SCALE);
    }

    let example_words = tokens(&example);
    let input_words = tokens(input);
    let significant: HashSet<&str> = example_words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > SIGNIFICANT_WORD_LEN)
        .collect();

    if significant.is_empty() {
        return 0.0;
    }

    let common = significant.intersection(&input_words).count();
    let overlap = common as f64 / significant.len() as f64;
    if overlap > OVERLAP_THRESHOLD {
        clamp_confidence(overlap * OVERLAP_SCALE)
    } else {
        0.0
    }
}

/// Clamp a score into `[0, 1]`, mapping NaN to zero.
pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  Plan   Dinner! "), "plan dinner");
        assert_eq!(normalize("What's for dinner?"), "what s for dinner");
        assert_eq!(normalize("snake_case stays"), "snake_case stays");
        assert_eq!(normalize("tabs\tand\nnewlines"), "tabs and newlines");
    }

    #[test]
    fn normalize_empty_and_symbols() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ???"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "Plan Dinner!",
            "  multiple   spaces\there ",
            "Ünïcödé Wörds, mixed-CASE",
            "a--b__c..d",
            "",
            "123 Main St. @ 7:30pm",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn jaccard_basics() {
        assert!(approx(jaccard("", ""), 0.0));
        assert!(approx(jaccard("a b", ""), 0.0));
        assert!(approx(jaccard("a b", "a b"), 1.0));
        assert!(approx(jaccard("a b c", "a b d"), 0.5));
    }

    #[test]
    fn trigger_exact_match() {
        assert!(approx(trigger_score("plan dinner", &normalize("Plan Dinner!"), true), 1.0));
        let m = match_trigger("plan dinner", "plan dinner", false).unwrap();
        assert_eq!(m.kind, TriggerMatchKind::Exact);
    }

    #[test]
    fn trigger_contained_in_input() {
        let score = trigger_score("plan dinner", "please plan dinner for tonight", false);
        assert!(approx(score, 0.9));
    }

    #[test]
    fn input_contained_in_trigger_requires_length() {
        assert!(approx(trigger_score("plan dinner tonight", "dinner", false), 0.7));
        assert!(approx(trigger_score("plan dinner tonight", "din", false), 0.0));
        // Exactly three characters is still too short.
        assert!(approx(trigger_score("plan the dinner", "the", false), 0.0));
    }

    #[test]
    fn fuzzy_requires_strong_overlap() {
        // 4 shared of 6 distinct tokens: 0.667 is below the fuzzy threshold.
        let input = "order my weekly groceries online";
        let trigger = "order my weekly groceries now";
        assert!(approx(trigger_score(trigger, input, true), 0.0));

        // 4 shared of 5 distinct tokens: 0.8 scaled to 0.64.
        let input = "weekly groceries order my";
        let trigger = "order my weekly groceries now";
        assert!(approx(trigger_score(trigger, input, true), 0.8 * 0.8));

        let input = "order weekly groceries online please now";
        let trigger = "order weekly groceries online please";
        // Substring containment wins before fuzzy.
        assert!(approx(trigger_score(trigger, input, true), 0.9));
    }

    #[test]
    fn fuzzy_floor_when_disabled() {
        // Same token set in a different order: no substring relation.
        let trigger = "dinner plan tonight family";
        let input = "family tonight plan dinner";
        assert!(approx(jaccard(input, &normalize(trigger)), 1.0));
        assert!(approx(trigger_score(trigger, input, true), 0.8));
        assert!(approx(trigger_score(trigger, input, false), 0.0));
        assert_eq!(
            match_trigger(trigger, input, true).unwrap().kind,
            TriggerMatchKind::Fuzzy
        );
    }

    #[test]
    fn empty_input_never_matches_a_trigger() {
        assert!(approx(trigger_score("plan dinner", "", true), 0.0));
        assert!(approx(trigger_score("", "", true), 0.0));
    }

    #[test]
    fn example_direct_similarity() {
        let score = example_score("What should we have for dinner?", "what should we have for dinner");
        assert!(approx(score, 0.95));
    }

    #[test]
    fn example_significant_word_overlap() {
        // Significant words: "book", "table", "restaurant" -> 2 of 3 present.
        let score = example_score("Book a table at the restaurant", "book me a table please");
        assert!(approx(score, (2.0 / 3.0) * 0.75));
    }

    #[test]
    fn example_overlap_at_half_is_rejected() {
        // Significant words: "book", "table" -> 1 of 2 present, ratio 0.5 is not > 0.5.
        let score = example_score("book a table", "book a flight");
        assert!(approx(score, 0.0));
    }

    #[test]
    fn example_empty_input_is_zero() {
        assert!(approx(example_score("Plan a dinner party", ""), 0.0));
    }

    #[test]
    fn clamp_bounds() {
        assert!(approx(clamp_confidence(1.7), 1.0));
        assert!(approx(clamp_confidence(-0.2), 0.0));
        assert!(approx(clamp_confidence(f64::NAN), 0.0));
    }
}
