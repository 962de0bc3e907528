//! Intent matcher.
//!
//! Scores raw user input against every skill in a [`SkillCatalog`] and
//! returns the candidates whose confidence clears the configured minimum,
//! best first.  Each skill is scored three ways and the single strongest
//! signal wins:
//!
//! | Source | Scorer | Ceiling |
//! |--------|--------|---------|
//! | Voice triggers | [`similarity::match_trigger`] | 1.0 |
//! | Example prompts | [`similarity::example_score`] | 0.95 |
//! | Name, category and description keywords | weighted word hits | 0.8 |
//!
//! The matcher never mutates the catalog.  Its two settings can be changed
//! at runtime through `&self` and affect subsequent calls only.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use skillgate_skills::{SkillCatalog, SkillDefinition};

use crate::error::{IntentError, Result};
use crate::extract::ParameterExtractor;
use crate::keywords::CategoryKeywords;
use crate::similarity::{self, TriggerMatchKind};

const NAME_WORD_WEIGHT: f64 = 0.3;
const NAME_WORD_MIN_LEN: usize = 2;
const CATEGORY_HIT_WEIGHT: f64 = 0.2;
const DESCRIPTION_WORD_WEIGHT: f64 = 0.15;
const DESCRIPTION_WORD_MIN_LEN: usize = 4;
const KEYWORD_SCORE_CAP: f64 = 0.8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Matcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Results below this confidence are dropped.
    pub minimum_confidence: f64,
    /// Whether token-overlap matching against triggers is attempted.
    pub enable_fuzzy_matching: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            minimum_confidence: 0.6,
            enable_fuzzy_matching: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Which signal produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    VoiceTrigger,
    ExamplePrompt,
    Keyword,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::VoiceTrigger => "voice_trigger",
            Self::ExamplePrompt => "example_prompt",
            Self::Keyword => "keyword",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate skill for an input.
#[derive(Debug, Clone)]
pub struct IntentMatchResult {
    pub skill: Arc<SkillDefinition>,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    /// The trigger, example prompt, or skill name that matched.
    pub matched_trigger: String,
    pub match_type: MatchType,
    /// Values pulled from the raw input (`time`, `date`, `location`, `quantity`).
    pub extracted_params: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// IntentMatcher
// ---------------------------------------------------------------------------

/// Ranks catalog skills against free-text input.
pub struct IntentMatcher {
    catalog: Arc<dyn SkillCatalog>,
    /// `f64` bit pattern.
    minimum_confidence: AtomicU64,
    fuzzy_matching: AtomicBool,
    keywords: CategoryKeywords,
    extractor: ParameterExtractor,
}

impl IntentMatcher {
    pub fn new(catalog: Arc<dyn SkillCatalog>, config: MatcherConfig) -> Result<Self> {
        check_confidence(config.minimum_confidence)?;

        Ok(Self {
            catalog,
            minimum_confidence: AtomicU64::new(config.minimum_confidence.to_bits()),
            fuzzy_matching: AtomicBool::new(config.enable_fuzzy_matching),
            keywords: CategoryKeywords::new()?,
            extractor: ParameterExtractor::new()?,
        })
    }

    /// Current settings.
    pub fn config(&self) -> MatcherConfig {
        MatcherConfig {
            minimum_confidence: self.minimum_confidence(),
            enable_fuzzy_matching: self.fuzzy_matching.load(Ordering::Relaxed),
        }
    }

    /// Replace both settings at once.
    pub fn configure(&self, config: MatcherConfig) -> Result<()> {
        self.set_minimum_confidence(config.minimum_confidence)?;
        self.set_fuzzy_matching(config.enable_fuzzy_matching);
        Ok(())
    }

    pub fn minimum_confidence(&self) -> f64 {
        f64::from_bits(self.minimum_confidence.load(Ordering::Relaxed))
    }

    pub fn set_minimum_confidence(&self, value: f64) -> Result<()> {
        check_confidence(value)?;
        self.minimum_confidence
            .store(value.to_bits(), Ordering::Relaxed);
        tracing::debug!(minimum_confidence = value, "matcher threshold updated");
        Ok(())
    }

    pub fn set_fuzzy_matching(&self, enabled: bool) {
        self.fuzzy_matching.store(enabled, Ordering::Relaxed);
        tracing::debug!(enabled, "fuzzy matching toggled");
    }

    /// Every skill matching `input` at or above the minimum confidence,
    /// sorted by descending confidence.  Ties keep catalog order.
    pub fn match_input(&self, input: &str) -> Vec<IntentMatchResult> {
        let normalized = similarity::normalize(input);
        let minimum = self.minimum_confidence();
        let fuzzy = self.fuzzy_matching.load(Ordering::Relaxed);

        let mut results: Vec<IntentMatchResult> = self
            .catalog
            .list_all()
            .into_iter()
            .filter_map(|skill| self.score_skill(skill, &normalized, input, fuzzy))
            .filter(|m| m.confidence >= minimum)
            .collect();

        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        tracing::debug!(
            candidates = results.len(),
            best = results.first().map(|m| m.skill.id.as_str()),
            "intent matched"
        );
        results
    }

    /// The highest-confidence match, if any.
    pub fn best_match(&self, input: &str) -> Option<IntentMatchResult> {
        self.match_input(input).into_iter().next()
    }

    /// Score `input` against one skill.  Unknown ids yield `None`.
    ///
    /// No minimum-confidence filter is applied.
    pub fn matches(&self, input: &str, skill_id: &str) -> Option<IntentMatchResult> {
        let skill = self.catalog.by_id(skill_id)?;
        let normalized = similarity::normalize(input);
        let fuzzy = self.fuzzy_matching.load(Ordering::Relaxed);
        self.score_skill(skill, &normalized, input, fuzzy)
    }

    fn score_skill(
        &self,
        skill: Arc<SkillDefinition>,
        normalized: &str,
        original: &str,
        fuzzy: bool,
    ) -> Option<IntentMatchResult> {
        let mut best: Option<(f64, &str, MatchType)> = None;
        let mut highest = 0.0;

        for trigger in &skill.voice_triggers {
            let Some(hit) = similarity::match_trigger(trigger, normalized, fuzzy) else {
                continue;
            };
            if hit.score > highest {
                highest = hit.score;
                let match_type = match hit.kind {
                    TriggerMatchKind::Exact => MatchType::Exact,
                    TriggerMatchKind::Fuzzy => MatchType::Fuzzy,
                    _ => MatchType::VoiceTrigger,
                };
                best = Some((hit.score, trigger.as_str(), match_type));
            }
        }

        for example in &skill.example_prompts {
            let score = similarity::example_score(example, normalized);
            if score > highest {
                highest = score;
                best = Some((score, example.as_str(), MatchType::ExamplePrompt));
            }
        }

        let keyword = self.keyword_score(&skill, normalized);
        if keyword > highest {
            best = Some((keyword, skill.name.as_str(), MatchType::Keyword));
        }

        let (score, trigger, match_type) = best?;
        let matched_trigger = trigger.to_owned();
        let extracted_params = if match_type == MatchType::Keyword {
            BTreeMap::new()
        } else {
            self.extractor.extract(original)
        };

        tracing::trace!(
            skill_id = %skill.id,
            confidence = score,
            match_type = %match_type,
            "skill scored"
        );

        Some(IntentMatchResult {
            skill,
            confidence: similarity::clamp_confidence(score),
            matched_trigger,
            match_type,
            extracted_params,
        })
    }

    fn keyword_score(&self, skill: &SkillDefinition, normalized: &str) -> f64 {
        if normalized.is_empty() {
            return 0.0;
        }
        let input_words: HashSet<&str> = similarity::tokens(normalized);

        let name = similarity::normalize(&skill.name);
        let name_hits = name
            .split_whitespace()
            .filter(|w| w.chars().count() > NAME_WORD_MIN_LEN && input_words.contains(w))
            .count();

        let category_hits = self.keywords.hits(&skill.category, normalized);

        let description = similarity::normalize(&skill.short_description);
        let description_hits = description
            .split_whitespace()
            .filter(|w| w.chars().count() > DESCRIPTION_WORD_MIN_LEN && input_words.contains(w))
            .count();

        let score = name_hits as f64 * NAME_WORD_WEIGHT
            + category_hits as f64 * CATEGORY_HIT_WEIGHT
            + description_hits as f64 * DESCRIPTION_WORD_WEIGHT;

        score.min(KEYWORD_SCORE_CAP)
    }
}

impl std::fmt::Debug for IntentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentMatcher")
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}

fn check_confidence(value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(IntentError::InvalidConfidence(value))
    }
}
