pub mod keywords;
pub mod rules;

pub use keywords::*;
pub use rules::*;

use crate::models::{summary_prefix, AnalysisResult, Intent, Sentiment, Urgency, MAX_SUMMARY_CHARS};

/// Keyword tables for the rule-based analysis
#[derive(Debug, Clone)]
pub struct HeuristicsConfig {
    /// Intent rules, first match wins
    pub intent_rules: Vec<KeywordRule<Intent>>,
    /// Sentiment rules, first match wins
    pub sentiment_rules: Vec<KeywordRule<Sentiment>>,
    /// Urgency rules, first match wins
    pub urgency_rules: Vec<KeywordRule<Urgency>>,
    /// Summary length in code points
    pub summary_max_chars: usize,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            intent_rules: default_intent_rules(),
            sentiment_rules: default_sentiment_rules(),
            urgency_rules: default_urgency_rules(),
            summary_max_chars: MAX_SUMMARY_CHARS,
        }
    }
}

/// Derive an analysis from transcript text alone
///
/// Each field is decided independently on the lower-cased text:
/// 1. Intent, sentiment and urgency from their keyword tables
/// 2. Tone from sentiment
/// 3. Summary as a prefix of the original text
///
/// Total and deterministic: any input, including the empty string, yields a
/// schema-valid result, and equal inputs yield equal results.
pub fn apply_heuristics(text: &str, config: &HeuristicsConfig) -> AnalysisResult {
    let text_lower = text.to_lowercase();

    let intent = first_match(&text_lower, &config.intent_rules, Intent::Other);
    let sentiment = first_match(&text_lower, &config.sentiment_rules, Sentiment::Neutral);
    let urgency = first_match(&text_lower, &config.urgency_rules, Urgency::Low);

    AnalysisResult {
        sentiment,
        tone: tone_for_sentiment(sentiment),
        intent,
        urgency,
        summary: summary_prefix(text, config.summary_max_chars.min(MAX_SUMMARY_CHARS)),
        important_phrases: Some(Vec::new()),
        agent_score: None,
        raw_response: None,
    }
}
