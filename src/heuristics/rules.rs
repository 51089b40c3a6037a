use crate::models::{Intent, Sentiment, Tone, Urgency};

use super::KeywordRule;

/// Intent rules in precedence order
pub fn default_intent_rules() -> Vec<KeywordRule<Intent>> {
    vec![
        KeywordRule::new(Intent::CancelSubscription, &["cancel"]),
        KeywordRule::new(Intent::BillingIssue, &["bill", "charge"]),
    ]
}

/// Sentiment rules in precedence order; negative cues beat positive ones
pub fn default_sentiment_rules() -> Vec<KeywordRule<Sentiment>> {
    vec![
        KeywordRule::new(Sentiment::Negative, &["not happy", "angry", "frustrat"]),
        KeywordRule::new(Sentiment::Positive, &["thank", "great", "love"]),
    ]
}

pub fn default_urgency_rules() -> Vec<KeywordRule<Urgency>> {
    vec![KeywordRule::new(
        Urgency::High,
        &["now", "immediately", "asap"],
    )]
}

/// Tone follows sentiment
pub fn tone_for_sentiment(sentiment: Sentiment) -> Tone {
    match sentiment {
        Sentiment::Negative => Tone::Frustrated,
        Sentiment::Positive => Tone::Cheerful,
        Sentiment::Neutral => Tone::Neutral,
    }
}
