use serde::{Deserialize, Serialize};

/// Upper bound on summary length, in Unicode code points
pub const MAX_SUMMARY_CHARS: usize = 400;

/// Inclusive range for each agent score component
pub const AGENT_SCORE_RANGE: std::ops::RangeInclusive<i64> = 0..=10;

/// Lower-case a backend label and fold separators so "Billing Issue",
/// "billing-issue" and "billing_issue" compare equal
fn fold_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Parse a backend label, `None` when it is outside the domain
    pub fn parse(label: &str) -> Option<Self> {
        match fold_label(label).as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Calm,
    Frustrated,
    Angry,
    Cheerful,
    Uncertain,
    #[default]
    Neutral,
}

impl Tone {
    pub fn parse(label: &str) -> Option<Self> {
        match fold_label(label).as_str() {
            "calm" => Some(Tone::Calm),
            "frustrated" => Some(Tone::Frustrated),
            "angry" => Some(Tone::Angry),
            "cheerful" => Some(Tone::Cheerful),
            "uncertain" => Some(Tone::Uncertain),
            "neutral" => Some(Tone::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BillingIssue,
    CancelSubscription,
    ProductQuestion,
    Feedback,
    SupportRequest,
    #[default]
    Other,
}

impl Intent {
    pub fn parse(label: &str) -> Option<Self> {
        match fold_label(label).as_str() {
            "billing_issue" => Some(Intent::BillingIssue),
            "cancel_subscription" => Some(Intent::CancelSubscription),
            "product_question" => Some(Intent::ProductQuestion),
            "feedback" => Some(Intent::Feedback),
            "support_request" => Some(Intent::SupportRequest),
            "other" => Some(Intent::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn parse(label: &str) -> Option<Self> {
        match fold_label(label).as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }
}

/// Optional agent quality score, each component in `AGENT_SCORE_RANGE`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentScore {
    #[serde(default)]
    pub politeness: Option<u8>,
    #[serde(default)]
    pub clarity: Option<u8>,
    #[serde(default)]
    pub resolution: Option<u8>,
}

impl AgentScore {
    pub fn is_empty(&self) -> bool {
        self.politeness.is_none() && self.clarity.is_none() && self.resolution.is_none()
    }

    /// Accept a raw integer only if it lies inside the score range
    pub fn bounded(value: i64) -> Option<u8> {
        if AGENT_SCORE_RANGE.contains(&value) {
            u8::try_from(value).ok()
        } else {
            None
        }
    }
}

/// Structured assessment of a call, also the response schema of `POST /analyze`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    pub tone: Tone,
    pub intent: Intent,
    pub urgency: Urgency,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important_phrases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_score: Option<AgentScore>,
    /// Verbatim backend output, kept for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AnalysisResult {
    /// Enforce the bounded parts of the schema that the type system cannot
    pub fn conform(mut self) -> Self {
        if self.summary.chars().count() > MAX_SUMMARY_CHARS {
            self.summary = summary_prefix(&self.summary, MAX_SUMMARY_CHARS);
        }
        if self.agent_score.as_ref().is_some_and(AgentScore::is_empty) {
            self.agent_score = None;
        }
        self
    }
}

/// First `max_chars` code points of `text`, never splitting a character
pub fn summary_prefix(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
