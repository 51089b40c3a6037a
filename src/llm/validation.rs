use serde_json::{Map, Value};

use crate::models::{
    summary_prefix, AgentScore, AnalysisResult, Intent, Sentiment, Tone, Transcript, Urgency,
    MAX_SUMMARY_CHARS,
};

/// Most phrases kept from a backend reply
pub const MAX_IMPORTANT_PHRASES: usize = 20;

/// Outcome of reading a backend reply into the response schema
#[derive(Debug, Clone)]
pub struct ResponseValidation {
    /// Schema-valid result, defaults filled in where the reply fell short
    pub result: AnalysisResult,
    /// Everything that had to be defaulted or dropped
    pub issues: Vec<String>,
}

impl ResponseValidation {
    /// Whether the reply satisfied the contract without any fallback
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Read a backend reply into an `AnalysisResult`
///
/// Never fails. Each field is read on its own:
/// 1. Enumerated fields outside their domain, or missing, take the neutral default
/// 2. A missing summary falls back to the transcript prefix
/// 3. Agent score components outside 0..=10 are dropped
/// 4. The verbatim reply is kept in `raw_response`
pub fn parse_analysis_response(raw: &str, transcript: &Transcript) -> ResponseValidation {
    let mut issues = Vec::new();

    let object = match extract_json_object(raw) {
        Some(object) => object,
        None => {
            issues.push("Reply is not a JSON object".to_string());
            Map::new()
        }
    };

    let intent = read_label(&object, "intent", Intent::parse, &mut issues);
    let sentiment = read_label(&object, "sentiment", Sentiment::parse, &mut issues);
    let tone = read_label(&object, "tone", Tone::parse, &mut issues);
    let urgency = read_label(&object, "urgency", Urgency::parse, &mut issues);

    let summary = match object.get("summary").and_then(Value::as_str).map(str::trim) {
        Some(summary) if !summary.is_empty() => summary_prefix(summary, MAX_SUMMARY_CHARS),
        _ => {
            issues.push("Missing summary, using transcript prefix".to_string());
            summary_prefix(&transcript.text, MAX_SUMMARY_CHARS)
        }
    };

    let important_phrases = object
        .get("important_phrases")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .take(MAX_IMPORTANT_PHRASES)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

    let agent_score = object
        .get("agent_score")
        .and_then(Value::as_object)
        .map(|score| read_agent_score(score, &mut issues))
        .filter(|score| !score.is_empty());

    ResponseValidation {
        result: AnalysisResult {
            sentiment,
            tone,
            intent,
            urgency,
            summary,
            important_phrases,
            agent_score,
            raw_response: Some(raw.to_string()),
        },
        issues,
    }
}

/// Locate the JSON object in a reply that may carry code fences or prose
fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();

    if let Ok(Value::Object(object)) = serde_json::from_str(trimmed) {
        return Some(object);
    }

    // Fall back to the outermost braces
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn read_label<T: Default>(
    object: &Map<String, Value>,
    key: &str,
    parse: fn(&str) -> Option<T>,
    issues: &mut Vec<String>,
) -> T {
    match object.get(key) {
        Some(Value::String(label)) => parse(label).unwrap_or_else(|| {
            issues.push(format!("Out-of-domain {}: {:?}", key, label));
            T::default()
        }),
        Some(other) if !other.is_null() => {
            issues.push(format!("Non-string {}: {}", key, other));
            T::default()
        }
        _ => {
            issues.push(format!("Missing {}", key));
            T::default()
        }
    }
}

fn read_agent_score(score: &Map<String, Value>, issues: &mut Vec<String>) -> AgentScore {
    let mut component = |key: &str| -> Option<u8> {
        let value = score.get(key)?;
        let number = value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?;
        let bounded = AgentScore::bounded(number);
        if bounded.is_none() {
            issues.push(format!("agent_score.{} out of range: {}", key, number));
        }
        bounded
    };

    AgentScore {
        politeness: component("politeness"),
        clarity: component("clarity"),
        resolution: component("resolution"),
    }
}
