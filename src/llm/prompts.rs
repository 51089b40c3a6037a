use crate::models::{AudioCues, Transcript};

/// System prompt for call analysis (fixed output contract)
pub const SYSTEM_PROMPT: &str = r#"You are an assistant specialized in call analytics. You will be given the transcript of a customer-service call, possibly with timestamps and audio cues.

Return a single JSON object with exactly these keys:
- intent: one of billing_issue, cancel_subscription, product_question, feedback, support_request, other
- tone: one of calm, frustrated, angry, cheerful, uncertain, neutral
- sentiment: one of positive, negative, neutral
- urgency: one of low, medium, high
- summary: a short neutral summary of the call, at most 400 characters
- important_phrases: array of short verbatim phrases from the transcript that drove your assessment
- agent_score: object with integer keys politeness, clarity, resolution, each from 0 to 10, or null if no agent speaks

RULES:
1. Use only the listed values for intent, tone, sentiment and urgency.
2. Do not invent content that is not in the transcript.
3. Return only valid JSON. No markdown, no commentary."#;

/// Most segments listed in a prompt; longer calls fall back to plain text
pub const MAX_PROMPT_SEGMENTS: usize = 400;

/// Build the user prompt for one transcript
pub fn build_analysis_prompt(transcript: &Transcript, cues: Option<&AudioCues>) -> String {
    let mut prompt = String::new();

    prompt.push_str("# Call transcript\n");
    if let Some(language) = &transcript.language {
        prompt.push_str(&format!("Language: {}\n", language));
    }
    prompt.push('\n');

    if transcript.has_segments() && transcript.segments.len() <= MAX_PROMPT_SEGMENTS {
        prompt.push_str("## Segments\n");
        for segment in &transcript.segments {
            prompt.push_str(&format!(
                "[{} - {}] {}\n",
                format_timestamp(segment.start),
                format_timestamp(segment.end),
                segment.text.trim()
            ));
        }
    } else {
        prompt.push_str("## Text\n");
        if transcript.text.trim().is_empty() {
            prompt.push_str("(no speech detected)\n");
        } else {
            prompt.push_str(transcript.text.trim());
            prompt.push('\n');
        }
    }
    prompt.push('\n');

    if let Some(cues) = cues {
        prompt.push_str("## Audio cues\n");
        prompt.push_str(&format!("- Duration: {:.1}s\n", cues.duration_secs));
        prompt.push_str(&format!(
            "- Pauses over {:.0}s: {} (longest {:.1}s)\n",
            AudioCues::PAUSE_THRESHOLD_SECS,
            cues.pause_count,
            cues.longest_pause_secs
        ));
        if let Some(wpm) = cues.words_per_minute {
            prompt.push_str(&format!("- Speaking rate: {:.0} words/min\n", wpm));
        }
        prompt.push('\n');
    }

    prompt.push_str("## Instructions\n");
    prompt.push_str("Analyze the call and respond with the JSON object described in the system prompt.\n");

    prompt
}

/// Format seconds as MM:SS.mmm
fn format_timestamp(secs: f64) -> String {
    let ms = (secs.max(0.0) * 1000.0).round() as u64;
    let seconds = ms / 1000;
    let millis = ms % 1000;
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}.{:03}", minutes, secs, millis)
}
