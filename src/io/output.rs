use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::AnalysisResult;

/// Write an analysis result as pretty JSON
pub fn write_result_json(result: &AnalysisResult, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, result).context("Failed to write JSON")?;
    Ok(())
}

/// Human-readable rendering of an analysis result
pub struct HumanReport<'a> {
    result: &'a AnalysisResult,
}

impl<'a> HumanReport<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        Self { result }
    }

    /// Format the result as plain text
    pub fn format(&self) -> String {
        let r = self.result;
        let mut output = String::new();

        output.push_str("Call Analysis\n");
        output.push_str("=============\n");
        output.push_str(&format!("Intent:    {}\n", label(&r.intent)));
        output.push_str(&format!("Sentiment: {}\n", label(&r.sentiment)));
        output.push_str(&format!("Tone:      {}\n", label(&r.tone)));
        output.push_str(&format!("Urgency:   {}\n", label(&r.urgency)));
        output.push('\n');

        output.push_str("Summary\n");
        output.push_str("-------\n");
        if r.summary.is_empty() {
            output.push_str("(empty transcript)\n");
        } else {
            output.push_str(&wrap_text(&r.summary, 80));
            output.push('\n');
        }

        if let Some(phrases) = r.important_phrases.as_ref().filter(|p| !p.is_empty()) {
            output.push_str("\nImportant phrases\n");
            output.push_str("-----------------\n");
            for phrase in phrases {
                output.push_str(&format!("- {}\n", phrase));
            }
        }

        if let Some(score) = &r.agent_score {
            output.push_str("\nAgent score\n");
            output.push_str("-----------\n");
            output.push_str(&format!("Politeness: {}\n", score_cell(score.politeness)));
            output.push_str(&format!("Clarity:    {}\n", score_cell(score.clarity)));
            output.push_str(&format!("Resolution: {}\n", score_cell(score.resolution)));
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Wire label of an enumerated field
fn label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "unknown".to_string(),
    }
}

fn score_cell(score: Option<u8>) -> String {
    score
        .map(|s| format!("{}/10", s))
        .unwrap_or_else(|| "-".to_string())
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}
