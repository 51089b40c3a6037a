/// A label selected when any of its keywords occurs in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule<T> {
    pub label: T,
    /// Lower-case substrings, matched anywhere (no word boundaries)
    pub keywords: Vec<String>,
}

impl<T: Copy> KeywordRule<T> {
    pub fn new(label: T, keywords: &[&str]) -> Self {
        Self {
            label,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn matches(&self, text_lower: &str) -> bool {
        self.keywords.iter().any(|k| text_lower.contains(k.as_str()))
    }
}

/// Evaluate rules in order; the first rule with a matching keyword wins
pub fn first_match<T: Copy>(text_lower: &str, rules: &[KeywordRule<T>], fallback: T) -> T {
    rules
        .iter()
        .find(|rule| rule.matches(text_lower))
        .map(|rule| rule.label)
        .unwrap_or(fallback)
}
