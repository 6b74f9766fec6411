//! Insights mined from pasted chat transcripts

use serde::{Deserialize, Serialize};

/// Ordered insight lines in detection order; duplicates are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatInsightSet {
    insights: Vec<String>,
}

impl ChatInsightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, insight: impl Into<String>) {
        self.insights.push(insight.into());
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.insights.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.insights.iter().map(String::as_str)
    }

    /// Block appended to plan prompts; empty when there is nothing to say
    pub fn render_for_prompt(&self) -> String {
        if self.insights.is_empty() {
            return String::new();
        }
        format!(
            "INSIGHTS EXTRACTED FROM CONVERSATION:\n- {}",
            self.insights.join("\n- ")
        )
    }
}

impl From<Vec<String>> for ChatInsightSet {
    fn from(insights: Vec<String>) -> Self {
        Self { insights }
    }
}

impl IntoIterator for ChatInsightSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.insights.into_iter()
    }
}
