use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The page a question was asked about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

impl PageInfo {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    // Entries written before ids existed get a fresh one on load
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, page: &PageInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            url: page.url.clone(),
            title: page.title.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Title for display, falling back to the URL when the page had none
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}
