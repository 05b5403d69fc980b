//! Category classification capability.
//!
//! The pipeline only sees the [`CategoryClassifier`] trait; backing implementations
//! (rule-based, trained model, remote service) are swapped in at construction time.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::Result;
use crate::models::Category;

/// Result of a category classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
}

impl Classification {
    /// What the pipeline records when no classifier answer is available.
    pub fn fallback() -> Self {
        Self {
            category: Category::Other,
            confidence: 0.0,
        }
    }
}

/// Defines the public interface for a text-classification capability.
///
/// Implementations must be deterministic for a fixed model snapshot. When the capability
/// cannot answer they fail with `DeskError::ClassificationUnavailable`.
#[async_trait]
pub trait CategoryClassifier: Send + Sync + 'static {
    /// Classifies the concatenated ticket text.
    async fn classify(&self, text: &str) -> Result<Classification>;
}

/// Classifies a ticket from its title and description.
pub async fn classify_ticket(
    classifier: &dyn CategoryClassifier,
    title: &str,
    description: &str,
) -> Result<Classification> {
    classifier
        .classify(&format!("{} {}", title, description))
        .await
}

struct CategoryPattern {
    category: Category,
    patterns: &'static LazyLock<Vec<Regex>>,
    weight: f32,
}

// NOTE: expect() is acceptable for literal patterns; a failure is a programming error.
static HARDWARE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(computer|laptop|desktop|monitor|keyboard|mouse|printer|screen|battery|dock)\b").expect("Invalid regex: hardware devices"),
        Regex::new(r"(?i)\b(overheat\w*|flicker\w*|turn on|power supply|no power|fan noise)\b").expect("Invalid regex: hardware symptoms"),
    ]
});

static SOFTWARE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(software|application|app|program|excel|word|teams|browser|licen[cs]e)\b").expect("Invalid regex: software products"),
        Regex::new(r"(?i)\b(crash\w*|freez\w*|not responding|install\w*|update\w*|startup)\b").expect("Invalid regex: software symptoms"),
    ]
});

static NETWORK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(wi-?fi|wireless|vpn|internet|network|ethernet|dns|proxy)\b").expect("Invalid regex: network terms"),
        Regex::new(r"(?i)\b(connect\w*|disconnect\w*|slow|latency|shared drive)\b").expect("Invalid regex: network symptoms"),
    ]
});

static ACCESS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(password|account|login|log in|sign in|permissions?)\b").expect("Invalid regex: access subjects"),
        Regex::new(r"(?i)\b(locked|reset|forgot|two-factor|2fa|mfa|authenticat\w*)\b").expect("Invalid regex: access symptoms"),
    ]
});

static EMAIL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(e-?mails?|outlook|inbox|mailbox|spam)\b").expect("Invalid regex: email subjects"),
        Regex::new(r"(?i)\b(sending|syncing|quota|attachments?|bounc\w*)\b").expect("Invalid regex: email symptoms"),
    ]
});

/// Rule-based classifier using regex patterns. No model required.
pub struct KeywordCategoryClassifier {
    patterns: Vec<CategoryPattern>,
}

impl Default for KeywordCategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordCategoryClassifier {
    pub fn new() -> Self {
        // Earlier groups win ties.
        let patterns = vec![
            CategoryPattern {
                category: Category::Access,
                patterns: &ACCESS_PATTERNS,
                weight: 1.0,
            },
            CategoryPattern {
                category: Category::Email,
                patterns: &EMAIL_PATTERNS,
                weight: 1.0,
            },
            CategoryPattern {
                category: Category::Network,
                patterns: &NETWORK_PATTERNS,
                weight: 0.95,
            },
            CategoryPattern {
                category: Category::Hardware,
                patterns: &HARDWARE_PATTERNS,
                weight: 0.9,
            },
            CategoryPattern {
                category: Category::Software,
                patterns: &SOFTWARE_PATTERNS,
                weight: 0.85,
            },
        ];

        Self { patterns }
    }

    pub fn classify_text(&self, text: &str) -> Classification {
        let text = text.trim();
        let mut best = Classification::fallback();
        let mut best_score: f32 = 0.0;

        for group in &self.patterns {
            let matches = group.patterns.iter().filter(|p| p.is_match(text)).count();
            if matches == 0 {
                continue;
            }
            let score = matches as f32 / group.patterns.len() as f32 * group.weight;
            if score > best_score {
                best_score = score;
                best.category = group.category;
            }
        }

        best.confidence = (best_score * 1.2).min(1.0);
        best
    }
}

#[async_trait]
impl CategoryClassifier for KeywordCategoryClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        Ok(self.classify_text(text))
    }
}
