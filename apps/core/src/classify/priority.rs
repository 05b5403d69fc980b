//! Priority determination from urgency keywords.
//!
//! Tiers are evaluated in fixed precedence order: CRITICAL, then HIGH, then MEDIUM.
//! The first tier with any keyword present wins; keyword counts never matter.

use serde::{Deserialize, Serialize};

use crate::models::Priority;

/// Keyword sets for each tier above LOW.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriorityKeywords {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
}

impl Default for PriorityKeywords {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }

        Self {
            critical: owned(&[
                "urgent",
                "critical",
                "emergency",
                "down",
                "crashed",
                "broken",
                "asap",
            ]),
            high: owned(&["important", "quickly", "soon", "cannot work", "blocked"]),
            medium: owned(&["issue", "problem", "error", "help"]),
        }
    }
}

/// Stateless keyword-tier priority classifier.
#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    tiers: Vec<(Priority, Vec<String>)>,
}

impl Default for PriorityClassifier {
    fn default() -> Self {
        Self::new(&PriorityKeywords::default())
    }
}

impl PriorityClassifier {
    pub fn new(keywords: &PriorityKeywords) -> Self {
        let lower = |words: &[String]| -> Vec<String> {
            words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        // Order is the business rule.
        let tiers = vec![
            (Priority::Critical, lower(&keywords.critical)),
            (Priority::High, lower(&keywords.high)),
            (Priority::Medium, lower(&keywords.medium)),
        ];
        Self { tiers }
    }

    /// Returns the priority of the first tier with a substring match, LOW otherwise.
    pub fn determine_priority(&self, text: &str) -> Priority {
        let text = text.to_lowercase();

        self.tiers
            .iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w.as_str())))
            .map(|(priority, _)| *priority)
            .unwrap_or(Priority::Low)
    }
}
