//! Multinomial naive Bayes category model.
//!
//! Fitted once from labeled examples at construction and immutable afterwards, so
//! predictions are deterministic for a given snapshot.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::category::{CategoryClassifier, Classification};
use super::tokens::tokenize;
use crate::error::{DeskError, Result};
use crate::models::Category;

/// Additive (Laplace) smoothing constant.
const ALPHA: f64 = 1.0;

/// Labeled sample tickets used when no other training data is supplied.
pub const DEFAULT_TRAINING_SET: &[(&str, Category)] = &[
    ("Computer won't turn on", Category::Hardware),
    ("Monitor flickering", Category::Hardware),
    ("Keyboard not working", Category::Hardware),
    ("Laptop overheating", Category::Hardware),
    ("Excel keeps crashing", Category::Software),
    ("Cannot install software", Category::Software),
    ("Application error on startup", Category::Software),
    ("Software license expired", Category::Software),
    ("Cannot connect to WiFi", Category::Network),
    ("Internet very slow", Category::Network),
    ("VPN not connecting", Category::Network),
    ("Cannot access shared drive", Category::Network),
    ("Password reset needed", Category::Access),
    ("Account locked out", Category::Access),
    ("Need access to system", Category::Access),
    ("Two-factor authentication issues", Category::Access),
    ("Email not sending", Category::Email),
    ("Spam filter blocking legitimate emails", Category::Email),
    ("Outlook not syncing", Category::Email),
    ("Email quota exceeded", Category::Email),
];

#[derive(Debug, Default)]
struct ClassStats {
    documents: usize,
    token_total: usize,
    token_counts: HashMap<String, usize>,
}

/// A fitted naive Bayes model over word counts.
#[derive(Debug)]
pub struct NaiveBayesClassifier {
    // BTreeMap keeps iteration, and therefore tie-breaking, in `Category` order.
    classes: BTreeMap<Category, ClassStats>,
    vocabulary: HashSet<String>,
    document_total: usize,
}

impl NaiveBayesClassifier {
    /// Fits the model on `(text, category)` pairs.
    pub fn fit<S: AsRef<str>>(examples: &[(S, Category)]) -> Result<Self> {
        if examples.is_empty() {
            return Err(DeskError::ClassificationUnavailable(
                "cannot fit a model without examples".to_string(),
            ));
        }

        let mut classes: BTreeMap<Category, ClassStats> = BTreeMap::new();
        let mut vocabulary = HashSet::new();

        for (text, category) in examples {
            let stats = classes.entry(*category).or_default();
            stats.documents += 1;
            for token in tokenize(text.as_ref()) {
                stats.token_total += 1;
                *stats.token_counts.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token);
            }
        }

        debug!(
            "Fitted naive Bayes model: {} classes, {} terms, {} documents",
            classes.len(),
            vocabulary.len(),
            examples.len()
        );

        Ok(Self {
            classes,
            vocabulary,
            document_total: examples.len(),
        })
    }

    /// The model trained on [`DEFAULT_TRAINING_SET`].
    pub fn with_default_training() -> Result<Self> {
        Self::fit(DEFAULT_TRAINING_SET)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Predicts the most probable category and its posterior probability.
    ///
    /// Text sharing no term with the vocabulary carries no evidence and yields
    /// OTHER with zero confidence.
    pub fn predict(&self, text: &str) -> Classification {
        let tokens: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| self.vocabulary.contains(t))
            .collect();

        if tokens.is_empty() {
            return Classification::fallback();
        }

        let vocab = self.vocabulary.len() as f64;
        let log_scores: Vec<(Category, f64)> = self
            .classes
            .iter()
            .map(|(category, stats)| {
                let prior = (stats.documents as f64 / self.document_total as f64).ln();
                let denominator = stats.token_total as f64 + ALPHA * vocab;
                let likelihood: f64 = tokens
                    .iter()
                    .map(|t| {
                        let count = stats.token_counts.get(t).copied().unwrap_or(0) as f64;
                        ((count + ALPHA) / denominator).ln()
                    })
                    .sum();
                (*category, prior + likelihood)
            })
            .collect();

        let mut best = log_scores[0];
        for candidate in &log_scores[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }

        // Softmax of the winning score against all classes.
        let normalizer: f64 = log_scores.iter().map(|(_, s)| (s - best.1).exp()).sum();

        Classification {
            category: best.0,
            confidence: (1.0 / normalizer) as f32,
        }
    }
}

#[async_trait]
impl CategoryClassifier for NaiveBayesClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        Ok(self.predict(text))
    }
}
