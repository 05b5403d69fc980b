//! # Classify Module
//!
//! Turns free ticket text into a category and a priority.
//!
//! ## Components
//! - `category`: the classification capability trait and a regex rule-based backing
//! - `naive_bayes`: a trained word-count model backing
//! - `priority`: ordered keyword tiers
//! - `tokens`: shared tokenizer

pub mod category;
pub mod naive_bayes;
pub mod priority;
pub mod tokens;

pub use category::{classify_ticket, CategoryClassifier, Classification, KeywordCategoryClassifier};
pub use naive_bayes::{NaiveBayesClassifier, DEFAULT_TRAINING_SET};
pub use priority::{PriorityClassifier, PriorityKeywords};
