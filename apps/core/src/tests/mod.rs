//! Test Module
//!
//! Cross-module test suite for the intake engine.
//!
//! ## Test Categories
//! - `pipeline_tests`: intake sequence, auto-resolution gating, escalation and close
//! - `handle_tests`: intake actor round trips, cancellation and shutdown
//! - `chaos_test`: concurrent intakes against a shared roster and a slow assistant
//! - `scenario_tests`: end-to-end runs with the default configuration and trained model

pub mod pipeline_tests;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::classify::{CategoryClassifier, Classification};
use crate::config::DeskConfig;
use crate::error::{DeskError, Result};
use crate::models::{Category, TicketRequest};
use crate::pipeline::{FixedClock, IntakePipeline};
use crate::resolve::{ResolutionAssistant, Suggestion, SuggestionRequest};

// --- Mock Components ---

pub struct FixedClassifier(pub Category);

#[async_trait]
impl CategoryClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<Classification> {
        Ok(Classification {
            category: self.0,
            confidence: 0.9,
        })
    }
}

pub struct FailingClassifier;

#[async_trait]
impl CategoryClassifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<Classification> {
        Err(DeskError::ClassificationUnavailable(
            "Simulated model outage".to_string(),
        ))
    }
}

pub struct MockAssistant {
    pub reply: String,
    pub delay_ms: u64,
    pub request_count: Arc<AtomicUsize>,
}

impl MockAssistant {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay_ms: 0,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn slow(reply: &str, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::replying(reply)
        }
    }
}

#[async_trait]
impl ResolutionAssistant for MockAssistant {
    async fn suggest(&self, _request: &SuggestionRequest) -> Result<Suggestion> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
        Ok(Suggestion::Resolution(self.reply.clone()))
    }
}

// --- Fixtures ---

/// Tuesday 10:00 UTC, inside business hours.
pub fn ten_am() -> Arc<FixedClock> {
    let at: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2024-03-12T10:00:00+00:00")
        .expect("valid timestamp");
    Arc::new(FixedClock(at))
}

pub fn request(title: &str, description: &str) -> TicketRequest {
    TicketRequest::new(title, description, "someone@company.com")
}

pub fn build_pipeline(
    config: &DeskConfig,
    classifier: impl CategoryClassifier,
    assistant: impl ResolutionAssistant,
) -> IntakePipeline {
    IntakePipeline::from_config(config, Arc::new(classifier), Arc::new(assistant))
        .with_clock(ten_am())
}

/// Builds a pipeline around `assistant`, returning its call counter alongside.
pub fn pipeline_with_counter(
    config: &DeskConfig,
    classifier: impl CategoryClassifier,
    assistant: MockAssistant,
) -> (IntakePipeline, Arc<AtomicUsize>) {
    let counter = Arc::clone(&assistant.request_count);
    (build_pipeline(config, classifier, assistant), counter)
}
