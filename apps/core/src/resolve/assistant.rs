use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{DeskError, Result};
use crate::models::Category;

/// Ticket context handed to the resolution assistant.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRequest {
    pub category: Category,
    pub title: String,
    pub description: String,
}

/// What a resolution assistant answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// Text the submitter can follow on their own.
    Resolution(String),
    /// The assistant judged the issue to need a human.
    Declined,
}

/// Defines the public interface for a generative resolution capability.
///
/// This trait abstracts the specific backend (remote chat-completion API, local model,
/// canned responder) so that the pipeline can use them interchangeably.
#[async_trait]
pub trait ResolutionAssistant: Send + Sync + 'static {
    /// Drafts a resolution for the ticket, or declines.
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion>;
}

/// Assistant used when no generative backend is configured. Always declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssistant;

#[async_trait]
impl ResolutionAssistant for NoAssistant {
    async fn suggest(&self, _request: &SuggestionRequest) -> Result<Suggestion> {
        Ok(Suggestion::Declined)
    }
}

/// Decides whether a raw assistant reply is a usable resolution.
///
/// This is a substring heuristic and the only place it lives. A reply is treated as a
/// decline when it is empty, when it is literally "none" (the prompt asks the model to
/// answer that when physical or admin intervention is required), or when it contains
/// any of `escalation_phrases` ("contact it", "admin required", ...), compared
/// case-insensitively.
pub fn interpret_reply(reply: &str, escalation_phrases: &[String]) -> Suggestion {
    let trimmed = reply.trim();
    let lower = trimmed.to_lowercase();
    let bare = lower.trim_matches(|c: char| !c.is_alphanumeric());

    if bare.is_empty() || bare == "none" {
        return Suggestion::Declined;
    }
    if escalation_phrases
        .iter()
        .any(|phrase| lower.contains(&phrase.to_lowercase()))
    {
        return Suggestion::Declined;
    }
    Suggestion::Resolution(trimmed.to_string())
}

/// Outcome of one fallback attempt, keeping "declined" and "failed" apart for logging.
#[derive(Debug)]
pub enum AssistantOutcome {
    Resolved(String),
    Declined,
    Failed(DeskError),
}

impl AssistantOutcome {
    /// Collapses the outcome to what the pipeline acts on.
    pub fn into_resolution(self) -> Option<String> {
        match self {
            AssistantOutcome::Resolved(text) => Some(text),
            AssistantOutcome::Declined | AssistantOutcome::Failed(_) => None,
        }
    }
}

/// Best-effort wrapper around a [`ResolutionAssistant`]: enforces the deadline, applies
/// the reply heuristic and never propagates failures.
#[derive(Clone)]
pub struct AssistantFallback {
    assistant: Arc<dyn ResolutionAssistant>,
    deadline: Duration,
    escalation_phrases: Vec<String>,
}

impl AssistantFallback {
    pub fn new(
        assistant: Arc<dyn ResolutionAssistant>,
        deadline: Duration,
        escalation_phrases: Vec<String>,
    ) -> Self {
        Self {
            assistant,
            deadline,
            escalation_phrases,
        }
    }

    pub async fn attempt(&self, request: &SuggestionRequest) -> AssistantOutcome {
        debug!("Asking assistant about '{}'", request.title);

        let reply = match timeout(self.deadline, self.assistant.suggest(request)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!("Assistant failed, continuing without it: {}", e);
                return AssistantOutcome::Failed(e);
            }
            Err(elapsed) => {
                warn!(
                    "Assistant exceeded {:?}, continuing without it",
                    self.deadline
                );
                return AssistantOutcome::Failed(elapsed.into());
            }
        };

        match reply {
            Suggestion::Resolution(text) => match interpret_reply(&text, &self.escalation_phrases) {
                Suggestion::Resolution(text) => AssistantOutcome::Resolved(text),
                Suggestion::Declined => {
                    info!("Assistant reply asks for human intervention");
                    AssistantOutcome::Declined
                }
            },
            Suggestion::Declined => AssistantOutcome::Declined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn phrases() -> Vec<String> {
        vec!["contact it".to_string(), "admin required".to_string()]
    }

    fn request() -> SuggestionRequest {
        SuggestionRequest {
            category: Category::Software,
            title: "Teams sound missing".to_string(),
            description: "No audio in meetings since yesterday".to_string(),
        }
    }

    struct Scripted(Result<Suggestion>);

    #[async_trait]
    impl ResolutionAssistant for Scripted {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<Suggestion> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(DeskError::ResolutionCapability(e.to_string())),
            }
        }
    }

    struct Sleepy;

    #[async_trait]
    impl ResolutionAssistant for Sleepy {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<Suggestion> {
            sleep(Duration::from_secs(30)).await;
            Ok(Suggestion::Resolution("too late".to_string()))
        }
    }

    fn fallback(assistant: impl ResolutionAssistant) -> AssistantFallback {
        AssistantFallback::new(Arc::new(assistant), Duration::from_millis(50), phrases())
    }

    #[test]
    fn test_interpret_reply() {
        assert_eq!(
            interpret_reply("  Select the right output device.  ", &phrases()),
            Suggestion::Resolution("Select the right output device.".to_string())
        );
        assert_eq!(interpret_reply("", &phrases()), Suggestion::Declined);
        assert_eq!(interpret_reply("None.", &phrases()), Suggestion::Declined);
        assert_eq!(
            interpret_reply("Please Contact IT to replace the headset", &phrases()),
            Suggestion::Declined
        );
        assert_eq!(
            interpret_reply("Admin required for driver install", &phrases()),
            Suggestion::Declined
        );
    }

    #[tokio::test]
    async fn test_attempt_resolves() {
        let outcome = fallback(Scripted(Ok(Suggestion::Resolution(
            "Restart Teams".to_string(),
        ))))
        .attempt(&request())
        .await;
        assert_eq!(outcome.into_resolution().as_deref(), Some("Restart Teams"));
    }

    #[tokio::test]
    async fn test_attempt_declines_on_escalation_language() {
        let outcome = fallback(Scripted(Ok(Suggestion::Resolution(
            "You should contact IT".to_string(),
        ))))
        .attempt(&request())
        .await;
        assert!(matches!(outcome, AssistantOutcome::Declined));
    }

    #[tokio::test]
    async fn test_attempt_swallows_failure() {
        let outcome = fallback(Scripted(Err(DeskError::ResolutionCapability(
            "503".to_string(),
        ))))
        .attempt(&request())
        .await;
        assert!(matches!(
            outcome,
            AssistantOutcome::Failed(DeskError::ResolutionCapability(_))
        ));
    }

    #[tokio::test]
    async fn test_attempt_times_out() {
        let started = std::time::Instant::now();
        let outcome = fallback(Sleepy).attempt(&request()).await;
        assert!(matches!(outcome, AssistantOutcome::Failed(DeskError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_no_assistant_declines() {
        let outcome = fallback(NoAssistant).attempt(&request()).await;
        assert!(outcome.into_resolution().is_none());
    }
}
