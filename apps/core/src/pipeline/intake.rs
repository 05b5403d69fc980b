use chrono::{DateTime, FixedOffset, Local};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::assignment::HandlerRoster;
use crate::classify::{classify_ticket, CategoryClassifier, Classification, PriorityClassifier};
use crate::config::DeskConfig;
use crate::error::{DeskError, Result};
use crate::estimate::ResolutionTimeEstimator;
use crate::models::{Priority, ResolutionSource, Status, Ticket, TicketRequest, TicketView};
use crate::resolve::{
    AssistantFallback, KnowledgeBase, ResolutionAssistant, ResolutionCache, SuggestionRequest,
};

/// Source of "now" for resolution-time estimates.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Result of one intake: the populated ticket plus what the caller needs to render it.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeOutcome {
    pub ticket: Ticket,
    pub estimated_resolution_minutes: u32,
    pub confidence: f32,
    pub resolution_source: Option<ResolutionSource>,
}

impl IntakeOutcome {
    pub fn view(&self) -> TicketView {
        TicketView {
            id: self.ticket.id,
            title: self.ticket.title.clone(),
            category: self.ticket.category,
            priority: self.ticket.priority,
            status: self.ticket.status,
            assignee: self.ticket.assignee.clone(),
            resolution: self.ticket.resolution.clone(),
            estimated_resolution_minutes: self.estimated_resolution_minutes,
            confidence: self.confidence,
            resolution_source: self.resolution_source,
        }
    }
}

/// Orchestrates classification, auto-resolution, assignment and estimation for tickets.
///
/// Shared by reference across concurrent intakes. The only mutable state is the
/// resolution cache and the roster's load counters, both internally synchronized.
pub struct IntakePipeline {
    classifier: Arc<dyn CategoryClassifier>,
    priorities: PriorityClassifier,
    cache: ResolutionCache,
    knowledge_base: KnowledgeBase,
    assistant: AssistantFallback,
    roster: HandlerRoster,
    estimator: ResolutionTimeEstimator,
    clock: Arc<dyn Clock>,
}

impl IntakePipeline {
    /// Builds a pipeline from validated configuration and the two pluggable capabilities.
    pub fn from_config(
        config: &DeskConfig,
        classifier: Arc<dyn CategoryClassifier>,
        assistant: Arc<dyn ResolutionAssistant>,
    ) -> Self {
        Self {
            classifier,
            priorities: PriorityClassifier::new(&config.priority_keywords),
            cache: ResolutionCache::new(&config.cache),
            knowledge_base: KnowledgeBase::new(config.knowledge_base.clone()),
            assistant: AssistantFallback::new(
                assistant,
                config.assistant.timeout(),
                config.assistant.escalation_phrases.clone(),
            ),
            roster: HandlerRoster::new(config.roster.clone()),
            estimator: ResolutionTimeEstimator::new(&config.resolution_times, &config.estimator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn roster(&self) -> &HandlerRoster {
        &self.roster
    }

    /// Runs one ticket through the whole intake sequence.
    ///
    /// 1. Validates the request.
    /// 2. Classifies the category, degrading to OTHER if the classifier is unavailable.
    /// 3. Determines the priority.
    /// 4. Tries the cache, then the knowledge base, then (LOW/MEDIUM only) the assistant.
    /// 5. If nothing resolved it, reserves a handler and moves the ticket to IN_PROGRESS.
    /// 6. Estimates resolution time.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed request, `NoEligibleHandler` when the roster is empty.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn intake(&self, request: TicketRequest) -> Result<IntakeOutcome> {
        request.validate()?;
        let mut ticket = Ticket::new(request);

        let classification =
            match classify_ticket(self.classifier.as_ref(), &ticket.title, &ticket.description)
                .await
            {
                Ok(classification) => classification,
                Err(e) => {
                    warn!("Classifier unavailable, filing as OTHER: {}", e);
                    Classification::fallback()
                }
            };
        ticket.category = classification.category;
        ticket.priority = self.priorities.determine_priority(&ticket.text());
        debug!(
            "Classified as {} ({:.2}), priority {}",
            ticket.category, classification.confidence, ticket.priority
        );

        let resolution_source = match self.try_auto_resolve(&ticket).await {
            Some((resolution, source)) => {
                ticket.transition(Status::Resolved)?;
                ticket.resolution = Some(resolution);
                ticket.auto_resolved = true;
                info!("Ticket {} auto-resolved from {:?}", ticket.id, source);
                Some(source)
            }
            None => {
                let assignee = self.roster.reserve(ticket.category, ticket.priority)?;
                ticket.transition(Status::InProgress)?;
                ticket.assignee = Some(assignee);
                None
            }
        };

        let estimated_resolution_minutes = self.estimate(&ticket);
        Ok(IntakeOutcome {
            ticket,
            estimated_resolution_minutes,
            confidence: classification.confidence,
            resolution_source,
        })
    }

    /// Runs many intakes concurrently on the current task. Results keep request order.
    pub async fn intake_batch(&self, requests: Vec<TicketRequest>) -> Vec<Result<IntakeOutcome>> {
        join_all(requests.into_iter().map(|request| self.intake(request))).await
    }

    /// Escalates a ticket and hands it to a (possibly different) handler.
    ///
    /// The priority is raised to `target` or, if none is given, one level; it is never
    /// lowered. The previous assignee's slot moves with the ticket. Returns the fresh
    /// resolution-time estimate.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from a terminal status, `NoEligibleHandler` when the roster is
    /// empty. Either way the ticket and the roster are left untouched.
    #[instrument(skip(self, ticket), fields(ticket_id = %ticket.id))]
    pub fn escalate(&self, ticket: &mut Ticket, target: Option<Priority>) -> Result<u32> {
        let priority = match target {
            Some(target) => target.max(ticket.priority),
            None => ticket.priority.raised(),
        };
        if !ticket.status.can_transition_to(Status::Escalated) {
            return Err(DeskError::InvalidTransition {
                from: ticket.status,
                to: Status::Escalated,
            });
        }

        // Re-route first so a failure leaves the ticket exactly as it was.
        let assignee = self
            .roster
            .transfer(ticket.assignee.as_deref(), ticket.category, priority)?;
        ticket.transition(Status::Escalated)?;
        ticket.priority = priority;
        info!("Escalated ticket {} to {} ({})", ticket.id, assignee, priority);
        ticket.assignee = Some(assignee);

        Ok(self.estimate(ticket))
    }

    /// Closes a ticket and gives its assignee's slot back.
    pub fn close(&self, ticket: &mut Ticket) -> Result<()> {
        ticket.transition(Status::Closed)?;
        if let Some(assignee) = &ticket.assignee {
            self.roster.release(assignee);
        }
        Ok(())
    }

    fn estimate(&self, ticket: &Ticket) -> u32 {
        self.estimator
            .estimate(ticket.category, ticket.priority, &self.clock.now())
    }

    async fn try_auto_resolve(&self, ticket: &Ticket) -> Option<(String, ResolutionSource)> {
        let key = self.cache.key(ticket.category, &ticket.title);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {:?}", key);
            return Some((hit, ResolutionSource::Cache));
        }

        // The knowledge base is consulted at every priority; only the assistant is gated.
        if let Some(entry) = self.knowledge_base.resolve(&ticket.text()) {
            debug!("Knowledge base match: {}", entry.issue_type);
            self.cache.put(key, entry.resolution.clone());
            return Some((entry.resolution.clone(), ResolutionSource::KnowledgeBase));
        }

        if !ticket.priority.allows_automation() {
            debug!("Priority {} skips the assistant", ticket.priority);
            return None;
        }

        let request = SuggestionRequest {
            category: ticket.category,
            title: ticket.title.clone(),
            description: ticket.description.clone(),
        };
        let resolution = self.assistant.attempt(&request).await.into_resolution()?;
        self.cache.put(key, resolution.clone());
        Some((resolution, ResolutionSource::Assistant))
    }
}
