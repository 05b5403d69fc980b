use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::error::{DeskError, Result};

/// Issue category assigned once at intake by the category classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Hardware,
    Software,
    Network,
    Access,
    Email,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Hardware => "HARDWARE",
            Category::Software => "SOFTWARE",
            Category::Network => "NETWORK",
            Category::Access => "ACCESS",
            Category::Email => "EMAIL",
            Category::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ticket urgency. Variants are declared in ascending order so `Ord` follows urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    /// Unsupervised automation (the AI fallback) is only allowed below HIGH.
    pub fn allows_automation(&self) -> bool {
        matches!(self, Priority::Low | Priority::Medium)
    }

    /// Next level up, saturating at CRITICAL.
    pub fn raised(&self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High | Priority::Critical => Priority::Critical,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a ticket.
///
/// `NEW -> {RESOLVED, IN_PROGRESS} -> ESCALATED -> CLOSED`. RESOLVED and IN_PROGRESS are
/// only entered from NEW, ESCALATED from any non-terminal state, CLOSED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    New,
    InProgress,
    Resolved,
    Escalated,
    Closed,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::New => "NEW",
            Status::InProgress => "IN_PROGRESS",
            Status::Resolved => "RESOLVED",
            Status::Escalated => "ESCALATED",
            Status::Closed => "CLOSED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Closed)
    }

    pub fn can_transition_to(&self, next: Status) -> bool {
        match (self, next) {
            (Status::New, Status::Resolved | Status::InProgress) => true,
            (from, Status::Escalated) => !from.is_terminal(),
            (Status::Resolved | Status::InProgress | Status::Escalated, Status::Closed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an automatic resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Cache,
    KnowledgeBase,
    Assistant,
}

/// Raw issue report as handed over by the request layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketRequest {
    #[validate(length(min = 5, max = 200))]
    pub title: String,
    #[validate(length(min = 10))]
    pub description: String,
    /// Who reported the issue, usually an e-mail address. Only required to be present.
    #[validate(length(min = 1))]
    pub submitter: String,
}

impl TicketRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        submitter: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            submitter: submitter.into(),
        }
    }
}

/// A ticket record, fully populated by the intake pipeline and handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub submitter: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub assignee: Option<String>,
    pub resolution: Option<String>,
    pub auto_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Creates a NEW ticket. Category and priority hold placeholders until classification.
    pub fn new(request: TicketRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            submitter: request.submitter,
            category: Category::Other,
            priority: Priority::Low,
            status: Status::New,
            assignee: None,
            resolution: None,
            auto_resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Title and description joined the way every classifier sees them.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    /// Moves the ticket along the state machine, stamping `resolved_at` on RESOLVED.
    pub fn transition(&mut self, next: Status) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DeskError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == Status::Resolved {
            self.resolved_at = Some(Utc::now());
        }
        self.status = next;
        Ok(())
    }
}

/// Response shape handed back to the request layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub assignee: Option<String>,
    pub resolution: Option<String>,
    pub estimated_resolution_minutes: u32,
    /// Classifier confidence for `category` (0.0 when the classifier was unavailable).
    pub confidence: f32,
    pub resolution_source: Option<ResolutionSource>,
}
