use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use super::{
    build_pipeline, pipeline_with_counter, request, FailingClassifier, FixedClassifier,
    MockAssistant,
};
use crate::assignment::Handler;
use crate::config::DeskConfig;
use crate::error::DeskError;
use crate::models::{Category, Priority, ResolutionSource, Status};
use crate::resolve::NoAssistant;

fn hardware_roster() -> DeskConfig {
    DeskConfig {
        roster: vec![
            Handler::new("alpha@desk.io", [Category::Hardware], 4, 0),
            Handler::new("bravo@desk.io", [Category::Hardware], 4, 1),
        ],
        ..DeskConfig::default()
    }
}

#[tokio::test]
async fn test_knowledge_base_applies_at_critical_priority() {
    let (pipeline, calls) = pipeline_with_counter(
        &DeskConfig::default(),
        FixedClassifier(Category::Access),
        MockAssistant::replying("unused"),
    );

    let outcome = pipeline
        .intake(request(
            "Urgent: account locked",
            "My account is locked and I need it back",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.ticket.priority, Priority::Critical);
    assert_eq!(outcome.ticket.status, Status::Resolved);
    assert_eq!(outcome.resolution_source, Some(ResolutionSource::KnowledgeBase));
    assert!(outcome.ticket.auto_resolved);
    assert!(outcome.ticket.resolved_at.is_some());
    assert!(outcome.ticket.assignee.is_none());
    assert_eq!(outcome.estimated_resolution_minutes, 45);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_assistant_resolution_is_cached() {
    let (pipeline, calls) = pipeline_with_counter(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        MockAssistant::replying("Reseat the display cable."),
    );

    let first = pipeline
        .intake(request(
            "Monitor flickers",
            "The external monitor flickers now and then",
        ))
        .await
        .unwrap();
    assert_eq!(first.ticket.priority, Priority::Low);
    assert_eq!(first.resolution_source, Some(ResolutionSource::Assistant));
    assert_eq!(
        first.ticket.resolution.as_deref(),
        Some("Reseat the display cable.")
    );

    let second = pipeline
        .intake(request(
            "  monitor   FLICKERS ",
            "Same thing on the second screen today",
        ))
        .await
        .unwrap();
    assert_eq!(second.resolution_source, Some(ResolutionSource::Cache));
    assert_eq!(second.ticket.status, Status::Resolved);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_assistant_never_called_above_medium() {
    let (pipeline, calls) = pipeline_with_counter(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        MockAssistant::replying("Should never be used"),
    );

    let high = pipeline
        .intake(request(
            "Projector needed soon",
            "The lamp in the board room projector burnt out",
        ))
        .await
        .unwrap();
    assert_eq!(high.ticket.priority, Priority::High);
    assert_eq!(high.ticket.status, Status::InProgress);

    let critical = pipeline
        .intake(request(
            "Printer broken",
            "The floor printer is broken again today",
        ))
        .await
        .unwrap();
    assert_eq!(critical.ticket.priority, Priority::Critical);
    assert_eq!(critical.ticket.status, Status::InProgress);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(pipeline.cache().is_empty());
}

#[tokio::test]
async fn test_assistant_decline_routes_to_handler() {
    let (pipeline, calls) = pipeline_with_counter(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        MockAssistant::replying("Please contact IT for a replacement unit."),
    );

    let outcome = pipeline
        .intake(request(
            "Monitor flickers",
            "The external monitor flickers now and then",
        ))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.ticket.status, Status::InProgress);
    assert_eq!(outcome.ticket.assignee.as_deref(), Some("alpha@desk.io"));
    assert!(outcome.resolution_source.is_none());
    assert!(pipeline.cache().is_empty());
}

#[tokio::test]
async fn test_assistant_timeout_routes_to_handler() {
    let mut config = hardware_roster();
    config.assistant.timeout_ms = 50;
    let (pipeline, calls) = pipeline_with_counter(
        &config,
        FixedClassifier(Category::Hardware),
        MockAssistant::slow("Too late", 5_000),
    );

    let started = Instant::now();
    let outcome = pipeline
        .intake(request(
            "Monitor flickers",
            "The external monitor flickers now and then",
        ))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.ticket.status, Status::InProgress);
    assert!(outcome.ticket.assignee.is_some());
}

#[tokio::test]
async fn test_classifier_outage_files_as_other() {
    let pipeline = build_pipeline(&DeskConfig::default(), FailingClassifier, NoAssistant);

    let outcome = pipeline
        .intake(request(
            "Projector needed soon",
            "The lamp in the board room projector burnt out",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.ticket.category, Category::Other);
    assert_eq!(outcome.confidence, 0.0);
    // Nobody handles OTHER, so the globally least-loaded handler takes it.
    assert_eq!(
        outcome.ticket.assignee.as_deref(),
        Some("jane.smith@company.com")
    );
    assert_eq!(outcome.estimated_resolution_minutes, 270);
}

#[tokio::test]
async fn test_invalid_request_is_rejected() {
    let pipeline = build_pipeline(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        NoAssistant,
    );

    let err = pipeline
        .intake(request("Hi", "The floor printer is broken again today"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::Validation(_)));
    assert_eq!(pipeline.roster().load_of("alpha@desk.io"), Some(0));
}

#[tokio::test]
async fn test_empty_roster_surfaces_error() {
    let config = DeskConfig {
        roster: vec![],
        ..DeskConfig::default()
    };
    let pipeline = build_pipeline(&config, FixedClassifier(Category::Hardware), NoAssistant);

    let err = pipeline
        .intake(request(
            "Printer broken",
            "The floor printer is broken again today",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::NoEligibleHandler { .. }));
}

#[tokio::test]
async fn test_escalate_raises_priority_and_reroutes() {
    let pipeline = build_pipeline(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        NoAssistant,
    );

    let mut ticket = pipeline
        .intake(request(
            "Projector needed soon",
            "The lamp in the board room projector burnt out",
        ))
        .await
        .unwrap()
        .ticket;
    assert_eq!(ticket.assignee.as_deref(), Some("alpha@desk.io"));
    assert_eq!(pipeline.roster().load_of("alpha@desk.io"), Some(1));

    let minutes = pipeline.escalate(&mut ticket, None).unwrap();

    assert_eq!(ticket.status, Status::Escalated);
    assert_eq!(ticket.priority, Priority::Critical);
    assert_eq!(minutes, 180);
    // Previous slot released before re-routing: total load unchanged.
    let total: u32 = pipeline
        .roster()
        .snapshot()
        .iter()
        .map(|h| h.current_load)
        .sum();
    assert_eq!(total, 2);
    assert!(ticket.assignee.is_some());
}

#[tokio::test]
async fn test_escalate_never_lowers_priority() {
    let pipeline = build_pipeline(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        NoAssistant,
    );
    let mut ticket = pipeline
        .intake(request(
            "Projector needed soon",
            "The lamp in the board room projector burnt out",
        ))
        .await
        .unwrap()
        .ticket;

    let minutes = pipeline.escalate(&mut ticket, Some(Priority::Low)).unwrap();

    assert_eq!(ticket.priority, Priority::High);
    assert_eq!(minutes, 270);
}

#[tokio::test]
async fn test_escalate_auto_resolved_ticket() {
    let pipeline = build_pipeline(
        &DeskConfig::default(),
        FixedClassifier(Category::Access),
        NoAssistant,
    );
    let mut ticket = pipeline
        .intake(request(
            "Forgot my password",
            "I forgot my password and cannot log into my account",
        ))
        .await
        .unwrap()
        .ticket;
    assert_eq!(ticket.status, Status::Resolved);
    assert_eq!(pipeline.roster().load_of("bob.wilson@company.com"), Some(7));

    pipeline.escalate(&mut ticket, None).unwrap();

    assert_eq!(ticket.status, Status::Escalated);
    assert_eq!(ticket.priority, Priority::Medium);
    assert_eq!(ticket.assignee.as_deref(), Some("bob.wilson@company.com"));
    assert_eq!(pipeline.roster().load_of("bob.wilson@company.com"), Some(8));
}

#[tokio::test]
async fn test_failed_escalation_leaves_ticket_untouched() {
    let config = DeskConfig {
        roster: vec![],
        ..DeskConfig::default()
    };
    let pipeline = build_pipeline(&config, FixedClassifier(Category::Access), NoAssistant);
    let mut ticket = pipeline
        .intake(request(
            "Forgot my password",
            "I forgot my password and cannot log into my account",
        ))
        .await
        .unwrap()
        .ticket;
    assert_eq!(ticket.status, Status::Resolved);

    let err = pipeline.escalate(&mut ticket, None).unwrap_err();

    assert!(matches!(err, DeskError::NoEligibleHandler { .. }));
    assert_eq!(ticket.status, Status::Resolved);
    assert_eq!(ticket.priority, Priority::Low);
    assert!(ticket.assignee.is_none());
}

#[tokio::test]
async fn test_close_releases_capacity() {
    let pipeline = build_pipeline(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        NoAssistant,
    );
    let mut ticket = pipeline
        .intake(request(
            "Printer broken",
            "The floor printer is broken again today",
        ))
        .await
        .unwrap()
        .ticket;
    assert_eq!(pipeline.roster().load_of("alpha@desk.io"), Some(1));

    pipeline.close(&mut ticket).unwrap();
    assert_eq!(ticket.status, Status::Closed);
    assert_eq!(pipeline.roster().load_of("alpha@desk.io"), Some(0));

    let err = pipeline.close(&mut ticket).unwrap_err();
    assert!(matches!(
        err,
        DeskError::InvalidTransition {
            from: Status::Closed,
            to: Status::Closed
        }
    ));
    assert!(pipeline.escalate(&mut ticket, None).is_err());
    assert_eq!(pipeline.roster().load_of("alpha@desk.io"), Some(0));
}

#[tokio::test]
async fn test_intake_batch_keeps_order() {
    let pipeline = build_pipeline(
        &hardware_roster(),
        FixedClassifier(Category::Hardware),
        NoAssistant,
    );

    let results = pipeline
        .intake_batch(vec![
            request("Printer broken", "The floor printer is broken again today"),
            request("Hi", "Too short a title for this one"),
            request(
                "Forgot my password",
                "I forgot my password and cannot log into my account",
            ),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().ticket.status, Status::InProgress);
    assert!(matches!(results[1], Err(DeskError::Validation(_))));
    assert_eq!(
        results[2].as_ref().unwrap().resolution_source,
        Some(ResolutionSource::KnowledgeBase)
    );
}
