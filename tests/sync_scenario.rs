//! Reconciliation against an in-memory helpdesk

mod common;

use common::{Desk, FakeHelpdesk, new_ticket};
use etdesk::core::{ChangedFields, Priority, REMOTE_SYNC_ACTOR, Status, TicketField};
use etdesk::error::DeskError;
use etdesk::events::EventBus;
use etdesk::services::AuthorRole;
use etdesk::storage::{CommentRepository, TicketRepository};
use etdesk::sync::{ReconciliationEngine, RemoteHelpdesk};
use std::sync::Arc;
use std::time::Duration;

fn engine(desk: &Desk, fake: &Arc<FakeHelpdesk>) -> ReconciliationEngine {
    let remote: Arc<dyn RemoteHelpdesk> = fake.clone();
    ReconciliationEngine::new(desk.storage.clone(), Some(remote), desk.service.events().clone())
}

#[tokio::test]
async fn test_push_create_links_once_then_conflicts() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);
    let ticket = desk.service.create(new_ticket("VPN drops", "cust-1")).unwrap();
    assert!(ticket.external_id.is_none());

    let link = engine.push_create(&ticket.id).await.unwrap();
    let stored = desk.storage.load(&ticket.id).unwrap();
    assert_eq!(stored.external_id.as_deref(), Some(link.external_id.as_str()));
    assert_eq!(
        stored.external_url.as_deref(),
        Some("https://support.example.com/tickets/1")
    );

    let again = engine.push_create(&ticket.id).await;
    assert!(matches!(again, Err(DeskError::Conflict(_))));
    assert_eq!(fake.creates(), 1);
}

#[tokio::test]
async fn test_pull_comments_twice_imports_once() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);
    let ticket = desk.service.create(new_ticket("Invoice wrong", "cust-2")).unwrap();
    let link = engine.push_create(&ticket.id).await.unwrap();

    fake.add_conversation(1, "We are looking into it", false);
    fake.add_conversation(1, "Escalated to billing", true);

    let first = engine.pull_comments(&link.external_id).await.unwrap();
    let second = engine.pull_comments(&link.external_id).await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(second.is_empty());

    let stored = desk.storage.comments(&ticket.id).unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|c| c.author_id == "cust-2"));
    assert_eq!(stored[1].is_public, Some(false));
}

#[tokio::test]
async fn test_pushed_comment_is_not_imported_back() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);
    let ticket = desk.service.create(new_ticket("Echo", "cust-3")).unwrap();
    let link = engine.push_create(&ticket.id).await.unwrap();

    let (comment, _) = desk
        .service
        .add_comment(&ticket.id, "agent-1", "Please restart", None, AuthorRole::Staff)
        .unwrap();
    let pushed = engine.push_comment(&ticket.id, &comment.id).await.unwrap();
    assert!(pushed.external_id.is_some());

    let imported = engine.pull_comments(&link.external_id).await.unwrap();
    assert!(imported.is_empty());
    assert_eq!(desk.storage.comments(&ticket.id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_pull_overwrites_local_fields() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);
    let ticket = desk.service.create(new_ticket("Slow laptop", "cust-4")).unwrap();
    let link = engine.push_create(&ticket.id).await.unwrap();

    fake.edit(1, |remote| {
        remote.subject = "Slow laptop (RAM)".to_string();
        remote.priority = 3;
        remote.status = 4;
    });

    let pulled = engine.pull_ticket(&link.external_id).await.unwrap();
    assert_eq!(pulled.subject, "Slow laptop (RAM)");
    assert_eq!(pulled.priority, Priority::High);
    assert_eq!(pulled.status, Status::PendingCustomer);
    let change = pulled.last_change().unwrap();
    assert_eq!(change.status, Status::Open);
    assert_eq!(change.actor, REMOTE_SYNC_ACTOR);
    assert!(pulled.last_synced_at.is_some());
}

#[tokio::test]
async fn test_push_update_sends_changed_status() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);
    let ticket = desk.service.create(new_ticket("Closing", "cust-5")).unwrap();
    engine.push_create(&ticket.id).await.unwrap();

    desk.service
        .transition(&ticket.id, Status::Resolved, "agent-1", None)
        .unwrap();
    let changed: ChangedFields = [TicketField::Status].into();
    assert!(engine.push_update(&ticket.id, &changed).await.unwrap());

    let updates = fake.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1.status, Some(5));
    assert!(updates[0].1.subject.is_none());
    assert_eq!(fake.ticket(1).unwrap().status, 5);
}

#[tokio::test]
async fn test_sync_all_isolates_failures() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);

    let mut tickets = Vec::new();
    for i in 0..4 {
        let ticket = desk
            .service
            .create(new_ticket(&format!("Ticket {i}"), "cust-6"))
            .unwrap();
        engine.push_create(&ticket.id).await.unwrap();
        tickets.push(ticket);
    }
    // Unlinked tickets are never attempted
    desk.service.create(new_ticket("Local only", "cust-6")).unwrap();
    // Closed tickets are skipped
    desk.service
        .transition(&tickets[3].id, Status::Closed, "agent-1", None)
        .unwrap();

    fake.fail(2);
    fake.add_conversation(1, "hello", false);
    fake.add_conversation(3, "hi", false);
    fake.edit(3, |remote| remote.status = 3);

    let report = engine.sync_all().await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.comments_imported, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].external_id, "2");
    assert_eq!(report.failed[0].ticket, tickets[1].display_number.to_string());
    assert!(!report.cancelled);

    let third = desk.storage.load(&tickets[2].id).unwrap();
    assert_eq!(third.status, Status::InProgress);

    // Re-running changes nothing further
    let rerun = engine.sync_all().await.unwrap();
    assert_eq!(rerun.comments_imported, 0);
    assert_eq!(
        desk.storage.load(&tickets[2].id).unwrap().status_history.len(),
        1
    );
}

#[tokio::test]
async fn test_damaged_ticket_file_does_not_stop_the_batch() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::new());
    let engine = engine(&desk, &fake);

    let mut tickets = Vec::new();
    for i in 0..3 {
        let ticket = desk
            .service
            .create(new_ticket(&format!("Healthy {i}"), "cust-9"))
            .unwrap();
        engine.push_create(&ticket.id).await.unwrap();
        tickets.push(ticket);
    }
    let damaged = desk.service.create(new_ticket("Damaged", "cust-9")).unwrap();
    std::fs::write(
        desk.storage
            .base_dir()
            .join("tickets")
            .join(format!("{}.yaml", damaged.id)),
        "not: [valid",
    )
    .unwrap();
    fake.edit(2, |remote| remote.subject = "Renamed remotely".to_string());

    let report = engine.sync_all().await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.unreadable.len(), 1);
    assert_eq!(
        desk.storage.load(&tickets[1].id).unwrap().subject,
        "Renamed remotely"
    );
}

#[tokio::test]
async fn test_timeouts_are_per_ticket_failures() {
    let desk = Desk::new();
    let fake = Arc::new(FakeHelpdesk::with_delay(Duration::from_millis(300)));
    let engine = engine(&desk, &fake).with_call_timeout(Duration::from_millis(20));

    let ticket = desk.service.create(new_ticket("Slow remote", "cust-7")).unwrap();
    desk.storage
        .modify(&ticket.id, |t| {
            t.external_id = Some("99".to_string());
            Ok(())
        })
        .unwrap();

    let other = desk.service.create(new_ticket("Other", "cust-7")).unwrap();
    let push = engine.push_create(&other.id).await;
    assert!(matches!(push, Err(DeskError::Remote(_))));
    assert!(!desk.storage.load(&other.id).unwrap().is_linked());

    let report = engine.sync_all().await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 0);
    assert!(report.failed[0].error.contains("timed out"));
}

#[tokio::test]
async fn test_disabled_mode_fails_fast_and_desk_keeps_working() {
    let desk = Desk::new();
    let engine = ReconciliationEngine::new(desk.storage.clone(), None, EventBus::new());

    let ticket = desk.service.create(new_ticket("Offline desk", "cust-8")).unwrap();
    assert!(matches!(
        engine.push_create(&ticket.id).await,
        Err(DeskError::IntegrationDisabled)
    ));
    assert!(matches!(
        engine.sync_all().await,
        Err(DeskError::IntegrationDisabled)
    ));

    let ticket = desk
        .service
        .transition(&ticket.id, Status::InProgress, "agent-1", None)
        .unwrap();
    assert_eq!(ticket.status, Status::InProgress);
    assert!(!ticket.is_linked());
}
