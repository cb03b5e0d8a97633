use chrono::{Duration, Utc};

use seat_allocation::allocation::{AllocationSession, SessionMode};
use seat_allocation::models::{Area, CategoryId, SeatRef, TicketCategoryDraft, VenueTemplate};
use seat_allocation::services::sessions::{PersistedSession, SessionEntry, SessionRegistry};

fn entry() -> SessionEntry {
    let template = VenueTemplate::Areas {
        areas: vec![Area {
            name: "Hall".to_string(),
            rows: 2,
            cols: 2,
            locked_seat_ids: Default::default(),
        }],
    };
    let drafts = vec![TicketCategoryDraft::new("a".into(), "A", 10.0)];
    let session = AllocationSession::open(Some(template), Vec::new(), drafts, SessionMode::Editable).unwrap();
    SessionEntry::new(session, Some(7), Some(3))
}

#[tokio::test]
async fn sessions_are_updated_in_place() {
    let registry = SessionRegistry::new();
    let id = registry.insert(entry()).await;
    assert!(registry.contains(id).await);

    registry
        .update(id, |entry| {
            entry.session.activate(Some("a".into())).unwrap();
            entry.session.pointer_down(&SeatRef::new("A", "1", Some("Hall")));
            entry.session.release();
        })
        .await
        .unwrap();

    let quantity = registry
        .read(id, |entry| entry.session.store().quantity(&CategoryId::from("a")))
        .await;
    assert_eq!(quantity, Some(Some(1)));
    assert!(registry.update(uuid::Uuid::new_v4(), |_| ()).await.is_none());
}

#[tokio::test]
async fn idle_sessions_are_evicted() {
    let registry = SessionRegistry::new();
    let stale = registry.insert(entry()).await;
    let fresh = registry.insert(entry()).await;

    let later = Utc::now() + Duration::minutes(45);
    registry
        .update(fresh, |entry| entry.touched_at = later)
        .await
        .unwrap();

    let evicted = registry.evict_idle(Duration::minutes(30), later).await;
    assert_eq!(evicted, vec![stale]);
    assert!(!registry.contains(stale).await);
    assert!(registry.contains(fresh).await);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn persisted_sessions_come_back_under_the_same_id() {
    let registry = SessionRegistry::new();
    let id = registry.insert(entry()).await;
    registry
        .update(id, |entry| {
            entry.session.activate(Some("a".into())).unwrap();
            entry.session.toggle_area("Hall");
        })
        .await
        .unwrap();

    let record = registry.snapshot(id).await.unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let record: PersistedSession = serde_json::from_str(&json).unwrap();
    registry.remove(id).await;
    assert!(registry.is_empty().await);

    registry
        .insert_with_id(id, SessionEntry::from_persisted(record).unwrap())
        .await;
    let restored = registry
        .read(id, |entry| {
            (
                entry.event_id,
                entry.venue_id,
                entry.session.active().cloned(),
                entry.session.store().quantity(&CategoryId::from("a")),
            )
        })
        .await
        .unwrap();
    assert_eq!(restored, (Some(7), Some(3), Some(CategoryId::from("a")), Some(4)));
}

#[tokio::test]
async fn late_restore_does_not_replace_a_live_session() {
    let registry = SessionRegistry::new();
    let id = registry.insert(entry()).await;
    let stale = registry.snapshot(id).await.unwrap();

    // первый запрос уже поднял сессию и выбрал место
    registry
        .update(id, |entry| {
            entry.session.activate(Some("a".into())).unwrap();
            entry.session.pointer_down(&SeatRef::new("A", "1", Some("Hall")));
        })
        .await
        .unwrap();

    // второй запрос восстанавливает тот же старый снапшот
    let inserted = registry
        .insert_with_id(id, SessionEntry::from_persisted(stale).unwrap())
        .await;
    assert!(!inserted);

    let quantity = registry
        .read(id, |entry| entry.session.store().quantity(&CategoryId::from("a")))
        .await;
    assert_eq!(quantity, Some(Some(1)));
    assert_eq!(registry.len().await, 1);
}
