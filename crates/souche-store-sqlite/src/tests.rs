//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::NaiveDate;
use souche_core::{
  person::{Genre, Person, PersonId},
  position::{ActorId, HistoryAction, NewHistoryEntry, Point},
  recorder::{ActorPolicy, PositionRecorder},
  store::{RelationshipStore, Role, StoreError as _},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn id(n: u128) -> PersonId { Uuid::from_u128(n) }

fn person(n: u128, genre: Genre) -> Person {
  Person::new(id(n), format!("Prenom{n}"), "Famille", genre)
}

fn entry(person_id: PersonId, action: HistoryAction) -> NewHistoryEntry {
  NewHistoryEntry { person_id, x: 1.0, y: 2.0, action, updated_by: None }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_person() {
  let s = store().await;

  let mut p = person(1, Genre::Femme);
  p.pere = Some(id(7));
  p.ordre_naissance = 3;
  p.date_naissance = NaiveDate::from_ymd_opt(1931, 6, 2);
  p.image = Some("https://example.com/p1.jpg".into());
  s.put_person(p.clone()).await.unwrap();

  let fetched = s.get_person(id(1)).await.unwrap();
  assert_eq!(fetched, Some(p));
}

#[tokio::test]
async fn get_person_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_persons_keeps_insertion_order() {
  let s = store().await;
  for n in [5, 2, 9] {
    s.put_person(person(n, Genre::Homme)).await.unwrap();
  }
  // Replacing a record does not move it.
  let mut renamed = person(5, Genre::Homme);
  renamed.nom = "Autre".into();
  s.put_person(renamed).await.unwrap();

  let all = s.list_persons().await.unwrap();
  let ids: Vec<_> = all.iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![id(5), id(2), id(9)]);
  assert_eq!(all[0].nom, "Autre");
}

#[tokio::test]
async fn replacing_a_person_keeps_its_position() {
  let s = store().await;
  s.put_person(person(1, Genre::Homme)).await.unwrap();
  s.upsert_position(id(1), 4.0, 5.0).await.unwrap();

  s.put_person(person(1, Genre::Homme)).await.unwrap();
  assert!(s.get_position(id(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_person_removes_position_but_keeps_history() {
  let s = store().await;
  s.put_person(person(1, Genre::Homme)).await.unwrap();
  s.upsert_position(id(1), 4.0, 5.0).await.unwrap();
  s.append_history(entry(id(1), HistoryAction::Created)).await.unwrap();

  assert!(s.delete_person(id(1)).await.unwrap());
  assert!(!s.delete_person(id(1)).await.unwrap());
  assert!(s.get_position(id(1)).await.unwrap().is_none());
  assert_eq!(s.list_history(id(1)).await.unwrap().len(), 1);
}

// ─── Positions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_position_overwrites() {
  let s = store().await;
  s.put_person(person(1, Genre::Homme)).await.unwrap();

  let first = s.upsert_position(id(1), 10.0, 20.0).await.unwrap();
  let second = s.upsert_position(id(1), 30.0, 40.0).await.unwrap();
  assert!(first.created);
  assert!(!second.created);
  assert_eq!(second.position.point(), Point::new(30.0, 40.0));

  let pos = s.get_position(id(1)).await.unwrap().unwrap();
  assert_eq!(pos.point(), Point::new(30.0, 40.0));
  assert_eq!(s.list_positions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn upsert_position_for_unknown_person_fails() {
  let s = store().await;
  let err = s.upsert_position(id(404), 1.0, 1.0).await.unwrap_err();
  assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn delete_position_reports_absence() {
  let s = store().await;
  s.put_person(person(1, Genre::Homme)).await.unwrap();
  assert!(!s.delete_position(id(1)).await.unwrap());
  s.upsert_position(id(1), 0.0, 0.0).await.unwrap();
  assert!(s.delete_position(id(1)).await.unwrap());
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_is_a_timeline() {
  let s = store().await;
  let mut e = entry(id(1), HistoryAction::Created);
  e.updated_by = Some(ActorId::from("alice"));
  s.append_history(e).await.unwrap();
  s.append_history(entry(id(1), HistoryAction::Updated)).await.unwrap();
  s.append_history(entry(id(2), HistoryAction::Created)).await.unwrap();

  let timeline = s.list_history(id(1)).await.unwrap();
  let actions: Vec<_> = timeline.iter().map(|h| h.action).collect();
  assert_eq!(actions, vec![HistoryAction::Created, HistoryAction::Updated]);
  assert_eq!(timeline[0].updated_by, Some(ActorId::from("alice")));
  assert_eq!(timeline[1].updated_by, None);
}

#[tokio::test]
async fn specific_delete_label_is_rejected_by_constraint() {
  let s = store().await;
  let err = s
    .append_history(entry(id(1), HistoryAction::PersonDeleted))
    .await
    .unwrap_err();
  assert!(err.is_constraint_violation());
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_one_administrator() {
  let s = store().await;
  assert!(s.find_one_administrator().await.unwrap().is_none());

  s.add_identity("member-1".into(), Role::Member).await.unwrap();
  assert!(s.find_one_administrator().await.unwrap().is_none());

  s.add_identity("admin-1".into(), Role::Administrator).await.unwrap();
  assert_eq!(
    s.find_one_administrator().await.unwrap(),
    Some(ActorId::from("admin-1"))
  );
}

// ─── Recorder against SQLite ─────────────────────────────────────────────────

#[tokio::test]
async fn person_deletion_is_recorded_with_generic_label() {
  let s = Arc::new(store().await);
  s.put_person(person(1, Genre::Homme)).await.unwrap();
  let (recorder, _worker) =
    PositionRecorder::spawn(Arc::clone(&s), ActorPolicy::default());

  recorder
    .commit(id(1), Point::new(8.0, 9.0), Some("bob".into()), HistoryAction::Created)
    .await
    .unwrap();
  recorder
    .commit(id(1), Point::new(8.0, 9.0), Some("bob".into()), HistoryAction::PersonDeleted)
    .await
    .unwrap();
  s.delete_person(id(1)).await.unwrap();
  recorder.flush().await;

  let actions: Vec<_> =
    s.list_history(id(1)).await.unwrap().into_iter().map(|h| h.action).collect();
  assert_eq!(actions, vec![HistoryAction::Created, HistoryAction::Deleted]);
}

#[tokio::test]
async fn concurrent_first_moves_record_one_creation() {
  let s = Arc::new(store().await);
  s.put_person(person(1, Genre::Homme)).await.unwrap();
  let (recorder, _worker) =
    PositionRecorder::spawn(Arc::clone(&s), ActorPolicy::default());

  let (a, b) = tokio::join!(
    recorder.commit_move(id(1), Point::new(1.0, 1.0), None),
    recorder.commit_move(id(1), Point::new(2.0, 2.0), None),
  );
  a.unwrap();
  b.unwrap();
  recorder.flush().await;

  let mut actions: Vec<_> =
    s.list_history(id(1)).await.unwrap().into_iter().map(|h| h.action.as_str()).collect();
  actions.sort();
  assert_eq!(actions, vec!["created", "updated"]);
}

#[tokio::test]
async fn synthetic_actor_is_replaced_by_stored_administrator() {
  let s = Arc::new(store().await);
  s.put_person(person(1, Genre::Femme)).await.unwrap();
  s.add_identity("root".into(), Role::Administrator).await.unwrap();
  let (recorder, _worker) =
    PositionRecorder::spawn(Arc::clone(&s), ActorPolicy::new(["test-user"]));

  recorder
    .commit(id(1), Point::new(1.0, 1.0), Some("test-user".into()), HistoryAction::Updated)
    .await
    .unwrap();
  recorder.flush().await;

  let history = s.list_history(id(1)).await.unwrap();
  assert_eq!(history[0].updated_by, Some(ActorId::from("root")));
}
