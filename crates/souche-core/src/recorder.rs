//! Position persistence with a best-effort audit trail.
//!
//! [`PositionRecorder::commit_move`] writes the live position and reports the
//! outcome to the caller. The matching history entry goes through a
//! background task: its failures are logged and dropped, and never reach the
//! commit result. The task handles entries one at a time in the order they
//! were committed.

use std::{collections::HashSet, sync::Arc};

use tokio::{
  sync::{mpsc, oneshot},
  task::JoinHandle,
};

use crate::{
  person::PersonId,
  position::{ActorId, HistoryAction, NewHistoryEntry, Point, Position},
  store::{RelationshipStore, StoreError as _},
};

// ─── Actor policy ────────────────────────────────────────────────────────────

/// Actor ids that stand for synthetic or test identities. History entries
/// never carry them; a real administrator is recorded instead.
#[derive(Debug, Clone, Default)]
pub struct ActorPolicy {
  synthetic: HashSet<String>,
}

impl ActorPolicy {
  pub fn new<I, T>(synthetic: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    Self { synthetic: synthetic.into_iter().map(Into::into).collect() }
  }

  pub fn is_synthetic(&self, actor: &ActorId) -> bool {
    self.synthetic.contains(actor.as_str())
  }
}

// ─── Recorder ────────────────────────────────────────────────────────────────

enum Job {
  Record(NewHistoryEntry),
  Flush(oneshot::Sender<()>),
}

/// Handle to the position writer and its history task. Cloning is cheap;
/// the task stops once every handle is dropped.
pub struct PositionRecorder<S> {
  store: Arc<S>,
  jobs:  mpsc::UnboundedSender<Job>,
}

impl<S> Clone for PositionRecorder<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), jobs: self.jobs.clone() }
  }
}

impl<S> PositionRecorder<S>
where
  S: RelationshipStore + 'static,
{
  /// Start the history task on the current tokio runtime.
  pub fn spawn(store: Arc<S>, policy: ActorPolicy) -> (Self, JoinHandle<()>) {
    let (jobs, queue) = mpsc::unbounded_channel();
    let worker = tokio::spawn(run_history(Arc::clone(&store), policy, queue));
    (Self { store, jobs }, worker)
  }

  /// Persist the end of a drag and queue its history entry, labelled
  /// `created` for the person's first position and `updated` afterwards.
  ///
  /// The label comes from the store's write, not from an earlier read, so
  /// concurrent first commits record a single `created`. A store failure is
  /// returned as is; nothing is queued in that case.
  pub async fn commit_move(
    &self,
    person_id: PersonId,
    at: Point,
    actor: Option<ActorId>,
  ) -> Result<Position, S::Error> {
    let write = self.store.upsert_position(person_id, at.x, at.y).await?;
    self.enqueue(person_id, at, actor, write.action());
    Ok(write.position)
  }

  /// Persist a position change under an explicit label and queue its
  /// history entry.
  ///
  /// `Created` and `Updated` upsert the live row and return it; the removal
  /// actions delete it (if still present) and return `None`. A store failure
  /// on that write is returned as is; nothing is queued in that case.
  pub async fn commit(
    &self,
    person_id: PersonId,
    at: Point,
    actor: Option<ActorId>,
    action: HistoryAction,
  ) -> Result<Option<Position>, S::Error> {
    let position = if action.is_removal() {
      self.store.delete_position(person_id).await?;
      None
    } else {
      Some(self.store.upsert_position(person_id, at.x, at.y).await?.position)
    };
    self.enqueue(person_id, at, actor, action);
    Ok(position)
  }

  fn enqueue(
    &self,
    person_id: PersonId,
    at: Point,
    actor: Option<ActorId>,
    action: HistoryAction,
  ) {
    tracing::debug!(person = %person_id, action = action.as_str(), "position committed");

    let entry = NewHistoryEntry {
      person_id,
      x: at.x,
      y: at.y,
      action,
      updated_by: actor,
    };
    if self.jobs.send(Job::Record(entry)).is_err() {
      tracing::error!(person = %person_id, "history task stopped, entry dropped");
    }
  }

  /// Wait until every history entry queued so far has been handled.
  pub async fn flush(&self) {
    let (done, wait) = oneshot::channel();
    if self.jobs.send(Job::Flush(done)).is_ok() {
      let _ = wait.await;
    }
  }
}

// ─── History task ────────────────────────────────────────────────────────────

async fn run_history<S: RelationshipStore>(
  store: Arc<S>,
  policy: ActorPolicy,
  mut queue: mpsc::UnboundedReceiver<Job>,
) {
  while let Some(job) = queue.recv().await {
    match job {
      Job::Record(entry) => record(store.as_ref(), &policy, entry).await,
      Job::Flush(done) => {
        let _ = done.send(());
      }
    }
  }
  tracing::debug!("history task finished");
}

/// Substitute an administrator for a synthetic actor. Falls back to an
/// anonymous entry when none can be found.
async fn resolve_actor<S: RelationshipStore>(
  store: &S,
  policy: &ActorPolicy,
  actor: Option<ActorId>,
) -> Option<ActorId> {
  let actor = actor?;
  if !policy.is_synthetic(&actor) {
    return Some(actor);
  }
  match store.find_one_administrator().await {
    Ok(Some(admin)) => Some(admin),
    Ok(None) => {
      tracing::warn!(%actor, "no administrator found for synthetic actor, recording anonymously");
      None
    }
    Err(e) => {
      tracing::warn!(%actor, error = %e, "administrator lookup failed, recording anonymously");
      None
    }
  }
}

async fn record<S: RelationshipStore>(
  store: &S,
  policy: &ActorPolicy,
  mut entry: NewHistoryEntry,
) {
  entry.updated_by = resolve_actor(store, policy, entry.updated_by.take()).await;
  let person_id = entry.person_id;

  let err = match store.append_history(entry.clone()).await {
    Ok(_) => return,
    Err(e) => e,
  };

  match entry.action.fallback() {
    Some(generic) if err.is_constraint_violation() => {
      tracing::warn!(
        person = %person_id,
        rejected = entry.action.as_str(),
        retry = generic.as_str(),
        "history label rejected, retrying with generic label"
      );
      let retry = NewHistoryEntry { action: generic, ..entry };
      if let Err(e) = store.append_history(retry).await {
        tracing::error!(person = %person_id, error = %e, "history entry dropped");
      }
    }
    _ => {
      tracing::error!(person = %person_id, error = %err, "history entry dropped");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{
    person::Person,
    position::{PositionHistoryEntry, PositionWrite},
    store::StoreError,
  };

  #[derive(Debug, thiserror::Error)]
  enum MemoryError {
    #[error("constraint violation")]
    Constraint,
    #[error("store unavailable")]
    Unavailable,
  }

  impl StoreError for MemoryError {
    fn is_constraint_violation(&self) -> bool {
      matches!(self, Self::Constraint)
    }
  }

  /// In-memory store whose history table only knows the generic labels.
  #[derive(Default)]
  struct MemoryStore {
    positions:      Mutex<Vec<Position>>,
    history:        Mutex<Vec<PositionHistoryEntry>>,
    administrator:  Option<ActorId>,
    history_down:   bool,
    positions_down: bool,
  }

  impl RelationshipStore for MemoryStore {
    type Error = MemoryError;

    async fn list_persons(&self) -> Result<Vec<Person>, MemoryError> { Ok(vec![]) }
    async fn get_person(&self, _: PersonId) -> Result<Option<Person>, MemoryError> { Ok(None) }
    async fn put_person(&self, _: Person) -> Result<(), MemoryError> { Ok(()) }
    async fn delete_person(&self, _: PersonId) -> Result<bool, MemoryError> { Ok(false) }

    async fn get_position(&self, id: PersonId) -> Result<Option<Position>, MemoryError> {
      Ok(self.positions.lock().unwrap().iter().find(|p| p.person_id == id).cloned())
    }

    async fn list_positions(&self) -> Result<Vec<Position>, MemoryError> {
      Ok(self.positions.lock().unwrap().clone())
    }

    async fn upsert_position(&self, person_id: PersonId, x: f64, y: f64) -> Result<PositionWrite, MemoryError> {
      if self.positions_down {
        return Err(MemoryError::Unavailable);
      }
      let position = Position { person_id, x, y, updated_at: Utc::now() };
      let mut rows = self.positions.lock().unwrap();
      let before = rows.len();
      rows.retain(|p| p.person_id != person_id);
      let created = rows.len() == before;
      rows.push(position.clone());
      Ok(PositionWrite { position, created })
    }

    async fn delete_position(&self, id: PersonId) -> Result<bool, MemoryError> {
      let mut rows = self.positions.lock().unwrap();
      let before = rows.len();
      rows.retain(|p| p.person_id != id);
      Ok(rows.len() != before)
    }

    async fn append_history(&self, entry: NewHistoryEntry) -> Result<PositionHistoryEntry, MemoryError> {
      if self.history_down {
        return Err(MemoryError::Unavailable);
      }
      if entry.action == HistoryAction::PersonDeleted {
        return Err(MemoryError::Constraint);
      }
      let row = PositionHistoryEntry {
        id:         Uuid::new_v4(),
        person_id:  entry.person_id,
        x:          entry.x,
        y:          entry.y,
        action:     entry.action,
        updated_at: Utc::now(),
        updated_by: entry.updated_by,
      };
      self.history.lock().unwrap().push(row.clone());
      Ok(row)
    }

    async fn list_history(&self, id: PersonId) -> Result<Vec<PositionHistoryEntry>, MemoryError> {
      Ok(self.history.lock().unwrap().iter().filter(|h| h.person_id == id).cloned().collect())
    }

    async fn find_one_administrator(&self) -> Result<Option<ActorId>, MemoryError> {
      Ok(self.administrator.clone())
    }
  }

  fn recorder(store: MemoryStore) -> (PositionRecorder<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let policy = ActorPolicy::new(["test-user"]);
    let (recorder, _worker) = PositionRecorder::spawn(Arc::clone(&store), policy);
    (recorder, store)
  }

  fn pid() -> PersonId { Uuid::from_u128(42) }

  #[tokio::test]
  async fn commit_writes_position_and_history() {
    let (rec, store) = recorder(MemoryStore::default());
    let pos = rec
      .commit(pid(), Point::new(10.0, 20.0), Some("alice".into()), HistoryAction::Updated)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(pos.point(), Point::new(10.0, 20.0));

    rec.flush().await;
    let history = store.list_history(pid()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, HistoryAction::Updated);
    assert_eq!(history[0].updated_by, Some(ActorId::from("alice")));
  }

  #[tokio::test]
  async fn moves_are_labelled_by_the_store_write() {
    let (rec, store) = recorder(MemoryStore::default());
    for x in [1.0, 2.0] {
      rec.commit_move(pid(), Point::new(x, 0.0), None).await.unwrap();
    }
    rec.flush().await;
    let actions: Vec<_> =
      store.list_history(pid()).await.unwrap().into_iter().map(|h| h.action).collect();
    assert_eq!(actions, vec![HistoryAction::Created, HistoryAction::Updated]);
  }

  #[tokio::test]
  async fn failed_move_queues_nothing() {
    let (rec, store) = recorder(MemoryStore { positions_down: true, ..MemoryStore::default() });
    let result = rec.commit_move(pid(), Point::new(1.0, 1.0), None).await;
    assert!(matches!(result, Err(MemoryError::Unavailable)));
    rec.flush().await;
    assert!(store.list_history(pid()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn synthetic_actor_without_administrator_is_anonymous() {
    let (rec, store) = recorder(MemoryStore::default());
    rec
      .commit(pid(), Point::new(1.0, 1.0), Some("test-user".into()), HistoryAction::Created)
      .await
      .unwrap();
    rec.flush().await;
    let history = store.list_history(pid()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].updated_by, None);
  }

  #[tokio::test]
  async fn synthetic_actor_replaced_by_administrator() {
    let (rec, store) = recorder(MemoryStore {
      administrator: Some("admin-1".into()),
      ..MemoryStore::default()
    });
    rec
      .commit(pid(), Point::new(1.0, 1.0), Some("test-user".into()), HistoryAction::Updated)
      .await
      .unwrap();
    rec.flush().await;
    let history = store.list_history(pid()).await.unwrap();
    assert_eq!(history[0].updated_by, Some(ActorId::from("admin-1")));
  }

  #[tokio::test]
  async fn rejected_person_deleted_label_falls_back() {
    let (rec, store) = recorder(MemoryStore::default());
    rec.commit(pid(), Point::new(5.0, 5.0), None, HistoryAction::Created).await.unwrap();
    let removed = rec
      .commit(pid(), Point::new(5.0, 5.0), None, HistoryAction::PersonDeleted)
      .await
      .unwrap();
    assert!(removed.is_none());
    assert!(store.get_position(pid()).await.unwrap().is_none());

    rec.flush().await;
    let actions: Vec<_> = store
      .list_history(pid())
      .await
      .unwrap()
      .into_iter()
      .map(|h| h.action)
      .collect();
    assert_eq!(actions, vec![HistoryAction::Created, HistoryAction::Deleted]);
  }

  #[tokio::test]
  async fn history_failure_does_not_fail_commit() {
    let (rec, store) = recorder(MemoryStore { history_down: true, ..MemoryStore::default() });
    let result = rec
      .commit(pid(), Point::new(3.0, 4.0), None, HistoryAction::Updated)
      .await;
    assert!(result.is_ok());
    rec.flush().await;
    assert!(store.list_history(pid()).await.unwrap().is_empty());
    assert!(store.get_position(pid()).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn position_failure_is_propagated_without_history() {
    let (rec, store) = recorder(MemoryStore { positions_down: true, ..MemoryStore::default() });
    let result = rec
      .commit(pid(), Point::new(3.0, 4.0), None, HistoryAction::Updated)
      .await;
    assert!(matches!(result, Err(MemoryError::Unavailable)));
    rec.flush().await;
    assert!(store.list_history(pid()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn history_keeps_commit_order() {
    let (rec, store) = recorder(MemoryStore::default());
    for x in [1.0, 2.0, 3.0] {
      rec.commit(pid(), Point::new(x, 0.0), None, HistoryAction::Updated).await.unwrap();
    }
    rec.flush().await;
    let xs: Vec<f64> =
      store.list_history(pid()).await.unwrap().iter().map(|h| h.x).collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    assert_eq!(store.get_position(pid()).await.unwrap().unwrap().x, 3.0);
  }
}
