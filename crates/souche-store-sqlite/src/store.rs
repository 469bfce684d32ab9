//! [`SqliteStore`] — the SQLite implementation of [`RelationshipStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use souche_core::{
  person::{Person, PersonId},
  position::{ActorId, NewHistoryEntry, Position, PositionHistoryEntry, PositionWrite},
  store::{RelationshipStore, Role},
};

use crate::{
  encode::{
    PERSON_COLUMNS, RawHistoryEntry, RawPerson, RawPosition, encode_date,
    encode_dt, encode_genre, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A relationship store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register an identity; replaces the role of an existing one.
  pub async fn add_identity(&self, actor: ActorId, role: Role) -> Result<()> {
    let role_str = role.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (actor_id, role) VALUES (?1, ?2)
           ON CONFLICT(actor_id) DO UPDATE SET role = excluded.role",
          rusqlite::params![actor.0, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RelationshipStore impl ──────────────────────────────────────────────────

impl RelationshipStore for SqliteStore {
  type Error = crate::Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"),
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn put_person(&self, person: Person) -> Result<()> {
    let id_str    = encode_uuid(person.id);
    let genre_str = encode_genre(person.genre);
    let pere_str  = person.pere.map(encode_uuid);
    let mere_str  = person.mere.map(encode_uuid);
    let naissance = person.date_naissance.map(encode_date);
    let deces     = person.date_deces.map(encode_date);

    // Upsert in place: replacing the row would cascade to its position.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO persons (
             person_id, nom, prenom, genre, pere, mere,
             ordre_naissance, date_naissance, date_deces, image
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(person_id) DO UPDATE SET
             nom = excluded.nom,
             prenom = excluded.prenom,
             genre = excluded.genre,
             pere = excluded.pere,
             mere = excluded.mere,
             ordre_naissance = excluded.ordre_naissance,
             date_naissance = excluded.date_naissance,
             date_deces = excluded.date_deces,
             image = excluded.image",
          rusqlite::params![
            id_str,
            person.nom,
            person.prenom,
            genre_str,
            pere_str,
            mere_str,
            person.ordre_naissance,
            naissance,
            deces,
            person.image,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_person(&self, id: PersonId) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM persons WHERE person_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Positions ─────────────────────────────────────────────────────────────

  async fn get_position(&self, person_id: PersonId) -> Result<Option<Position>> {
    let id_str = encode_uuid(person_id);

    let raw: Option<RawPosition> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT person_id, x, y, updated_at FROM positions WHERE person_id = ?1",
              rusqlite::params![id_str],
              RawPosition::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPosition::into_position).transpose()
  }

  async fn list_positions(&self) -> Result<Vec<Position>> {
    let raws: Vec<RawPosition> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT person_id, x, y, updated_at FROM positions")?;
        let rows = stmt
          .query_map([], RawPosition::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPosition::into_position).collect()
  }

  async fn upsert_position(
    &self,
    person_id: PersonId,
    x: f64,
    y: f64,
  ) -> Result<PositionWrite> {
    let position = Position { person_id, x, y, updated_at: Utc::now() };

    let id_str = encode_uuid(person_id);
    let at_str = encode_dt(position.updated_at);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existed: bool = tx.query_row(
          "SELECT EXISTS(SELECT 1 FROM positions WHERE person_id = ?1)",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        tx.execute(
          "INSERT INTO positions (person_id, x, y, updated_at) VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(person_id) DO UPDATE SET
             x = excluded.x, y = excluded.y, updated_at = excluded.updated_at",
          rusqlite::params![id_str, x, y, at_str],
        )?;
        tx.commit()?;
        Ok(!existed)
      })
      .await?;

    Ok(PositionWrite { position, created })
  }

  async fn delete_position(&self, person_id: PersonId) -> Result<bool> {
    let id_str = encode_uuid(person_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM positions WHERE person_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn append_history(&self, entry: NewHistoryEntry) -> Result<PositionHistoryEntry> {
    let row = PositionHistoryEntry {
      id:         Uuid::new_v4(),
      person_id:  entry.person_id,
      x:          entry.x,
      y:          entry.y,
      action:     entry.action,
      updated_at: Utc::now(),
      updated_by: entry.updated_by,
    };

    let id_str     = encode_uuid(row.id);
    let person_str = encode_uuid(row.person_id);
    let action_str = row.action.as_str();
    let at_str     = encode_dt(row.updated_at);
    let by_str     = row.updated_by.as_ref().map(|a| a.0.clone());
    let (x, y)     = (row.x, row.y);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO position_history (
             entry_id, person_id, x, y, action, updated_at, updated_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, person_str, x, y, action_str, at_str, by_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::trace!(person = %row.person_id, action = action_str, "history appended");
    Ok(row)
  }

  async fn list_history(&self, person_id: PersonId) -> Result<Vec<PositionHistoryEntry>> {
    let id_str = encode_uuid(person_id);

    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, person_id, x, y, action, updated_at, updated_by
           FROM position_history
           WHERE person_id = ?1
           ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawHistoryEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }

  // ── Identities ────────────────────────────────────────────────────────────

  async fn find_one_administrator(&self) -> Result<Option<ActorId>> {
    let role_str = Role::Administrator.as_str();
    let actor: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT actor_id FROM identities WHERE role = ?1 ORDER BY actor_id LIMIT 1",
              rusqlite::params![role_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(actor.map(ActorId))
  }
}
