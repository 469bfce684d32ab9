//! SQL schema for the Souche SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id        TEXT NOT NULL UNIQUE,
    nom              TEXT NOT NULL,
    prenom           TEXT NOT NULL,
    genre            TEXT NOT NULL CHECK (genre IN ('homme', 'femme')),
    pere             TEXT,            -- person_id or NULL; not a foreign key,
    mere             TEXT,            -- dangling references are tolerated
    ordre_naissance  INTEGER NOT NULL DEFAULT 1 CHECK (ordre_naissance > 0),
    date_naissance   TEXT,            -- ISO 8601 date
    date_deces       TEXT,
    image            TEXT
);

-- One live row per person, overwritten on every drag commit.
CREATE TABLE IF NOT EXISTS positions (
    person_id   TEXT PRIMARY KEY REFERENCES persons(person_id) ON DELETE CASCADE,
    x           REAL NOT NULL,
    y           REAL NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Strictly append-only; survives deletion of the person.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS position_history (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id    TEXT NOT NULL UNIQUE,
    person_id   TEXT NOT NULL,
    x           REAL NOT NULL,
    y           REAL NOT NULL,
    action      TEXT NOT NULL CHECK (action IN ('created', 'updated', 'deleted')),
    updated_at  TEXT NOT NULL,
    updated_by  TEXT
);

CREATE TABLE IF NOT EXISTS identities (
    actor_id  TEXT PRIMARY KEY,
    role      TEXT NOT NULL   -- 'administrator' | 'member'
);

CREATE INDEX IF NOT EXISTS persons_pere_idx   ON persons(pere);
CREATE INDEX IF NOT EXISTS persons_mere_idx   ON persons(mere);
CREATE INDEX IF NOT EXISTS history_person_idx ON position_history(person_id);

PRAGMA user_version = 1;
";
