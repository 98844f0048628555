//! SQL schema for the MNCH SQLite store.
//!
//! The administrative application owns these tables; the DDL here lets the
//! engine run against a fresh file or an in-memory database.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS counties (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subcounties (
    id         INTEGER PRIMARY KEY,
    county_id  INTEGER NOT NULL REFERENCES counties(id),
    name       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS facility_types (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS facilities (
    id                INTEGER PRIMARY KEY,
    name              TEXT NOT NULL,
    mfl_code          TEXT,
    subcounty_id      INTEGER NOT NULL REFERENCES subcounties(id),
    facility_type_id  INTEGER NOT NULL REFERENCES facility_types(id),
    lat               REAL,
    lng               REAL
);

CREATE TABLE IF NOT EXISTS departments (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cadres (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY,
    first_name     TEXT NOT NULL,
    last_name      TEXT NOT NULL,
    phone          TEXT,
    facility_id    INTEGER NOT NULL REFERENCES facilities(id),
    department_id  INTEGER REFERENCES departments(id),
    cadre_id       INTEGER REFERENCES cadres(id)
);

CREATE TABLE IF NOT EXISTS trainings (
    id           INTEGER PRIMARY KEY,
    title        TEXT NOT NULL,
    type         TEXT NOT NULL,   -- 'global_training' | 'facility_mentorship'
    facility_id  INTEGER REFERENCES facilities(id),
    start_date   TEXT NOT NULL,   -- ISO 8601 date
    end_date     TEXT,
    status       TEXT NOT NULL    -- 'planned' | 'ongoing' | 'completed' | 'cancelled'
);

CREATE TABLE IF NOT EXISTS training_participants (
    id                 INTEGER PRIMARY KEY,
    training_id        INTEGER NOT NULL REFERENCES trainings(id),
    user_id            INTEGER NOT NULL REFERENCES users(id),
    completion_status  TEXT NOT NULL,
    registration_date  TEXT,
    completion_date    TEXT,
    outcome            TEXT          -- 'pass' | 'fail' | NULL
);

CREATE TABLE IF NOT EXISTS participant_status_logs (
    id              INTEGER PRIMARY KEY,
    participant_id  INTEGER NOT NULL REFERENCES training_participants(id),
    status          TEXT NOT NULL,
    notes           TEXT,
    changed_at      TEXT NOT NULL  -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS participant_assessments (
    id              INTEGER PRIMARY KEY,
    participant_id  INTEGER NOT NULL REFERENCES training_participants(id),
    category        TEXT NOT NULL,
    score           REAL NOT NULL,
    outcome         TEXT NOT NULL,
    assessed_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS facilities_subcounty_idx ON facilities(subcounty_id);
CREATE INDEX IF NOT EXISTS facilities_type_idx      ON facilities(facility_type_id);
CREATE INDEX IF NOT EXISTS users_facility_idx       ON users(facility_id);
CREATE INDEX IF NOT EXISTS trainings_type_idx       ON trainings(type, start_date);
CREATE INDEX IF NOT EXISTS participants_training_idx ON training_participants(training_id);
CREATE INDEX IF NOT EXISTS participants_user_idx    ON training_participants(user_id);

PRAGMA user_version = 1;
";
