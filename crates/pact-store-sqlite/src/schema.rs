//! SQL schema for the Pact SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

-- Read-only mirror of marketplace profiles.
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    name    TEXT NOT NULL,
    email   TEXT NOT NULL
);

-- Read-only mirror of marketplace listings.
CREATE TABLE IF NOT EXISTS listings (
    listing_id  TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,      -- 'stay' | 'job'
    title       TEXT NOT NULL,
    location    TEXT NOT NULL,
    price       REAL NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    user_id     TEXT NOT NULL
);

-- One row per agreement. Clauses and signatures are ordered JSON arrays.
CREATE TABLE IF NOT EXISTS agreements (
    agreement_id TEXT PRIMARY KEY,
    listing_id   TEXT NOT NULL,
    host_id      TEXT NOT NULL,
    guest_id     TEXT NOT NULL,
    preamble     TEXT NOT NULL,
    clauses      TEXT NOT NULL DEFAULT '[]',
    start_date   TEXT,               -- YYYY-MM-DD
    end_date     TEXT,               -- YYYY-MM-DD
    status       TEXT NOT NULL,
    signatures   TEXT NOT NULL DEFAULT '[]',
    hash         TEXT,               -- NULL until sealed
    finalized_at TEXT,               -- NULL until sealed
    country_code TEXT NOT NULL,
    created_at   TEXT NOT NULL,      -- RFC 3339 UTC, fixed microsecond width
    updated_at   TEXT NOT NULL,
    CHECK (host_id != guest_id),
    CHECK (end_date IS NULL OR start_date IS NULL OR end_date >= start_date),
    CHECK ((hash IS NULL) = (finalized_at IS NULL)),
    CHECK (status IN ('DRAFT', 'PENDING_HOST', 'PENDING_GUEST', 'FULLY_SIGNED',
                      'ACTIVE', 'COMPLETED', 'CANCELLED', 'DISPUTED'))
);

-- Once sealed, only status and updated_at may change.
CREATE TRIGGER IF NOT EXISTS agreements_sealed_content
BEFORE UPDATE OF preamble, clauses, start_date, end_date, signatures, hash,
                 finalized_at, host_id, guest_id
ON agreements
WHEN OLD.hash IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'sealed agreement content is immutable');
END;

CREATE INDEX IF NOT EXISTS agreements_host_idx    ON agreements(host_id);
CREATE INDEX IF NOT EXISTS agreements_guest_idx   ON agreements(guest_id);
CREATE INDEX IF NOT EXISTS agreements_status_idx  ON agreements(status);
CREATE INDEX IF NOT EXISTS agreements_updated_idx ON agreements(updated_at);

PRAGMA user_version = 1;
";
