//! Versioned SQLite schema for the performance store.

use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

pub(super) const SCHEMA_VERSION: i64 = 2;

/// Errors raised while creating or checking the performance schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A DDL statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step that failed.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was created by an incompatible version.
    #[error(
        "expected performance schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}

/// Create the outcome and audit tables if they are missing and verify the
/// recorded schema version.
pub(super) fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create route_performances",
        "CREATE TABLE IF NOT EXISTS route_performances (
            id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
            route_id TEXT NOT NULL,
            planned_time_minutes REAL NOT NULL,
            planned_distance_km REAL NOT NULL,
            planned_reliability REAL NOT NULL,
            planned_time_variance REAL NOT NULL DEFAULT 0,
            planned_distance_variance REAL NOT NULL DEFAULT 0,
            planned_measurement_count INTEGER NOT NULL DEFAULT 0,
            actual_time_minutes REAL NOT NULL,
            actual_distance_km REAL NOT NULL,
            time_deviation_minutes REAL NOT NULL,
            distance_deviation_km REAL NOT NULL,
            weight_time REAL NOT NULL,
            weight_distance REAL NOT NULL,
            weight_reliability REAL NOT NULL,
            timestamp_ns INTEGER NOT NULL,
            completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
            created_at_ns INTEGER NOT NULL
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create weight_adjustments",
        "CREATE TABLE IF NOT EXISTS weight_adjustments (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            previous_time REAL NOT NULL,
            previous_distance REAL NOT NULL,
            previous_reliability REAL NOT NULL,
            proposed_time REAL NOT NULL,
            proposed_distance REAL NOT NULL,
            proposed_reliability REAL NOT NULL,
            applied_time REAL NOT NULL,
            applied_distance REAL NOT NULL,
            applied_reliability REAL NOT NULL,
            justification TEXT NOT NULL,
            confidence REAL NOT NULL,
            routes_analyzed INTEGER NOT NULL,
            timestamp_ns INTEGER NOT NULL
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "index route_performances timestamp",
        "CREATE INDEX IF NOT EXISTS idx_route_performances_timestamp
            ON route_performances(timestamp_ns)",
    )?;
    run_migration_step(
        transaction,
        "index route_performances completed",
        "CREATE INDEX IF NOT EXISTS idx_route_performances_completed
            ON route_performances(completed, created_at_ns)",
    )?;
    run_migration_step(
        transaction,
        "index route_performances created_at",
        "CREATE INDEX IF NOT EXISTS idx_route_performances_created_at
            ON route_performances(created_at_ns)",
    )?;
    run_migration_step(
        transaction,
        "index weight_adjustments timestamp",
        "CREATE INDEX IF NOT EXISTS idx_weight_adjustments_timestamp
            ON weight_adjustments(timestamp_ns)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS carpool_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM carpool_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO carpool_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn initialising_twice_is_harmless() {
        let mut conn = Connection::open_in_memory().expect("open in-memory database");
        initialise_schema(&mut conn).expect("first initialisation");
        initialise_schema(&mut conn).expect("second initialisation");
        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM carpool_schema_version", [], |row| row.get(0))
            .expect("count versions");
        assert_eq!(versions, 1);
    }

    #[rstest]
    fn newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().expect("open in-memory database");
        initialise_schema(&mut conn).expect("initialise");
        conn.execute("UPDATE carpool_schema_version SET version = 7", [])
            .expect("bump version");
        let err = initialise_schema(&mut conn).expect_err("version mismatch");
        assert!(matches!(
            err,
            SchemaError::VersionMismatch { expected: 2, found: 7 }
        ));
    }
}
