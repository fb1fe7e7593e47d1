// crates/cpl-attainment-store-sqlite/src/schema.rs
// ============================================================================
// Module: SQLite Gateway Schema
// Description: Versioned table layout for catalog and result records.
// Purpose: Create the schema on first open and reject unknown versions.
// Dependencies: rusqlite, tracing
// ============================================================================

//! ## Overview
//! Decimal columns are canonical decimal TEXT so values round-trip exactly.
//! Timestamps are JSON text of the tagged timestamp model. Every result table
//! has a primary key equal to its record key, which makes each upsert a single
//! `INSERT ... ON CONFLICT DO UPDATE` statement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use tracing::debug;

use crate::gateway::SqliteGatewayError;
use crate::gateway::db_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the gateway.
pub const SCHEMA_VERSION: i64 = 1;

/// Catalog and result tables for [`SCHEMA_VERSION`].
const SCHEMA_DDL: &str = "
    CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL,
        credits INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS program_outcomes (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL,
        minimum_passing TEXT NOT NULL,
        active INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS outcomes (
        id INTEGER PRIMARY KEY,
        course_id INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sub_outcomes (
        id INTEGER PRIMARY KEY,
        outcome_id INTEGER NOT NULL,
        weight_percent TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS enrollments (
        id INTEGER PRIMARY KEY,
        student_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        status TEXT NOT NULL,
        term TEXT NOT NULL,
        registered_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments (student_id);
    CREATE TABLE IF NOT EXISTS instrument_mappings (
        sub_outcome_id INTEGER NOT NULL,
        instrument_id INTEGER NOT NULL,
        weight_percent TEXT NOT NULL,
        PRIMARY KEY (sub_outcome_id, instrument_id)
    );
    CREATE TABLE IF NOT EXISTS outcome_mappings (
        program_outcome_id INTEGER NOT NULL,
        outcome_id INTEGER NOT NULL,
        contribution_percent TEXT NOT NULL,
        PRIMARY KEY (program_outcome_id, outcome_id)
    );
    CREATE TABLE IF NOT EXISTS stage_mappings (
        program_outcome_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        stage TEXT NOT NULL,
        stage_weight TEXT,
        PRIMARY KEY (program_outcome_id, course_id)
    );
    CREATE TABLE IF NOT EXISTS instrument_scores (
        enrollment_id INTEGER NOT NULL,
        instrument_id INTEGER NOT NULL,
        score TEXT,
        PRIMARY KEY (enrollment_id, instrument_id)
    );
    CREATE TABLE IF NOT EXISTS sub_outcome_results (
        enrollment_id INTEGER NOT NULL,
        sub_outcome_id INTEGER NOT NULL,
        value TEXT NOT NULL,
        instrument_count INTEGER NOT NULL,
        status TEXT NOT NULL,
        computed_at TEXT NOT NULL,
        stale INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (enrollment_id, sub_outcome_id)
    );
    CREATE TABLE IF NOT EXISTS outcome_results (
        enrollment_id INTEGER NOT NULL,
        outcome_id INTEGER NOT NULL,
        value TEXT NOT NULL,
        status TEXT NOT NULL,
        computed_at TEXT NOT NULL,
        stale INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (enrollment_id, outcome_id)
    );
    CREATE TABLE IF NOT EXISTS course_contributions (
        enrollment_id INTEGER NOT NULL,
        program_outcome_id INTEGER NOT NULL,
        student_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        value TEXT NOT NULL,
        stage TEXT NOT NULL,
        stage_weight TEXT NOT NULL,
        credits INTEGER NOT NULL,
        term TEXT NOT NULL,
        computed_at TEXT NOT NULL,
        stale INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (enrollment_id, program_outcome_id)
    );
    CREATE INDEX IF NOT EXISTS idx_course_contributions_student
        ON course_contributions (student_id, program_outcome_id);
    CREATE TABLE IF NOT EXISTS program_outcome_results (
        student_id INTEGER NOT NULL,
        program_outcome_id INTEGER NOT NULL,
        value TEXT NOT NULL,
        course_count INTEGER NOT NULL,
        total_credits INTEGER NOT NULL,
        status TEXT NOT NULL,
        passing INTEGER NOT NULL,
        latest_term TEXT,
        computed_at TEXT NOT NULL,
        stale INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (student_id, program_outcome_id)
    );
";

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Initializes the schema or validates the existing version.
///
/// # Errors
///
/// Returns [`SqliteGatewayError::VersionMismatch`] when the database carries a
/// different schema version, or [`SqliteGatewayError::Db`] on engine errors.
pub fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteGatewayError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(SCHEMA_DDL).map_err(db_error)?;
            debug!(version = SCHEMA_VERSION, "attainment schema created");
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteGatewayError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
