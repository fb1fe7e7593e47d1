// crates/cpl-attainment-store-sqlite/src/gateway.rs
// ============================================================================
// Module: SQLite Attainment Gateway
// Description: Durable PersistenceGateway backed by SQLite.
// Purpose: Persist catalog and result records with exact decimal values.
// Dependencies: cpl-attainment-core, bigdecimal, rusqlite, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteGateway`] implements [`CatalogReader`] and [`ResultStore`] over a
//! single mutex-guarded connection, so writes to any key are serialized. Rows
//! read back from the database are untrusted: malformed identifiers,
//! decimals, labels, or timestamps fail closed as corruption instead of being
//! coerced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use bigdecimal::BigDecimal;
use cpl_attainment_core::AchievementStatus;
use cpl_attainment_core::CatalogReader;
use cpl_attainment_core::ContributionRow;
use cpl_attainment_core::Course;
use cpl_attainment_core::CourseContribution;
use cpl_attainment_core::CourseId;
use cpl_attainment_core::Enrollment;
use cpl_attainment_core::EnrollmentId;
use cpl_attainment_core::EnrollmentStatus;
use cpl_attainment_core::InstrumentMapping;
use cpl_attainment_core::InstrumentScore;
use cpl_attainment_core::Outcome;
use cpl_attainment_core::OutcomeId;
use cpl_attainment_core::OutcomeMapping;
use cpl_attainment_core::OutcomeResult;
use cpl_attainment_core::ProgramOutcome;
use cpl_attainment_core::ProgramOutcomeId;
use cpl_attainment_core::ProgramOutcomeResult;
use cpl_attainment_core::ProgramOutcomeStatus;
use cpl_attainment_core::ResultKey;
use cpl_attainment_core::ResultStore;
use cpl_attainment_core::StageMapping;
use cpl_attainment_core::StageTag;
use cpl_attainment_core::StoreError;
use cpl_attainment_core::StudentId;
use cpl_attainment_core::SubOutcome;
use cpl_attainment_core::SubOutcomeId;
use cpl_attainment_core::SubOutcomeResult;
use cpl_attainment_core::Term;
use cpl_attainment_core::Timestamp;
use cpl_attainment_core::WeightedScore;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::ToSql;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::schema::SCHEMA_VERSION;
use crate::schema::initialize_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Column list shared by every course contribution read.
const CONTRIBUTION_COLUMNS: &str = "c.enrollment_id, c.program_outcome_id, c.student_id, \
                                    c.course_id, c.value, c.stage, c.stage_weight, c.credits, \
                                    c.term, c.computed_at, c.stale";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteGatewayConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteGatewayConfig {
    /// Builds a configuration for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` gateway errors.
#[derive(Debug, Error)]
pub enum SqliteGatewayError {
    /// Gateway I/O error.
    #[error("sqlite gateway io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite gateway db error: {0}")]
    Db(String),
    /// Stored row failed to decode.
    #[error("sqlite gateway corruption: {0}")]
    Corrupt(String),
    /// Schema version mismatch.
    #[error("sqlite gateway version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid input or configuration.
    #[error("sqlite gateway invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteGatewayError> for StoreError {
    fn from(error: SqliteGatewayError) -> Self {
        match error {
            SqliteGatewayError::Io(message) => Self::Io(message),
            SqliteGatewayError::Db(message) => Self::Store(message),
            SqliteGatewayError::Corrupt(message) => Self::Corrupt(message),
            SqliteGatewayError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteGatewayError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error into [`SqliteGatewayError::Db`].
pub(crate) fn db_error(error: rusqlite::Error) -> SqliteGatewayError {
    SqliteGatewayError::Db(error.to_string())
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// `SQLite`-backed persistence gateway.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    /// Gateway configuration.
    config: SqliteGatewayConfig,
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Opens (and on first use creates) an `SQLite` gateway.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the path is unsafe or the database
    /// cannot be opened or initialized.
    pub fn open(config: SqliteGatewayConfig) -> Result<Self, SqliteGatewayError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        info!(
            path = %config.path.display(),
            schema_version = SCHEMA_VERSION,
            journal_mode = config.journal_mode.pragma_value(),
            "attainment sqlite gateway opened"
        );
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the gateway configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteGatewayConfig {
        &self.config
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteGatewayError> {
        self.connection.lock().map_err(|_| SqliteGatewayError::Db("mutex poisoned".to_string()))
    }

    /// Executes one statement and returns the number of changed rows.
    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize, SqliteGatewayError> {
        self.lock()?.execute(sql, params).map_err(db_error)
    }

    /// Runs a query and maps every row with `map`.
    fn query_rows<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        map: F,
    ) -> Result<Vec<T>, SqliteGatewayError>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let guard = self.lock()?;
        let mut statement = guard.prepare(sql).map_err(db_error)?;
        let rows = statement.query_map(params, map).map_err(db_error)?;
        let collected = rows.collect::<Result<Vec<T>, _>>().map_err(db_error)?;
        Ok(collected)
    }

    /// Runs a query expected to return at most one row.
    fn query_optional<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        map: F,
    ) -> Result<Option<T>, SqliteGatewayError>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.lock()?.query_row(sql, params, map).optional().map_err(db_error)
    }

    /// Runs a query over `(value, weight)` decimal text pairs.
    fn weighted_scores(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<WeightedScore>, SqliteGatewayError> {
        self.query_rows(sql, params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .into_iter()
            .map(|(value, weight)| -> Result<WeightedScore, SqliteGatewayError> {
                Ok(WeightedScore::new(
                    decode_decimal(&value, "value")?,
                    decode_decimal(&weight, "weight")?,
                ))
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Catalog Writes
// ============================================================================

impl SqliteGateway {
    /// Inserts or replaces a course.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_course(&self, course: &Course) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO courses (id, code, credits) VALUES (?1, ?2, ?3)",
            params![encode_id(course.id.get())?, course.code, course.credits],
        )?;
        Ok(())
    }

    /// Inserts or replaces a program outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_program_outcome(
        &self,
        program_outcome: &ProgramOutcome,
    ) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO program_outcomes (id, code, minimum_passing, active) VALUES \
             (?1, ?2, ?3, ?4)",
            params![
                encode_id(program_outcome.id.get())?,
                program_outcome.code,
                program_outcome.minimum_passing.to_string(),
                program_outcome.active
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces a course-level outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_outcome(&self, outcome: &Outcome) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO outcomes (id, course_id) VALUES (?1, ?2)",
            params![encode_id(outcome.id.get())?, encode_id(outcome.course_id.get())?],
        )?;
        Ok(())
    }

    /// Inserts or replaces a sub-outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_sub_outcome(&self, sub_outcome: &SubOutcome) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO sub_outcomes (id, outcome_id, weight_percent) VALUES (?1, ?2, \
             ?3)",
            params![
                encode_id(sub_outcome.id.get())?,
                encode_id(sub_outcome.outcome_id.get())?,
                sub_outcome.weight_percent.to_string()
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces an enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO enrollments (id, student_id, course_id, status, term, \
             registered_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                encode_id(enrollment.id.get())?,
                encode_id(enrollment.student_id.get())?,
                encode_id(enrollment.course_id.get())?,
                enrollment.status.as_str(),
                enrollment.term.as_str(),
                encode_timestamp(&enrollment.registered_at)?
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces an instrument mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_instrument_mapping(
        &self,
        mapping: &InstrumentMapping,
    ) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO instrument_mappings (sub_outcome_id, instrument_id, \
             weight_percent) VALUES (?1, ?2, ?3)",
            params![
                encode_id(mapping.sub_outcome_id.get())?,
                encode_id(mapping.instrument_id.get())?,
                mapping.weight_percent.to_string()
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces an outcome to program outcome mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_outcome_mapping(&self, mapping: &OutcomeMapping) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO outcome_mappings (program_outcome_id, outcome_id, \
             contribution_percent) VALUES (?1, ?2, ?3)",
            params![
                encode_id(mapping.program_outcome_id.get())?,
                encode_id(mapping.outcome_id.get())?,
                mapping.contribution_percent.to_string()
            ],
        )?;
        Ok(())
    }

    /// Inserts or replaces a course stage mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn insert_stage_mapping(&self, mapping: &StageMapping) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT OR REPLACE INTO stage_mappings (program_outcome_id, course_id, stage, \
             stage_weight) VALUES (?1, ?2, ?3, ?4)",
            params![
                encode_id(mapping.program_outcome_id.get())?,
                encode_id(mapping.course_id.get())?,
                mapping.stage.as_str(),
                mapping.stage_weight.as_ref().map(ToString::to_string)
            ],
        )?;
        Ok(())
    }

    /// Records (or clears, with `score: None`) an instrument score.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the write fails.
    pub fn record_score(&self, score: &InstrumentScore) -> Result<(), SqliteGatewayError> {
        self.execute(
            "INSERT INTO instrument_scores (enrollment_id, instrument_id, score) VALUES (?1, ?2, \
             ?3) ON CONFLICT(enrollment_id, instrument_id) DO UPDATE SET score = excluded.score",
            params![
                encode_id(score.enrollment_id.get())?,
                encode_id(score.instrument_id.get())?,
                score.score.as_ref().map(ToString::to_string)
            ],
        )?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Catalog Reader
// ============================================================================

impl CatalogReader for SqliteGateway {
    fn enrollment(&self, enrollment_id: EnrollmentId) -> Result<Option<Enrollment>, StoreError> {
        let raw = self.query_optional(
            "SELECT id, student_id, course_id, status, term, registered_at FROM enrollments \
             WHERE id = ?1",
            params![encode_id(enrollment_id.get())?],
            RawEnrollment::read,
        )?;
        Ok(raw.map(RawEnrollment::decode).transpose()?)
    }

    fn student_enrollments(&self, student_id: StudentId) -> Result<Vec<Enrollment>, StoreError> {
        let rows = self.query_rows(
            "SELECT id, student_id, course_id, status, term, registered_at FROM enrollments \
             WHERE student_id = ?1 ORDER BY id",
            params![encode_id(student_id.get())?],
            RawEnrollment::read,
        )?;
        Ok(rows.into_iter().map(RawEnrollment::decode).collect::<Result<Vec<_>, _>>()?)
    }

    fn course(&self, course_id: CourseId) -> Result<Option<Course>, StoreError> {
        let raw = self.query_optional(
            "SELECT code, credits FROM courses WHERE id = ?1",
            params![encode_id(course_id.get())?],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)),
        )?;
        Ok(raw.map(|(code, credits)| Course {
            id: course_id,
            code,
            credits,
        }))
    }

    fn program_outcome(
        &self,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<ProgramOutcome>, StoreError> {
        let raw = self.query_optional(
            "SELECT code, minimum_passing, active FROM program_outcomes WHERE id = ?1",
            params![encode_id(program_outcome_id.get())?],
            |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, bool>(2)?))
            },
        )?;
        let Some((code, minimum_passing, active)) = raw else {
            return Ok(None);
        };
        Ok(Some(ProgramOutcome {
            id: program_outcome_id,
            code,
            minimum_passing: decode_decimal(&minimum_passing, "minimum_passing")?,
            active,
        }))
    }

    fn active_program_outcomes(&self) -> Result<Vec<ProgramOutcomeId>, StoreError> {
        let ids = self.query_rows(
            "SELECT id FROM program_outcomes WHERE active != 0 ORDER BY id",
            params![],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(decode_ids(ids, ProgramOutcomeId::from_raw, "program_outcome_id")?)
    }

    fn course_sub_outcomes(&self, course_id: CourseId) -> Result<Vec<SubOutcomeId>, StoreError> {
        let ids = self.query_rows(
            "SELECT so.id FROM sub_outcomes so JOIN outcomes o ON o.id = so.outcome_id WHERE \
             o.course_id = ?1 ORDER BY so.id",
            params![encode_id(course_id.get())?],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(decode_ids(ids, SubOutcomeId::from_raw, "sub_outcome_id")?)
    }

    fn course_outcomes(&self, course_id: CourseId) -> Result<Vec<OutcomeId>, StoreError> {
        let ids = self.query_rows(
            "SELECT id FROM outcomes WHERE course_id = ?1 ORDER BY id",
            params![encode_id(course_id.get())?],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(decode_ids(ids, OutcomeId::from_raw, "outcome_id")?)
    }

    fn course_program_outcomes(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<ProgramOutcomeId>, StoreError> {
        let ids = self.query_rows(
            "SELECT program_outcome_id FROM stage_mappings WHERE course_id = ?1 UNION SELECT \
             om.program_outcome_id FROM outcome_mappings om JOIN outcomes o ON o.id = \
             om.outcome_id WHERE o.course_id = ?1 ORDER BY 1",
            params![encode_id(course_id.get())?],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(decode_ids(ids, ProgramOutcomeId::from_raw, "program_outcome_id")?)
    }

    fn stage_mapping(
        &self,
        program_outcome_id: ProgramOutcomeId,
        course_id: CourseId,
    ) -> Result<Option<StageMapping>, StoreError> {
        let raw = self.query_optional(
            "SELECT stage, stage_weight FROM stage_mappings WHERE program_outcome_id = ?1 AND \
             course_id = ?2",
            params![encode_id(program_outcome_id.get())?, encode_id(course_id.get())?],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
        )?;
        let Some((stage, stage_weight)) = raw else {
            return Ok(None);
        };
        Ok(Some(StageMapping {
            program_outcome_id,
            course_id,
            stage: decode_label::<StageTag>(&stage, "stage")?,
            stage_weight: stage_weight
                .map(|weight| decode_decimal(&weight, "stage_weight"))
                .transpose()?,
        }))
    }

    fn instrument_scores(
        &self,
        enrollment_id: EnrollmentId,
        sub_outcome_id: SubOutcomeId,
    ) -> Result<Vec<WeightedScore>, StoreError> {
        Ok(self.weighted_scores(
            "SELECT s.score, m.weight_percent FROM instrument_mappings m JOIN instrument_scores s \
             ON s.instrument_id = m.instrument_id AND s.enrollment_id = ?1 WHERE \
             m.sub_outcome_id = ?2 AND s.score IS NOT NULL ORDER BY m.instrument_id",
            params![encode_id(enrollment_id.get())?, encode_id(sub_outcome_id.get())?],
        )?)
    }
}

// ============================================================================
// SECTION: Result Store
// ============================================================================

impl ResultStore for SqliteGateway {
    fn sub_outcome_scores(
        &self,
        enrollment_id: EnrollmentId,
        outcome_id: OutcomeId,
    ) -> Result<Vec<WeightedScore>, StoreError> {
        Ok(self.weighted_scores(
            "SELECT r.value, so.weight_percent FROM sub_outcomes so JOIN sub_outcome_results r ON \
             r.sub_outcome_id = so.id AND r.enrollment_id = ?1 WHERE so.outcome_id = ?2 AND \
             r.stale = 0 ORDER BY so.id",
            params![encode_id(enrollment_id.get())?, encode_id(outcome_id.get())?],
        )?)
    }

    fn outcome_scores(
        &self,
        enrollment_id: EnrollmentId,
        program_outcome_id: ProgramOutcomeId,
        course_id: CourseId,
    ) -> Result<Vec<WeightedScore>, StoreError> {
        Ok(self.weighted_scores(
            "SELECT r.value, om.contribution_percent FROM outcome_mappings om JOIN outcomes o ON \
             o.id = om.outcome_id JOIN outcome_results r ON r.outcome_id = om.outcome_id AND \
             r.enrollment_id = ?1 WHERE om.program_outcome_id = ?2 AND o.course_id = ?3 AND \
             r.stale = 0 ORDER BY om.outcome_id",
            params![
                encode_id(enrollment_id.get())?,
                encode_id(program_outcome_id.get())?,
                encode_id(course_id.get())?
            ],
        )?)
    }

    fn course_contributions(
        &self,
        student_id: StudentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Vec<ContributionRow>, StoreError> {
        let sql = format!(
            "SELECT {CONTRIBUTION_COLUMNS}, e.status FROM course_contributions c JOIN enrollments \
             e ON e.id = c.enrollment_id WHERE c.student_id = ?1 AND c.program_outcome_id = ?2 \
             ORDER BY c.enrollment_id"
        );
        let rows = self.query_rows(
            &sql,
            params![encode_id(student_id.get())?, encode_id(program_outcome_id.get())?],
            |row| Ok((RawContribution::read(row)?, row.get::<_, String>(11)?)),
        )?;
        let mut decoded = Vec::with_capacity(rows.len());
        for (raw, status) in rows {
            decoded.push(ContributionRow {
                contribution: raw.decode()?,
                enrollment_status: EnrollmentStatus::from_label(&status),
            });
        }
        Ok(decoded)
    }

    fn sub_outcome_result(
        &self,
        enrollment_id: EnrollmentId,
        sub_outcome_id: SubOutcomeId,
    ) -> Result<Option<SubOutcomeResult>, StoreError> {
        let raw = self.query_optional(
            "SELECT value, instrument_count, status, computed_at, stale FROM sub_outcome_results \
             WHERE enrollment_id = ?1 AND sub_outcome_id = ?2",
            params![encode_id(enrollment_id.get())?, encode_id(sub_outcome_id.get())?],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, bool>(4)?,
                ))
            },
        )?;
        let Some((value, instrument_count, status, computed_at, stale)) = raw else {
            return Ok(None);
        };
        Ok(Some(SubOutcomeResult {
            enrollment_id,
            sub_outcome_id,
            value: decode_decimal(&value, "value")?,
            instrument_count,
            status: decode_label::<AchievementStatus>(&status, "status")?,
            computed_at: decode_timestamp(&computed_at)?,
            stale,
        }))
    }

    fn outcome_result(
        &self,
        enrollment_id: EnrollmentId,
        outcome_id: OutcomeId,
    ) -> Result<Option<OutcomeResult>, StoreError> {
        let raw = self.query_optional(
            "SELECT value, status, computed_at, stale FROM outcome_results WHERE enrollment_id = \
             ?1 AND outcome_id = ?2",
            params![encode_id(enrollment_id.get())?, encode_id(outcome_id.get())?],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            },
        )?;
        let Some((value, status, computed_at, stale)) = raw else {
            return Ok(None);
        };
        Ok(Some(OutcomeResult {
            enrollment_id,
            outcome_id,
            value: decode_decimal(&value, "value")?,
            status: decode_label::<AchievementStatus>(&status, "status")?,
            computed_at: decode_timestamp(&computed_at)?,
            stale,
        }))
    }

    fn course_contribution(
        &self,
        enrollment_id: EnrollmentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<CourseContribution>, StoreError> {
        let sql = format!(
            "SELECT {CONTRIBUTION_COLUMNS} FROM course_contributions c WHERE c.enrollment_id = ?1 \
             AND c.program_outcome_id = ?2"
        );
        let raw = self.query_optional(
            &sql,
            params![encode_id(enrollment_id.get())?, encode_id(program_outcome_id.get())?],
            RawContribution::read,
        )?;
        Ok(raw.map(RawContribution::decode).transpose()?)
    }

    fn program_outcome_result(
        &self,
        student_id: StudentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<ProgramOutcomeResult>, StoreError> {
        let raw = self.query_optional(
            "SELECT value, course_count, total_credits, status, passing, latest_term, \
             computed_at, stale FROM program_outcome_results WHERE student_id = ?1 AND \
             program_outcome_id = ?2",
            params![encode_id(student_id.get())?, encode_id(program_outcome_id.get())?],
            |row| {
                Ok((
                    (row.get::<_, String>(0)?, row.get::<_, u32>(1)?, row.get::<_, u32>(2)?),
                    (row.get::<_, String>(3)?, row.get::<_, bool>(4)?),
                    (
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, bool>(7)?,
                    ),
                ))
            },
        )?;
        let Some((
            (value, course_count, total_credits),
            (status, passing),
            (latest_term, computed_at, stale),
        )) = raw
        else {
            return Ok(None);
        };
        Ok(Some(ProgramOutcomeResult {
            student_id,
            program_outcome_id,
            value: decode_decimal(&value, "value")?,
            course_count,
            total_credits,
            status: decode_label::<ProgramOutcomeStatus>(&status, "status")?,
            passing,
            latest_term: latest_term.map(Term::new),
            computed_at: decode_timestamp(&computed_at)?,
            stale,
        }))
    }

    fn upsert_sub_outcome_result(&self, result: &SubOutcomeResult) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO sub_outcome_results (enrollment_id, sub_outcome_id, value, \
             instrument_count, status, computed_at, stale) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(enrollment_id, sub_outcome_id) DO UPDATE SET value = excluded.value, \
             instrument_count = excluded.instrument_count, status = excluded.status, \
             computed_at = excluded.computed_at, stale = excluded.stale",
            params![
                encode_id(result.enrollment_id.get())?,
                encode_id(result.sub_outcome_id.get())?,
                result.value.to_string(),
                result.instrument_count,
                result.status.as_str(),
                encode_timestamp(&result.computed_at)?,
                result.stale
            ],
        )?;
        Ok(())
    }

    fn upsert_outcome_result(&self, result: &OutcomeResult) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO outcome_results (enrollment_id, outcome_id, value, status, computed_at, \
             stale) VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT(enrollment_id, outcome_id) DO \
             UPDATE SET value = excluded.value, status = excluded.status, computed_at = \
             excluded.computed_at, stale = excluded.stale",
            params![
                encode_id(result.enrollment_id.get())?,
                encode_id(result.outcome_id.get())?,
                result.value.to_string(),
                result.status.as_str(),
                encode_timestamp(&result.computed_at)?,
                result.stale
            ],
        )?;
        Ok(())
    }

    fn upsert_course_contribution(&self, result: &CourseContribution) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO course_contributions (enrollment_id, program_outcome_id, student_id, \
             course_id, value, stage, stage_weight, credits, term, computed_at, stale) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) ON CONFLICT(enrollment_id, \
             program_outcome_id) DO UPDATE SET student_id = excluded.student_id, course_id = \
             excluded.course_id, value = excluded.value, stage = excluded.stage, stage_weight = \
             excluded.stage_weight, credits = excluded.credits, term = excluded.term, \
             computed_at = excluded.computed_at, stale = excluded.stale",
            params![
                encode_id(result.enrollment_id.get())?,
                encode_id(result.program_outcome_id.get())?,
                encode_id(result.student_id.get())?,
                encode_id(result.course_id.get())?,
                result.value.to_string(),
                result.stage.as_str(),
                result.stage_weight.to_string(),
                result.credits,
                result.term.as_str(),
                encode_timestamp(&result.computed_at)?,
                result.stale
            ],
        )?;
        Ok(())
    }

    fn upsert_program_outcome_result(
        &self,
        result: &ProgramOutcomeResult,
    ) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO program_outcome_results (student_id, program_outcome_id, value, \
             course_count, total_credits, status, passing, latest_term, computed_at, stale) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) ON CONFLICT(student_id, \
             program_outcome_id) DO UPDATE SET value = excluded.value, course_count = \
             excluded.course_count, total_credits = excluded.total_credits, status = \
             excluded.status, passing = excluded.passing, latest_term = excluded.latest_term, \
             computed_at = excluded.computed_at, stale = excluded.stale",
            params![
                encode_id(result.student_id.get())?,
                encode_id(result.program_outcome_id.get())?,
                result.value.to_string(),
                result.course_count,
                result.total_credits,
                result.status.as_str(),
                result.passing,
                result.latest_term.as_ref().map(Term::as_str),
                encode_timestamp(&result.computed_at)?,
                result.stale
            ],
        )?;
        Ok(())
    }

    fn mark_stale(&self, key: ResultKey) -> Result<bool, StoreError> {
        let (sql, left, right) = match key {
            ResultKey::SubOutcome {
                enrollment_id,
                sub_outcome_id,
            } => (
                "UPDATE sub_outcome_results SET stale = 1 WHERE enrollment_id = ?1 AND \
                 sub_outcome_id = ?2",
                enrollment_id.get(),
                sub_outcome_id.get(),
            ),
            ResultKey::Outcome {
                enrollment_id,
                outcome_id,
            } => (
                "UPDATE outcome_results SET stale = 1 WHERE enrollment_id = ?1 AND outcome_id = ?2",
                enrollment_id.get(),
                outcome_id.get(),
            ),
            ResultKey::CourseContribution {
                enrollment_id,
                program_outcome_id,
            } => (
                "UPDATE course_contributions SET stale = 1 WHERE enrollment_id = ?1 AND \
                 program_outcome_id = ?2",
                enrollment_id.get(),
                program_outcome_id.get(),
            ),
            ResultKey::ProgramOutcome {
                student_id,
                program_outcome_id,
            } => (
                "UPDATE program_outcome_results SET stale = 1 WHERE student_id = ?1 AND \
                 program_outcome_id = ?2",
                student_id.get(),
                program_outcome_id.get(),
            ),
        };
        let changed = self.execute(sql, params![encode_id(left)?, encode_id(right)?])?;
        Ok(changed > 0)
    }
}

// ============================================================================
// SECTION: Raw Rows
// ============================================================================

/// Undecoded enrollment row.
struct RawEnrollment {
    /// Enrollment identifier.
    id: i64,
    /// Student identifier.
    student_id: i64,
    /// Course identifier.
    course_id: i64,
    /// Status label.
    status: String,
    /// Term label.
    term: String,
    /// Registration timestamp JSON.
    registered_at: String,
}

impl RawEnrollment {
    /// Reads the enrollment columns in schema order.
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            student_id: row.get(1)?,
            course_id: row.get(2)?,
            status: row.get(3)?,
            term: row.get(4)?,
            registered_at: row.get(5)?,
        })
    }

    /// Decodes typed fields, failing closed on malformed values.
    fn decode(self) -> Result<Enrollment, SqliteGatewayError> {
        Ok(Enrollment {
            id: decode_id(self.id, EnrollmentId::from_raw, "enrollment_id")?,
            student_id: decode_id(self.student_id, StudentId::from_raw, "student_id")?,
            course_id: decode_id(self.course_id, CourseId::from_raw, "course_id")?,
            status: EnrollmentStatus::from_label(&self.status),
            term: Term::new(self.term),
            registered_at: decode_timestamp(&self.registered_at)?,
        })
    }
}

/// Undecoded course contribution row, in [`CONTRIBUTION_COLUMNS`] order.
struct RawContribution {
    /// Enrollment identifier.
    enrollment_id: i64,
    /// Program outcome identifier.
    program_outcome_id: i64,
    /// Student identifier.
    student_id: i64,
    /// Course identifier.
    course_id: i64,
    /// Decimal value text.
    value: String,
    /// Stage label.
    stage: String,
    /// Decimal stage weight text.
    stage_weight: String,
    /// Course credits.
    credits: u32,
    /// Term label.
    term: String,
    /// Computation timestamp JSON.
    computed_at: String,
    /// Stale flag.
    stale: bool,
}

impl RawContribution {
    /// Reads the contribution columns.
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            enrollment_id: row.get(0)?,
            program_outcome_id: row.get(1)?,
            student_id: row.get(2)?,
            course_id: row.get(3)?,
            value: row.get(4)?,
            stage: row.get(5)?,
            stage_weight: row.get(6)?,
            credits: row.get(7)?,
            term: row.get(8)?,
            computed_at: row.get(9)?,
            stale: row.get(10)?,
        })
    }

    /// Decodes typed fields, failing closed on malformed values.
    fn decode(self) -> Result<CourseContribution, SqliteGatewayError> {
        Ok(CourseContribution {
            enrollment_id: decode_id(self.enrollment_id, EnrollmentId::from_raw, "enrollment_id")?,
            program_outcome_id: decode_id(
                self.program_outcome_id,
                ProgramOutcomeId::from_raw,
                "program_outcome_id",
            )?,
            student_id: decode_id(self.student_id, StudentId::from_raw, "student_id")?,
            course_id: decode_id(self.course_id, CourseId::from_raw, "course_id")?,
            value: decode_decimal(&self.value, "value")?,
            stage: decode_label::<StageTag>(&self.stage, "stage")?,
            stage_weight: decode_decimal(&self.stage_weight, "stage_weight")?,
            credits: self.credits,
            term: Term::new(self.term),
            computed_at: decode_timestamp(&self.computed_at)?,
            stale: self.stale,
        })
    }
}

// ============================================================================
// SECTION: Codecs
// ============================================================================

/// Encodes an identifier as an `SQLite` integer.
fn encode_id(raw: u64) -> Result<i64, SqliteGatewayError> {
    i64::try_from(raw)
        .map_err(|_| SqliteGatewayError::Invalid(format!("identifier out of range: {raw}")))
}

/// Decodes an identifier column.
fn decode_id<T>(
    raw: i64,
    build: fn(u64) -> Option<T>,
    column: &str,
) -> Result<T, SqliteGatewayError> {
    u64::try_from(raw)
        .ok()
        .and_then(build)
        .ok_or_else(|| SqliteGatewayError::Corrupt(format!("invalid {column}: {raw}")))
}

/// Decodes a list of identifier columns.
fn decode_ids<T>(
    raw: Vec<i64>,
    build: fn(u64) -> Option<T>,
    column: &str,
) -> Result<Vec<T>, SqliteGatewayError> {
    raw.into_iter().map(|value| decode_id(value, build, column)).collect()
}

/// Decodes a canonical decimal text column.
fn decode_decimal(text: &str, column: &str) -> Result<BigDecimal, SqliteGatewayError> {
    BigDecimal::from_str(text)
        .map_err(|err| SqliteGatewayError::Corrupt(format!("invalid {column} '{text}': {err}")))
}

/// Decodes a stable label column.
fn decode_label<T>(text: &str, column: &str) -> Result<T, SqliteGatewayError>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse::<T>()
        .map_err(|err| SqliteGatewayError::Corrupt(format!("invalid {column}: {err}")))
}

/// Encodes a timestamp as JSON text.
fn encode_timestamp(timestamp: &Timestamp) -> Result<String, SqliteGatewayError> {
    serde_json::to_string(timestamp).map_err(|err| SqliteGatewayError::Invalid(err.to_string()))
}

/// Decodes a JSON timestamp column.
fn decode_timestamp(text: &str) -> Result<Timestamp, SqliteGatewayError> {
    serde_json::from_str(text)
        .map_err(|err| SqliteGatewayError::Corrupt(format!("invalid timestamp '{text}': {err}")))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteGatewayError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteGatewayError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteGatewayError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteGatewayError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteGatewayError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteGatewayError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteGatewayError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteGatewayConfig) -> Result<Connection, SqliteGatewayError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(connection)
}
