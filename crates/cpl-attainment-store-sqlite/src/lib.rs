// crates/cpl-attainment-store-sqlite/src/lib.rs
// ============================================================================
// Module: CPL Attainment SQLite Gateway
// Description: Durable PersistenceGateway backend using SQLite.
// Purpose: Provide persistent catalog reads and result upserts.
// Dependencies: cpl-attainment-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`SqliteGateway`] implementing the
//! attainment engine's catalog and result interfaces. Decimal values are
//! stored as canonical text, every result table is keyed by its record key,
//! and a `store_meta` table pins the schema version.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod gateway;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gateway::SqliteGateway;
pub use gateway::SqliteGatewayConfig;
pub use gateway::SqliteGatewayError;
pub use gateway::SqliteJournalMode;
pub use gateway::SqliteSyncMode;
pub use schema::SCHEMA_VERSION;
