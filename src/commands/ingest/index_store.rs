use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::info;

use crate::util::ensure_directory;

use super::pipeline::ParsedListing;
use super::session::Session;

pub(super) const INDEX_SCHEMA_VERSION: &str = "0.1.0";

/// SQLite copy of the parsed listings, keyed by source file so reprocessing a
/// document replaces its rows.
pub(super) struct ContractorIndex {
    connection: Connection,
}

impl ContractorIndex {
    pub(super) fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub(super) fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Replaces every row previously indexed from `source_file`.
    pub(super) fn replace_listing(
        &mut self,
        source_file: &str,
        source_sha256: Option<&str>,
        listing: &ParsedListing,
    ) -> Result<usize> {
        let tx = self.connection.transaction()?;

        tx.execute(
            "DELETE FROM business_records WHERE source_file = ?1",
            params![source_file],
        )?;
        tx.execute(
            "DELETE FROM personnel_records WHERE source_file = ?1",
            params![source_file],
        )?;

        match listing {
            ParsedListing::Business(records) => {
                let mut statement = tx.prepare(
                    "
                    INSERT INTO business_records(
                      source_file, line_number, license_number, business_name, status,
                      address, city_state_zip, phone, bond_amount, classifications,
                      expire_date, raw_text
                    )
                    VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ",
                )?;
                for record in records {
                    statement.execute(params![
                        source_file,
                        record.line_number as i64,
                        &record.license_number,
                        &record.business_name,
                        record.status.map(|status| status.as_str()),
                        &record.address,
                        &record.city_state_zip,
                        &record.phone,
                        &record.bond_amount,
                        record.classifications.join(";"),
                        &record.expire_date,
                        &record.raw_text,
                    ])?;
                }
            }
            ParsedListing::Personnel(records) => {
                let mut statement = tx.prepare(
                    "
                    INSERT INTO personnel_records(
                      source_file, line_number, license_number, person_name, title,
                      association_date, disassociation_date, raw_text
                    )
                    VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ",
                )?;
                for record in records {
                    statement.execute(params![
                        source_file,
                        record.line_number as i64,
                        &record.license_number,
                        &record.person_name,
                        record.title.map(|title| title.as_str()),
                        &record.association_date,
                        &record.disassociation_date,
                        &record.raw_text,
                    ])?;
                }
            }
        }

        tx.execute(
            "
            INSERT INTO source_files(filename, kind, sha256, record_count, indexed_at)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(filename) DO UPDATE SET
              kind=excluded.kind,
              sha256=excluded.sha256,
              record_count=excluded.record_count,
              indexed_at=excluded.indexed_at
            ",
            params![
                source_file,
                listing.kind().as_str(),
                source_sha256,
                listing.len() as i64,
                Utc::now()
            ],
        )?;

        tx.commit()?;
        info!(file = %source_file, rows = listing.len(), "indexed listing");
        Ok(listing.len())
    }

    pub(super) fn record_run(&self, session: &Session) -> Result<()> {
        self.connection
            .execute(
                "
                INSERT INTO runs(
                  session_id, mode, status, started_at, ended_at, total_files,
                  successful_files, failed_files, total_records, contractor_records,
                  personnel_records, error_count
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(session_id) DO UPDATE SET
                  status=excluded.status,
                  ended_at=excluded.ended_at,
                  total_files=excluded.total_files,
                  successful_files=excluded.successful_files,
                  failed_files=excluded.failed_files,
                  total_records=excluded.total_records,
                  contractor_records=excluded.contractor_records,
                  personnel_records=excluded.personnel_records,
                  error_count=excluded.error_count
                ",
                params![
                    &session.session_id,
                    &session.mode,
                    session.status.as_str(),
                    &session.started_at,
                    &session.ended_at,
                    session.totals.total_files as i64,
                    session.totals.successful_files as i64,
                    session.totals.failed_files as i64,
                    session.totals.total_records as i64,
                    session.totals.contractor_records as i64,
                    session.totals.personnel_records as i64,
                    session.errors.len() as i64,
                ],
            )
            .context("failed to record run in index")?;
        Ok(())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS source_files (
              filename TEXT PRIMARY KEY,
              kind TEXT NOT NULL,
              sha256 TEXT,
              record_count INTEGER NOT NULL,
              indexed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS business_records (
              source_file TEXT NOT NULL,
              line_number INTEGER NOT NULL,
              license_number TEXT NOT NULL,
              business_name TEXT,
              status TEXT,
              address TEXT,
              city_state_zip TEXT,
              phone TEXT,
              bond_amount TEXT,
              classifications TEXT,
              expire_date TEXT,
              raw_text TEXT NOT NULL,
              PRIMARY KEY(source_file, line_number)
            );

            CREATE INDEX IF NOT EXISTS idx_business_license
              ON business_records(license_number);

            CREATE TABLE IF NOT EXISTS personnel_records (
              source_file TEXT NOT NULL,
              line_number INTEGER NOT NULL,
              license_number TEXT NOT NULL,
              person_name TEXT NOT NULL,
              title TEXT,
              association_date TEXT,
              disassociation_date TEXT,
              raw_text TEXT NOT NULL,
              PRIMARY KEY(source_file, line_number)
            );

            CREATE INDEX IF NOT EXISTS idx_personnel_license
              ON personnel_records(license_number);

            CREATE TABLE IF NOT EXISTS runs (
              session_id TEXT PRIMARY KEY,
              mode TEXT NOT NULL,
              status TEXT NOT NULL,
              started_at TEXT NOT NULL,
              ended_at TEXT,
              total_files INTEGER NOT NULL,
              successful_files INTEGER NOT NULL,
              failed_files INTEGER NOT NULL,
              total_records INTEGER NOT NULL,
              contractor_records INTEGER NOT NULL,
              personnel_records INTEGER NOT NULL,
              error_count INTEGER NOT NULL
            );
            ",
        )
        .context("failed to create index schema")?;

    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES('schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            params![INDEX_SCHEMA_VERSION],
        )
        .context("failed to record index schema version")?;
    Ok(())
}
