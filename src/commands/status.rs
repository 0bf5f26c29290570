use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::layout::DataLayout;
use crate::model::{SessionManifestSummary, SourceInventoryManifest};
use crate::util::list_files_with_extension;

pub fn run(args: StatusArgs) -> Result<()> {
    let layout = DataLayout::under(&args.data_root);
    let inventory_path = layout.manifest_dir.join("source_inventory.json");
    let db_path = args.db_path.clone().unwrap_or(layout.db_path.clone());

    info!(data_root = %args.data_root.display(), "status requested");

    match latest_session_manifest(&layout.manifest_dir)? {
        Some(session) => info!(
            session = %session.session_id,
            mode = %session.mode,
            status = %session.status,
            started_at = %session.started_at,
            ended_at = %session.ended_at.unwrap_or_default(),
            failure_reason = %session.failure_reason.unwrap_or_default(),
            files = session.totals.total_files,
            succeeded = session.totals.successful_files,
            failed = session.totals.failed_files,
            records = session.totals.total_records,
            business = session.totals.contractor_records,
            personnel = session.totals.personnel_records,
            archived = session.totals.archived_files,
            errors = session.errors.len(),
            "latest session"
        ),
        None => warn!(path = %layout.manifest_dir.display(), "no session manifest found"),
    }

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: SourceInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            document_count = inventory.document_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let business = query_count(&conn, "SELECT COUNT(*) FROM business_records").unwrap_or(0);
        let personnel = query_count(&conn, "SELECT COUNT(*) FROM personnel_records").unwrap_or(0);
        let sources = query_count(&conn, "SELECT COUNT(*) FROM source_files").unwrap_or(0);
        let last_run = conn
            .query_row(
                "SELECT session_id, status FROM runs ORDER BY started_at DESC LIMIT 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .unwrap_or(None);

        info!(
            path = %db_path.display(),
            sources,
            business,
            personnel,
            last_run = %last_run.as_ref().map(|(id, _)| id.as_str()).unwrap_or(""),
            last_run_status = %last_run.as_ref().map(|(_, status)| status.as_str()).unwrap_or(""),
            "contractor index status"
        );
    } else {
        warn!(path = %db_path.display(), "contractor index missing");
    }

    Ok(())
}

/// Session manifests are named by timestamped id, so the last name sorts newest.
pub fn latest_session_manifest(manifest_dir: &Path) -> Result<Option<SessionManifestSummary>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let latest = list_files_with_extension(manifest_dir, "json")?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("session_"))
                .unwrap_or(false)
        })
        .next_back();

    let Some(path) = latest else {
        return Ok(None);
    };

    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let session = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(session))
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_session_manifest_picks_newest_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = |id: &str, status: &str| {
            format!(
                r#"{{"session_id":"{id}","mode":"manual","status":"{status}","started_at":"2026-10-19T00:00:00Z","ended_at":null,"failure_reason":null,"totals":{{"downloads_attempted":0,"downloads_succeeded":0,"downloads_failed":0,"total_files":0,"successful_files":0,"failed_files":0,"total_records":0,"contractor_records":0,"personnel_records":0,"archived_files":0}},"errors":[]}}"#
            )
        };
        fs::write(
            dir.path().join("session_20261018T000000Z-aaaaaaaa.json"),
            manifest("20261018T000000Z-aaaaaaaa", "failed"),
        )
        .unwrap();
        fs::write(
            dir.path().join("session_20261019T000000Z-bbbbbbbb.json"),
            manifest("20261019T000000Z-bbbbbbbb", "completed"),
        )
        .unwrap();
        fs::write(dir.path().join("source_inventory.json"), "{}").unwrap();

        let latest = latest_session_manifest(dir.path()).unwrap().unwrap();
        assert_eq!(latest.session_id, "20261019T000000Z-bbbbbbbb");
        assert_eq!(latest.status, "completed");
    }

    #[test]
    fn latest_session_manifest_is_none_without_manifests() {
        let dir = tempfile::tempdir().unwrap();
        assert!(latest_session_manifest(&dir.path().join("missing")).unwrap().is_none());
        assert!(latest_session_manifest(dir.path()).unwrap().is_none());
    }
}
