use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::RunMode;
use crate::layout::DataLayout;
use crate::model::{DownloadResult, FileResult, RecordKind, SessionTotals};
use crate::util::{utc_compact_string, utc_string};

use super::archive::ArchiveOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct SessionPaths {
    pub(super) data_root: String,
    pub(super) pdf_dir: String,
    pub(super) text_dir: String,
    pub(super) csv_dir: String,
    pub(super) archive_dir: String,
    pub(super) report_dir: String,
}

/// Accumulated state of one run. Stages return values and the orchestrator
/// merges them in here; the session is finished exactly once.
#[derive(Debug, Clone, Serialize)]
pub(super) struct Session {
    pub(super) manifest_version: u32,
    pub(super) session_id: String,
    pub(super) mode: String,
    pub(super) status: SessionStatus,
    pub(super) started_at: String,
    pub(super) ended_at: Option<String>,
    pub(super) failure_reason: Option<String>,
    pub(super) pdftotext_version: Option<String>,
    pub(super) paths: SessionPaths,
    pub(super) downloads: Vec<DownloadResult>,
    pub(super) files: Vec<FileResult>,
    pub(super) archived: Vec<String>,
    pub(super) totals: SessionTotals,
    pub(super) errors: Vec<String>,
}

impl Session {
    pub(super) fn start(mode: RunMode, layout: &DataLayout, started: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            manifest_version: 1,
            session_id: format!("{}-{}", utc_compact_string(started), &suffix[..8]),
            mode: mode.as_str().to_string(),
            status: SessionStatus::Running,
            started_at: utc_string(started),
            ended_at: None,
            failure_reason: None,
            pdftotext_version: None,
            paths: SessionPaths {
                data_root: layout.data_root.display().to_string(),
                pdf_dir: layout.pdf_dir.display().to_string(),
                text_dir: layout.text_dir.display().to_string(),
                csv_dir: layout.csv_dir.display().to_string(),
                archive_dir: layout.archive_dir.display().to_string(),
                report_dir: layout.report_dir.display().to_string(),
            },
            downloads: Vec::new(),
            files: Vec::new(),
            archived: Vec::new(),
            totals: SessionTotals::default(),
            errors: Vec::new(),
        }
    }

    pub(super) fn merge_downloads(&mut self, downloads: Vec<DownloadResult>) {
        for download in downloads {
            self.totals.downloads_attempted += 1;
            if download.success {
                self.totals.downloads_succeeded += 1;
            } else {
                self.totals.downloads_failed += 1;
                self.errors.push(format!(
                    "download: {}: {}",
                    download.filename,
                    download.error.as_deref().unwrap_or("unknown error")
                ));
            }
            self.downloads.push(download);
        }
    }

    pub(super) fn merge_file(&mut self, result: FileResult) {
        self.totals.total_files += 1;
        if result.success {
            self.totals.successful_files += 1;
            self.totals.total_records += result.record_count;
            match result.kind {
                RecordKind::Business => self.totals.contractor_records += result.record_count,
                RecordKind::Personnel => self.totals.personnel_records += result.record_count,
            }
        } else {
            self.totals.failed_files += 1;
            self.errors.push(format!(
                "parse: {}: {}",
                result.filename,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
        self.files.push(result);
    }

    pub(super) fn merge_archive(&mut self, outcome: ArchiveOutcome) {
        self.totals.archived_files += outcome.moved.len();
        self.archived.extend(outcome.moved);
        self.errors.extend(outcome.errors);
    }

    pub(super) fn record_error(&mut self, message: String) {
        self.errors.push(message);
    }

    pub(super) fn mark_failed(&mut self, err: &anyhow::Error) {
        let reason = format!("{err:#}");
        self.status = SessionStatus::Failed;
        self.errors.push(format!("fatal: {reason}"));
        self.failure_reason = Some(reason);
    }

    pub(super) fn finish(&mut self, ended: DateTime<Utc>) {
        if self.ended_at.is_some() {
            return;
        }
        self.ended_at = Some(utc_string(ended));
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Completed;
        }
    }

    pub(super) fn report_path(&self, report_dir: &Path) -> PathBuf {
        report_dir.join(format!("cslb_report_{}.txt", self.session_id))
    }

    pub(super) fn manifest_path(&self, manifest_dir: &Path) -> PathBuf {
        manifest_dir.join(format!("session_{}.json", self.session_id))
    }

    pub(super) fn render_report(&self) -> String {
        let mut lines = vec![
            "CSLB INGEST RUN REPORT".to_string(),
            "======================".to_string(),
            format!("Session:  {}", self.session_id),
            format!("Mode:     {}", self.mode),
            format!("Status:   {}", self.status.as_str()),
            format!("Started:  {}", self.started_at),
            format!("Ended:    {}", self.ended_at.as_deref().unwrap_or("-")),
        ];
        if let Some(reason) = &self.failure_reason {
            lines.push(format!("Failure:  {reason}"));
        }
        if let Some(version) = &self.pdftotext_version {
            lines.push(format!("pdftotext: {version}"));
        }

        push_section(&mut lines, "DOWNLOADS");
        lines.push(format!(
            "Attempted: {}  Succeeded: {}  Failed: {}",
            self.totals.downloads_attempted,
            self.totals.downloads_succeeded,
            self.totals.downloads_failed
        ));
        for download in &self.downloads {
            if download.success {
                lines.push(format!("  [ok]     {} ({} bytes)", download.filename, download.file_size));
            } else {
                lines.push(format!(
                    "  [failed] {}: {}",
                    download.filename,
                    download.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        push_section(&mut lines, "PARSING");
        lines.push(format!(
            "Files: {} total, {} succeeded, {} failed",
            self.totals.total_files, self.totals.successful_files, self.totals.failed_files
        ));
        lines.push(format!(
            "Records: {} total ({} business, {} personnel)",
            self.totals.total_records, self.totals.contractor_records, self.totals.personnel_records
        ));
        for file in &self.files {
            if file.success {
                lines.push(format!(
                    "  [ok]     {} ({}) {} records",
                    file.filename,
                    file.kind.as_str(),
                    file.record_count
                ));
            } else {
                lines.push(format!(
                    "  [failed] {} ({}): {}",
                    file.filename,
                    file.kind.as_str(),
                    file.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        push_section(&mut lines, "GENERATED FILES");
        let outputs = self
            .files
            .iter()
            .filter_map(|file| file.output_path.as_deref())
            .collect::<Vec<_>>();
        if outputs.is_empty() {
            lines.push("  (none)".to_string());
        }
        for output in outputs {
            lines.push(format!("  {output}"));
        }

        if !self.archived.is_empty() {
            push_section(&mut lines, "ARCHIVED");
            for archived in &self.archived {
                lines.push(format!("  {archived}"));
            }
        }

        push_section(&mut lines, "ERRORS");
        if self.errors.is_empty() {
            lines.push("  (none)".to_string());
        }
        for (index, error) in self.errors.iter().enumerate() {
            lines.push(format!("  {}. {}", index + 1, error));
        }

        lines.push(String::new());
        lines.join("\n")
    }
}

fn push_section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));
}
