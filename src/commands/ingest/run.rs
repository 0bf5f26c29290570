use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::cli::{RunArgs, RunMode};
use crate::commands::inventory::discover_documents;
use crate::error::PipelineError;
use crate::layout::DataLayout;
use crate::model::RecordKind;
use crate::util::{command_version_optional, ensure_directory, file_name_lossy, write_json_pretty};

use super::acquisition::acquire;
use super::archive::{archive_aged_files, retention_cutoff};
use super::extraction::TextExtractor;
use super::field_patterns::FieldPatterns;
use super::index_store::ContractorIndex;
use super::pipeline::process_document;
use super::session::Session;

#[derive(Debug, Clone)]
pub(super) struct PipelineConfig {
    pub(super) mode: RunMode,
    pub(super) layout: DataLayout,
    pub(super) index_path: Option<PathBuf>,
    pub(super) retention_days: u32,
    pub(super) extract_timeout: Option<Duration>,
    pub(super) pause: Duration,
    pub(super) pdftotext_bin: String,
}

impl PipelineConfig {
    pub(super) fn from_args(args: &RunArgs) -> Self {
        let mut layout = DataLayout::under(&args.data_root);
        if let Some(dir) = &args.pdf_dir {
            layout.pdf_dir = dir.clone();
        }
        if let Some(dir) = &args.text_dir {
            layout.text_dir = dir.clone();
        }
        if let Some(dir) = &args.csv_dir {
            layout.csv_dir = dir.clone();
        }
        if let Some(dir) = &args.archive_dir {
            layout.archive_dir = dir.clone();
        }
        if let Some(dir) = &args.report_dir {
            layout.report_dir = dir.clone();
        }
        if let Some(path) = &args.db_path {
            layout.db_path = path.clone();
        }

        Self {
            mode: args.mode,
            index_path: (!args.skip_index).then(|| layout.db_path.clone()),
            layout,
            retention_days: args.retention_days,
            extract_timeout: (args.extract_timeout_secs > 0)
                .then(|| Duration::from_secs(args.extract_timeout_secs)),
            pause: Duration::from_millis(args.pause_ms),
            pdftotext_bin: args.pdftotext_bin.clone(),
        }
    }
}

#[derive(Debug)]
pub(super) struct RunOutcome {
    pub(super) session: Session,
    pub(super) report_path: Option<PathBuf>,
    pub(super) result: Result<()>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = PipelineConfig::from_args(&args);
    info!(
        mode = config.mode.as_str(),
        data_root = %config.layout.data_root.display(),
        "starting cslb ingest run"
    );

    let started = Utc::now();
    let today = started.with_timezone(&Local).date_naive();
    let RunOutcome {
        session,
        report_path,
        result,
    } = execute(&config, started, today);
    result?;

    if session.totals.failed_files > 0 {
        bail!(
            "{} of {} source documents failed; see {}",
            session.totals.failed_files,
            session.totals.total_files,
            report_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "the log above".to_string())
        );
    }

    info!(session = %session.session_id, "run completed");
    Ok(())
}

/// Runs every stage and always finishes the session and writes its report,
/// whatever the stages returned.
pub(super) fn execute(config: &PipelineConfig, started: DateTime<Utc>, today: NaiveDate) -> RunOutcome {
    let mut session = Session::start(config.mode, &config.layout, started);
    info!(session = %session.session_id, "session started");

    let mut index = match &config.index_path {
        Some(path) => match ContractorIndex::open(path) {
            Ok(index) => Some(index),
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "contractor index unavailable");
                session.record_error(format!("index: {err:#}"));
                None
            }
        },
        None => None,
    };

    let stage_result = run_stages(config, today, &mut session, index.as_mut());
    if let Err(err) = &stage_result {
        let fatal = err
            .downcast_ref::<PipelineError>()
            .map(PipelineError::is_fatal)
            .unwrap_or(true);
        error!(error = %format!("{err:#}"), fatal, "run aborted");
        session.mark_failed(err);
    }

    session.finish(Utc::now());

    let report_result = write_session_report(config, &session);
    let report_path = report_result.as_ref().ok().cloned();
    if let Err(err) = &report_result {
        session.mark_failed(err);
    }

    if let Some(index) = &index {
        if let Err(err) = index.record_run(&session) {
            warn!(error = %format!("{err:#}"), "failed to record run in contractor index");
        }
    }

    info!(
        session = %session.session_id,
        status = session.status.as_str(),
        files = session.totals.total_files,
        succeeded = session.totals.successful_files,
        failed = session.totals.failed_files,
        records = session.totals.total_records,
        business = session.totals.contractor_records,
        personnel = session.totals.personnel_records,
        errors = session.errors.len(),
        "session finished"
    );

    let result = match (stage_result, report_result) {
        (Err(err), _) => Err(err),
        (Ok(()), Err(err)) => Err(err),
        (Ok(()), Ok(_)) => Ok(()),
    };

    RunOutcome {
        session,
        report_path,
        result,
    }
}

fn run_stages(
    config: &PipelineConfig,
    today: NaiveDate,
    session: &mut Session,
    mut index: Option<&mut ContractorIndex>,
) -> Result<()> {
    let downloads = acquire(config.mode, &config.layout, today)?;
    session.merge_downloads(downloads);

    session.pdftotext_version = command_version_optional(&config.pdftotext_bin, &["-v"]);
    if session.pdftotext_version.is_none() {
        warn!(program = %config.pdftotext_bin, "pdftotext not found; only cached text can be parsed");
    }

    let patterns = FieldPatterns::new()?;
    let extractor = TextExtractor::new(
        config.pdftotext_bin.clone(),
        &config.layout.text_dir,
        config.extract_timeout,
    );

    let documents = discover_documents(&config.layout.pdf_dir).map_err(|err| {
        PipelineError::Acquisition {
            path: config.layout.pdf_dir.display().to_string(),
            detail: format!("{err:#}"),
        }
    })?;

    let mut processed = 0usize;
    for path in documents {
        let filename = file_name_lossy(&path);
        let Some(kind) = RecordKind::from_filename(&filename) else {
            warn!(file = %filename, "skipping document without PL/PP prefix");
            continue;
        };

        if processed > 0 && !config.pause.is_zero() {
            thread::sleep(config.pause);
        }
        processed += 1;

        let outcome = process_document(&path, kind, &extractor, &patterns, &config.layout.csv_dir);
        if let (Some(index), Some(listing)) = (index.as_deref_mut(), outcome.listing.as_ref()) {
            if let Err(err) = index.replace_listing(
                &outcome.result.filename,
                outcome.result.source_sha256.as_deref(),
                listing,
            ) {
                warn!(file = %filename, error = %format!("{err:#}"), "failed to index listing");
                session.record_error(format!("index: {filename}: {err:#}"));
            }
        }
        session.merge_file(outcome.result);
    }

    if config.mode.archives() {
        let cutoff = retention_cutoff(SystemTime::now(), config.retention_days);
        let outcome = archive_aged_files(&config.layout, cutoff)
            .context("archiving aged files failed")?;
        session.merge_archive(outcome);
    }

    Ok(())
}

/// Persists the text report and the JSON session manifest. When the report
/// cannot be written its text goes to the log instead.
fn write_session_report(config: &PipelineConfig, session: &Session) -> Result<PathBuf> {
    let report = session.render_report();
    let report_path = session.report_path(&config.layout.report_dir);

    let written = ensure_directory(&config.layout.report_dir).and_then(|()| {
        std::fs::write(&report_path, &report)
            .with_context(|| format!("failed to write {}", report_path.display()))
    });
    if let Err(err) = written {
        error!(report = %report, "run report could not be persisted");
        return Err(PipelineError::ReportWrite {
            path: report_path.display().to_string(),
            detail: format!("{err:#}"),
        }
        .into());
    }
    info!(path = %report_path.display(), "wrote run report");

    let manifest_path = session.manifest_path(&config.layout.manifest_dir);
    write_json_pretty(&manifest_path, session).map_err(|err| PipelineError::ReportWrite {
        path: manifest_path.display().to_string(),
        detail: format!("{err:#}"),
    })?;
    info!(path = %manifest_path.display(), "wrote session manifest");

    Ok(report_path)
}
