use std::fs;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cli::RunMode;
use crate::commands::inventory::discover_documents;
use crate::error::PipelineError;
use crate::layout::DataLayout;
use crate::model::{DownloadResult, RecordKind};
use crate::util::file_name_lossy;

/// Filenames a daily run expects to find for `date`.
pub(super) fn expected_daily_filenames(date: NaiveDate) -> Vec<String> {
    [RecordKind::Business, RecordKind::Personnel]
        .into_iter()
        .map(|kind| format!("{}_{}.pdf", kind.file_prefix(), date.format("%Y%m%d")))
        .collect()
}

/// Bookkeeping over the raw-document directory. Documents already on disk
/// count as successful downloads; in daily mode each expected file that is
/// absent is recorded as a failure. Nothing is fetched over the network.
pub(super) fn acquire(mode: RunMode, layout: &DataLayout, today: NaiveDate) -> Result<Vec<DownloadResult>> {
    layout.ensure().map_err(|err| PipelineError::Acquisition {
        path: layout.data_root.display().to_string(),
        detail: format!("{err:#}"),
    })?;

    let documents = discover_documents(&layout.pdf_dir).map_err(|err| PipelineError::Acquisition {
        path: layout.pdf_dir.display().to_string(),
        detail: format!("{err:#}"),
    })?;

    let mut results = Vec::with_capacity(documents.len() + 2);
    for path in &documents {
        let filename = file_name_lossy(path);
        let file_size = fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
        info!(file = %filename, bytes = file_size, "source document present");
        results.push(DownloadResult {
            filename,
            success: true,
            file_size,
            error: None,
        });
    }

    if mode == RunMode::Daily {
        for expected in expected_daily_filenames(today) {
            let present = results
                .iter()
                .any(|result| result.filename.eq_ignore_ascii_case(&expected));
            if present {
                continue;
            }
            warn!(file = %expected, "expected daily document not found");
            results.push(DownloadResult {
                filename: expected,
                success: false,
                file_size: 0,
                error: Some("not found in source directory".to_string()),
            });
        }
    }

    info!(
        mode = mode.as_str(),
        present = documents.len(),
        missing = results.len() - documents.len(),
        "acquisition complete"
    );
    Ok(results)
}
