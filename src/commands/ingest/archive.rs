use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::layout::DataLayout;
use crate::util::ensure_directory;

#[derive(Debug, Clone, Default)]
pub(super) struct ArchiveOutcome {
    pub(super) moved: Vec<String>,
    pub(super) errors: Vec<String>,
}

pub(super) fn retention_cutoff(now: SystemTime, retention_days: u32) -> SystemTime {
    now.checked_sub(Duration::from_secs(u64::from(retention_days) * 86_400))
        .unwrap_or(UNIX_EPOCH)
}

/// Moves every raw, text and CSV file last modified strictly before `cutoff`
/// into a same-named subdirectory of the archive directory.
pub(super) fn archive_aged_files(layout: &DataLayout, cutoff: SystemTime) -> Result<ArchiveOutcome> {
    let mut outcome = ArchiveOutcome::default();

    for (label, dir) in [
        ("pdfs", &layout.pdf_dir),
        ("text", &layout.text_dir),
        ("csv", &layout.csv_dir),
    ] {
        archive_directory(label, dir, &layout.archive_dir.join(label), cutoff, &mut outcome)?;
    }

    info!(
        moved = outcome.moved.len(),
        errors = outcome.errors.len(),
        "archiving complete"
    );
    Ok(outcome)
}

fn archive_directory(
    label: &str,
    dir: &Path,
    destination: &Path,
    cutoff: SystemTime,
    outcome: &mut ArchiveOutcome,
) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let metadata = entry
            .metadata()
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata
            .modified()
            .with_context(|| format!("failed to read modification time: {}", path.display()))?;
        if modified >= cutoff {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let target = destination.join(&filename);
        let moved = ensure_directory(destination).and_then(|()| {
            fs::rename(&path, &target).with_context(|| {
                format!("failed to move {} to {}", path.display(), target.display())
            })
        });

        match moved {
            Ok(()) => {
                info!(file = %filename, to = %target.display(), "archived file");
                outcome.moved.push(format!("{label}/{filename}"));
            }
            Err(err) => {
                warn!(file = %filename, error = %format!("{err:#}"), "archive move failed");
                outcome.errors.push(format!("archive: {label}/{filename}: {err:#}"));
            }
        }
    }

    Ok(())
}
