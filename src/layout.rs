use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::util::ensure_directory;

/// Working directory tree of the pipeline. Every directory derives from the
/// data root unless overridden on the command line.
#[derive(Debug, Clone)]
pub struct DataLayout {
    pub data_root: PathBuf,
    pub pdf_dir: PathBuf,
    pub text_dir: PathBuf,
    pub csv_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub report_dir: PathBuf,
    pub manifest_dir: PathBuf,
    pub db_path: PathBuf,
}

impl DataLayout {
    pub fn under(data_root: &Path) -> Self {
        Self {
            data_root: data_root.to_path_buf(),
            pdf_dir: data_root.join("pdfs"),
            text_dir: data_root.join("text"),
            csv_dir: data_root.join("csv"),
            archive_dir: data_root.join("archive"),
            report_dir: data_root.join("reports"),
            manifest_dir: data_root.join("manifests"),
            db_path: data_root.join("cslb_index.sqlite"),
        }
    }

    pub fn directories(&self) -> [&Path; 6] {
        [
            &self.pdf_dir,
            &self.text_dir,
            &self.csv_dir,
            &self.archive_dir,
            &self.report_dir,
            &self.manifest_dir,
        ]
    }

    /// Creates any missing directory. Safe to call on every run.
    pub fn ensure(&self) -> Result<()> {
        for dir in self.directories() {
            if !dir.exists() {
                ensure_directory(dir)?;
                info!(path = %dir.display(), "created directory");
            }
        }
        Ok(())
    }
}
