use thiserror::Error;

/// Failure kinds of an ingest run. Per-file kinds (`Extraction`, `Parse`) are
/// recorded on the file's result; the others abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("acquisition failed for {path}: {detail}")]
    Acquisition { path: String, detail: String },

    #[error("text extraction failed for {filename}: {detail}")]
    Extraction { filename: String, detail: String },

    #[error("parsing failed for {filename}: {detail}")]
    Parse { filename: String, detail: String },

    #[error("failed to write run report {path}: {detail}")]
    ReportWrite { path: String, detail: String },
}

impl PipelineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Acquisition { .. } | Self::ReportWrite { .. })
    }
}
