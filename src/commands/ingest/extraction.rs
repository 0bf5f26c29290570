use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::util::{ensure_directory, file_name_lossy};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TextSource {
    Cache,
    Layout,
    Plain,
}

impl TextSource {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Layout => "layout",
            Self::Plain => "plain",
        }
    }
}

#[derive(Debug)]
pub(super) struct ExtractedText {
    pub(super) text: String,
    pub(super) source: TextSource,
    pub(super) text_path: PathBuf,
}

/// Converts source PDFs to text through `pdftotext`, keeping one cached
/// `.txt` per document in the text directory.
#[derive(Debug, Clone)]
pub(super) struct TextExtractor {
    program: String,
    text_dir: PathBuf,
    timeout: Option<Duration>,
}

impl TextExtractor {
    pub(super) fn new(program: impl Into<String>, text_dir: &Path, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            text_dir: text_dir.to_path_buf(),
            timeout,
        }
    }

    pub(super) fn text_path_for(&self, pdf_path: &Path) -> PathBuf {
        let stem = pdf_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.text_dir.join(format!("{stem}.txt"))
    }

    pub(super) fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, PipelineError> {
        let filename = file_name_lossy(pdf_path);
        let text_path = self.text_path_for(pdf_path);
        let extraction_error = |detail: String| PipelineError::Extraction {
            filename: filename.clone(),
            detail,
        };

        if text_path.exists() {
            let text = read_text(&text_path).map_err(|err| extraction_error(format!("{err:#}")))?;
            info!(file = %filename, path = %text_path.display(), "using cached text");
            return Ok(ExtractedText {
                text,
                source: TextSource::Cache,
                text_path,
            });
        }

        ensure_directory(&self.text_dir).map_err(|err| extraction_error(format!("{err:#}")))?;

        let mut failures = Vec::new();
        for (source, layout) in [(TextSource::Layout, true), (TextSource::Plain, false)] {
            match self.run_pdftotext(pdf_path, &text_path, layout) {
                Ok(()) => {
                    let text =
                        read_text(&text_path).map_err(|err| extraction_error(format!("{err:#}")))?;
                    info!(
                        file = %filename,
                        mode = source.as_str(),
                        chars = text.len(),
                        "extracted text"
                    );
                    return Ok(ExtractedText {
                        text,
                        source,
                        text_path,
                    });
                }
                Err(err) => {
                    warn!(file = %filename, mode = source.as_str(), error = %format!("{err:#}"), "pdftotext attempt failed");
                    failures.push(format!("{} mode: {err:#}", source.as_str()));
                }
            }
        }

        Err(extraction_error(failures.join("; ")))
    }

    /// One pdftotext attempt. Output lands in a `.partial` file and only
    /// becomes the cache entry once the tool exits cleanly.
    fn run_pdftotext(&self, pdf_path: &Path, text_path: &Path, layout: bool) -> Result<()> {
        let partial_path = text_path.with_extension("txt.partial");

        let mut command = Command::new(&self.program);
        if layout {
            command.arg("-layout");
        }
        command
            .arg("-enc")
            .arg("UTF-8")
            .arg(pdf_path)
            .arg(&partial_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let (status, stderr) = match run_with_timeout(&mut command, self.timeout) {
            Ok(outcome) => outcome,
            Err(err) => {
                let _ = fs::remove_file(&partial_path);
                return Err(err).with_context(|| format!("failed to execute {}", self.program));
            }
        };

        if !status.success() {
            let _ = fs::remove_file(&partial_path);
            bail!(
                "{} returned non-zero exit status for {}: {}",
                self.program,
                pdf_path.display(),
                stderr.trim()
            );
        }

        if !partial_path.exists() {
            bail!(
                "{} did not produce expected text for {}",
                self.program,
                pdf_path.display()
            );
        }

        fs::rename(&partial_path, text_path).with_context(|| {
            format!(
                "failed to move {} into {}",
                partial_path.display(),
                text_path.display()
            )
        })?;
        Ok(())
    }
}

fn read_text(path: &Path) -> Result<String> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&raw).replace('\u{0000}', ""))
}

/// Runs `command` to completion, killing it once `timeout` elapses. Returns
/// the exit status and captured stderr.
pub(super) fn run_with_timeout(command: &mut Command, timeout: Option<Duration>) -> Result<(ExitStatus, String)> {
    let mut child = command.spawn()?;

    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        })
    });

    let deadline = timeout.map(|limit| (Instant::now() + limit, limit));
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Some((deadline, limit)) = deadline {
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("timed out after {} ms", limit.as_millis());
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    Ok((status, stderr))
}
