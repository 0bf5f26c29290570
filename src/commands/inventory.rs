use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::layout::DataLayout;
use crate::model::{RecordKind, SourceEntry, SourceInventoryManifest};
use crate::util::{file_name_lossy, list_files_with_extension, now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let layout = DataLayout::under(&args.data_root);
    let pdf_dir = args.pdf_dir.clone().unwrap_or(layout.pdf_dir);
    let manifest = build_manifest(&pdf_dir)?;

    for entry in manifest.documents.iter().filter(|entry| entry.kind.is_none()) {
        warn!(filename = %entry.filename, "document has no PL/PP prefix and will be skipped by runs");
    }

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| layout.manifest_dir.join("source_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(pdf_dir: &Path) -> Result<SourceInventoryManifest> {
    let mut documents = Vec::new();
    for path in discover_documents(pdf_dir)? {
        let filename = file_name_lossy(&path);
        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let sha256 = sha256_file(&path)?;

        documents.push(SourceEntry {
            kind: RecordKind::from_filename(&filename),
            filename,
            size_bytes,
            sha256,
        });
    }

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: pdf_dir.display().to_string(),
        document_count: documents.len(),
        documents,
    })
}

/// Source documents in lexicographic filename order.
pub fn discover_documents(pdf_dir: &Path) -> Result<Vec<PathBuf>> {
    list_files_with_extension(pdf_dir, "pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_manifest_classifies_documents_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("PP_20261019.pdf"), b"personnel").unwrap();
        fs::write(dir.path().join("pl_20261019.PDF"), b"business").unwrap();
        fs::write(dir.path().join("notes.pdf"), b"other").unwrap();
        fs::write(dir.path().join("PL_20261019.txt"), b"text").unwrap();

        let manifest = build_manifest(dir.path()).unwrap();
        assert_eq!(manifest.document_count, 3);

        let kinds = manifest
            .documents
            .iter()
            .map(|entry| (entry.filename.as_str(), entry.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ("PP_20261019.pdf", Some(RecordKind::Personnel)),
                ("notes.pdf", None),
                ("pl_20261019.PDF", Some(RecordKind::Business)),
            ]
        );
        assert_eq!(manifest.documents[0].size_bytes, 9);
        assert_eq!(manifest.documents[0].sha256.len(), 64);
    }
}
