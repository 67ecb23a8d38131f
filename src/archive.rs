//! Bulk-download bundles and raw-data export/import.
//!
//! The PDF bundle mirrors the source directory incrementally: unchanged
//! entries are never recompressed, and the bundle file is only ever
//! replaced atomically so concurrent readers never see a partial write.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::repository::DocumentRepository;

/// Bundle file names under the zip directory.
pub const PDF_BUNDLE_NAME: &str = "vsberichte.zip";
pub const TEXT_BUNDLE_NAME: &str = "vsberichte-texts.zip";

/// Top-level data subdirectories included in export/import.
pub const DATA_DIRS: &[&str] = &["pdfs", "cleaned", "raw", "deleted"];

/// Outcome of one PDF-bundle sync run.
#[derive(Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Bundle rewritten from scratch with `n` files.
    Rebuilt(usize),
    /// `n` new files appended to the existing bundle.
    Appended(usize),
    /// Bundle already matched the source directory.
    UpToDate,
}

/// Enumerate the source directory as `{filename → byte size}`.
fn disk_manifest(pdf_dir: &Path) -> std::io::Result<Vec<(String, u64)>> {
    let mut files = Vec::new();
    if !pdf_dir.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(pdf_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("pdf") && path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push((name.to_string(), entry.metadata()?.len()));
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Read a bundle's entry list as `{filename → stored size}`.
fn bundle_manifest(bundle_path: &Path) -> anyhow::Result<HashMap<String, u64>> {
    let file = File::open(bundle_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut entries = HashMap::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        entries.insert(entry.name().to_string(), entry.size());
    }
    Ok(entries)
}

/// Keep the PDF bundle consistent with the source directory.
///
/// A full rebuild happens when forced, when no bundle exists, or when
/// any bundled entry is missing from disk or differs in size (one check
/// covers both deletions and modifications, since a missing entry
/// compares unequal to any stored size). Otherwise only files absent
/// from the bundle are appended. PDFs are stored uncompressed; they are
/// already compressed formats.
pub fn sync_pdf_bundle(pdf_dir: &Path, zip_dir: &Path, force: bool) -> anyhow::Result<SyncOutcome> {
    fs::create_dir_all(zip_dir)?;
    let dest = zip_dir.join(PDF_BUNDLE_NAME);
    let tmp = zip_dir.join(format!("{}.tmp", PDF_BUNDLE_NAME));

    let disk_files = disk_manifest(pdf_dir)?;
    let disk_sizes: HashMap<&str, u64> =
        disk_files.iter().map(|(n, s)| (n.as_str(), *s)).collect();

    let mut needs_rebuild = force || !dest.exists();
    let mut existing = HashMap::new();

    if !needs_rebuild {
        existing = bundle_manifest(&dest)?;
        // Any deleted or resized source file invalidates the bundle.
        for (name, size) in &existing {
            if disk_sizes.get(name.as_str()) != Some(size) {
                needs_rebuild = true;
                break;
            }
        }
    }

    if needs_rebuild {
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut writer = ZipWriter::new(BufWriter::new(File::create(&tmp)?));
        for (name, _) in &disk_files {
            writer.start_file(name.as_str(), options)?;
            let mut src = File::open(pdf_dir.join(name))?;
            std::io::copy(&mut src, &mut writer)?;
        }
        writer.finish()?.flush()?;
        // The rename is the sole mutation of the published path.
        fs::rename(&tmp, &dest)?;
        info!(files = disk_files.len(), "pdf bundle rebuilt");
        return Ok(SyncOutcome::Rebuilt(disk_files.len()));
    }

    let new_files: Vec<&(String, u64)> = disk_files
        .iter()
        .filter(|(name, _)| !existing.contains_key(name))
        .collect();
    if new_files.is_empty() {
        info!(files = existing.len(), "pdf bundle up to date");
        return Ok(SyncOutcome::UpToDate);
    }

    let file = fs::OpenOptions::new().read(true).write(true).open(&dest)?;
    let mut writer = ZipWriter::new_append(file)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, _) in &new_files {
        writer.start_file(name.as_str(), options)?;
        let mut src = File::open(pdf_dir.join(name))?;
        std::io::copy(&mut src, &mut writer)?;
    }
    writer.finish()?;
    info!(new = new_files.len(), "pdf bundle appended");
    Ok(SyncOutcome::Appended(new_files.len()))
}

/// Rebuild the text bundle from persisted page content.
///
/// Always a full rebuild: page text can change without any file-size
/// signal on disk. One text file per document, named from its unique
/// file URL stem.
pub fn build_text_bundle(repo: &DocumentRepository, zip_dir: &Path) -> anyhow::Result<usize> {
    fs::create_dir_all(zip_dir)?;
    let dest = zip_dir.join(TEXT_BUNDLE_NAME);
    let tmp = zip_dir.join(format!("{}.tmp", TEXT_BUNDLE_NAME));
    if tmp.exists() {
        fs::remove_file(&tmp)?;
    }

    let documents = repo.get_all_ordered()?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(BufWriter::new(File::create(&tmp)?));
    let mut total = 0;
    for doc in &documents {
        let text = repo.document_text(doc.id)?;
        let stem = Path::new(&doc.file_url)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("bericht");
        writer.start_file(format!("{}.txt", stem), options)?;
        writer.write_all(text.as_bytes())?;
        total += 1;
    }
    writer.finish()?.flush()?;
    fs::rename(&tmp, &dest)?;
    info!(files = total, "text bundle rebuilt");
    Ok(total)
}

/// Export all PDFs under the recognized data subdirectories into a
/// single tar archive, preserving relative paths.
pub fn export_data(data_dir: &Path, output_path: &Path) -> anyhow::Result<usize> {
    let file = File::create(output_path)?;
    let mut builder = tar::Builder::new(BufWriter::new(file));

    let mut total = 0;
    for dir_name in DATA_DIRS {
        let dir_path = data_dir.join(dir_name);
        if !dir_path.exists() {
            continue;
        }
        let mut paths = collect_pdfs(&dir_path)?;
        paths.sort();
        for path in paths {
            let rel = path.strip_prefix(data_dir)?;
            builder.append_path_with_name(&path, rel)?;
            total += 1;
        }
    }
    builder.into_inner()?.flush()?;
    Ok(total)
}

/// Import PDFs from a tar archive produced by [`export_data`].
///
/// Only `.pdf` entries whose first path component is a recognized data
/// subdirectory are extracted; everything else is ignored.
pub fn import_data(data_dir: &Path, input_path: &Path) -> anyhow::Result<usize> {
    let file = File::open(input_path)?;
    let mut archive = tar::Archive::new(BufReader::new(file));

    let mut total = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_path_buf();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        let first = path
            .components()
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .map(|s| s.to_string());
        match first {
            Some(dir) if DATA_DIRS.contains(&dir.as_str()) => {}
            _ => continue,
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(data_dir.join(parent))?;
        }
        entry.unpack(data_dir.join(&path))?;
        total += 1;
    }
    Ok(total)
}

/// Recursively collect `.pdf` files below a directory.
fn collect_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("pdf") {
                out.push(path);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentBundle, NewPage};

    fn write_pdf(dir: &Path, name: &str, content: &[u8]) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn entry_names(bundle_path: &Path) -> Vec<String> {
        let mut names: Vec<String> = bundle_manifest(bundle_path).unwrap().into_keys().collect();
        names.sort();
        names
    }

    #[test]
    fn test_sync_is_incremental_and_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let pdf_dir = root.path().join("pdfs");
        let zip_dir = root.path().join("zips");
        fs::create_dir_all(&pdf_dir).unwrap();

        write_pdf(&pdf_dir, "vsbericht-by-2004.pdf", b"aaaa");
        assert_eq!(
            sync_pdf_bundle(&pdf_dir, &zip_dir, false).unwrap(),
            SyncOutcome::Rebuilt(1)
        );
        assert_eq!(
            sync_pdf_bundle(&pdf_dir, &zip_dir, false).unwrap(),
            SyncOutcome::UpToDate
        );

        // A new file is appended without touching the existing entry.
        write_pdf(&pdf_dir, "vsbericht-he-2005.pdf", b"bbbb");
        assert_eq!(
            sync_pdf_bundle(&pdf_dir, &zip_dir, false).unwrap(),
            SyncOutcome::Appended(1)
        );
        assert_eq!(
            entry_names(&zip_dir.join(PDF_BUNDLE_NAME)),
            vec!["vsbericht-by-2004.pdf", "vsbericht-he-2005.pdf"]
        );

        // A size change forces the rebuild path.
        write_pdf(&pdf_dir, "vsbericht-by-2004.pdf", b"aaaaaa");
        assert_eq!(
            sync_pdf_bundle(&pdf_dir, &zip_dir, false).unwrap(),
            SyncOutcome::Rebuilt(2)
        );
    }

    #[test]
    fn test_deleted_source_file_forces_rebuild() {
        let root = tempfile::tempdir().unwrap();
        let pdf_dir = root.path().join("pdfs");
        let zip_dir = root.path().join("zips");
        fs::create_dir_all(&pdf_dir).unwrap();

        write_pdf(&pdf_dir, "a.pdf", b"aa");
        write_pdf(&pdf_dir, "b.pdf", b"bb");
        sync_pdf_bundle(&pdf_dir, &zip_dir, false).unwrap();

        fs::remove_file(pdf_dir.join("a.pdf")).unwrap();
        assert_eq!(
            sync_pdf_bundle(&pdf_dir, &zip_dir, false).unwrap(),
            SyncOutcome::Rebuilt(1)
        );
        assert_eq!(entry_names(&zip_dir.join(PDF_BUNDLE_NAME)), vec!["b.pdf"]);
    }

    #[test]
    fn test_text_bundle_contains_one_file_per_document() {
        let root = tempfile::tempdir().unwrap();
        let repo = DocumentRepository::new(&root.path().join("test.db")).unwrap();
        repo.insert_bundle(&DocumentBundle {
            year: 2004,
            title: "Verfassungsschutzbericht 2004".to_string(),
            jurisdiction: "Bayern".to_string(),
            file_url: "/pdfs/vsbericht-by-2004.pdf".to_string(),
            pages: vec![NewPage {
                content: "seiteninhalt".to_string(),
                file_url: "/images/vsbericht-by-2004_0.jpg".to_string(),
            }],
            token_counts: vec![("seiteninhalt".to_string(), 1)],
        })
        .unwrap();

        let zip_dir = root.path().join("zips");
        assert_eq!(build_text_bundle(&repo, &zip_dir).unwrap(), 1);
        assert_eq!(
            entry_names(&zip_dir.join(TEXT_BUNDLE_NAME)),
            vec!["vsbericht-by-2004.txt"]
        );
    }

    #[test]
    fn test_export_import_round_trip() {
        let src_root = tempfile::tempdir().unwrap();
        let pdf_dir = src_root.path().join("pdfs");
        fs::create_dir_all(&pdf_dir).unwrap();
        fs::create_dir_all(src_root.path().join("deleted")).unwrap();
        write_pdf(&pdf_dir, "vsbericht-by-2004.pdf", b"inhalt");
        write_pdf(&src_root.path().join("deleted"), "old.pdf", b"alt");
        // Not a pdf, not exported.
        fs::write(pdf_dir.join("notes.txt"), b"x").unwrap();

        let tar_path = src_root.path().join("export.tar");
        assert_eq!(export_data(src_root.path(), &tar_path).unwrap(), 2);

        let dst_root = tempfile::tempdir().unwrap();
        assert_eq!(import_data(dst_root.path(), &tar_path).unwrap(), 2);
        assert_eq!(
            fs::read(dst_root.path().join("pdfs/vsbericht-by-2004.pdf")).unwrap(),
            b"inhalt"
        );
        assert_eq!(
            fs::read(dst_root.path().join("deleted/old.pdf")).unwrap(),
            b"alt"
        );
        assert!(!dst_root.path().join("pdfs/notes.txt").exists());
    }
}
