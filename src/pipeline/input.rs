//! Input resolution: locate the gazette PDF to analyse.
//!
//! Two entry points. [`resolve_local`] checks an explicitly named file;
//! [`find_latest_pdf`] scans a download directory and picks the most recently
//! modified `.pdf`. Both validate the `%PDF` magic bytes before returning so
//! callers get a meaningful error rather than a pdfium failure.

use crate::error::GazetteError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Validate that `path` names a readable PDF.
pub fn resolve_local(path: &Path) -> Result<PathBuf, GazetteError> {
    if !path.exists() {
        return Err(GazetteError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(GazetteError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GazetteError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(GazetteError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// Whether `path` has a `.pdf` extension, in any letter case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Pick the most recently modified PDF in `dir`.
///
/// Only regular files directly inside `dir` are considered. Equal
/// modification times are broken by file name, greatest first, so the choice
/// is deterministic.
pub fn find_latest_pdf(dir: &Path) -> Result<PathBuf, GazetteError> {
    if !dir.is_dir() {
        return Err(GazetteError::InputDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let read_failed = |source| GazetteError::ReadFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let path = entry.path();
        if !has_pdf_extension(&path) {
            continue;
        }
        let meta = entry.metadata().map_err(read_failed)?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((path, modified));
    }

    let latest = pick_latest(candidates).ok_or_else(|| GazetteError::NoInputDocument {
        dir: dir.to_path_buf(),
    })?;

    info!("Latest PDF in {}: {}", dir.display(), latest.display());
    resolve_local(&latest)
}

fn pick_latest(mut candidates: Vec<(PathBuf, SystemTime)>) -> Option<PathBuf> {
    debug!("{} PDF candidates", candidates.len());
    candidates.sort_by(|(pa, ta), (pb, tb)| tb.cmp(ta).then_with(|| pb.cmp(pa)));
    candidates.into_iter().next().map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_pdf(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn missing_dir_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let err = find_latest_pdf(&tmp.path().join("downloads")).unwrap_err();
        assert!(matches!(err, GazetteError::InputDirMissing { .. }));
    }

    #[test]
    fn dir_without_pdfs_is_not_found() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "hola").unwrap();
        let err = find_latest_pdf(tmp.path()).unwrap_err();
        assert!(matches!(err, GazetteError::NoInputDocument { .. }));
    }

    #[test]
    fn newest_pdf_wins() {
        let tmp = TempDir::new().unwrap();
        write_pdf(tmp.path(), "old.pdf", 3600);
        let newest = write_pdf(tmp.path(), "new.PDF", 10);
        write_pdf(tmp.path(), "middle.pdf", 600);
        assert_eq!(find_latest_pdf(tmp.path()).unwrap(), newest);
    }

    #[test]
    fn subdirectories_named_pdf_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let only = write_pdf(tmp.path(), "a.pdf", 3600);
        std::fs::create_dir(tmp.path().join("fake.pdf")).unwrap();
        assert_eq!(find_latest_pdf(tmp.path()).unwrap(), only);
    }

    #[test]
    fn ties_break_by_name() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let picked = pick_latest(vec![
            (PathBuf::from("a.pdf"), t),
            (PathBuf::from("c.pdf"), t),
            (PathBuf::from("b.pdf"), t),
        ]);
        assert_eq!(picked, Some(PathBuf::from("c.pdf")));
    }

    #[test]
    fn resolve_local_rejects_non_pdf() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fake.pdf");
        std::fs::write(&path, b"<html>").unwrap();
        let err = resolve_local(&path).unwrap_err();
        assert!(matches!(err, GazetteError::NotAPdf { magic, .. } if &magic == b"<htm"));
    }

    #[test]
    fn resolve_local_missing_file() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, GazetteError::FileNotFound { .. }));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_pdf_extension(Path::new("x.PdF")));
        assert!(!has_pdf_extension(Path::new("x.pdf.txt")));
        assert!(!has_pdf_extension(Path::new("pdf")));
    }
}
