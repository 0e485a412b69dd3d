//! Gzip-compressed tar extraction into a scratch directory.

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open archive '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read archive '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to unpack entry '{}': {source}", .entry.display())]
    Unpack {
        entry: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A regular file written by [`extract_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Path inside the archive.
    pub entry_path: PathBuf,
    /// Location on disk, always inside the destination directory.
    pub local_path: PathBuf,
}

/// Unpacks every entry of a `.tar.gz` archive into `destination`.
///
/// Only regular files are reported. Leading roots are stripped from absolute
/// entries, so `/tmp/x.txt` lands at `destination/tmp/x.txt`. Entries with a
/// `..` component are skipped and never reported.
pub fn extract_archive(
    archive_path: &Path,
    destination: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path).map_err(|source| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let read_error = |source: io::Error| ExtractError::Read {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut extracted = Vec::new();
    for entry in archive.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        let raw_path = entry.path().map_err(read_error)?.into_owned();
        let is_regular_file = entry.header().entry_type().is_file();

        let unpacked = entry
            .unpack_in(destination)
            .map_err(|source| ExtractError::Unpack {
                entry: raw_path.clone(),
                source,
            })?;

        if !unpacked || !is_regular_file {
            continue;
        }
        if let Some(entry_path) = contained_entry_path(&raw_path) {
            extracted.push(ExtractedFile {
                local_path: destination.join(&entry_path),
                entry_path,
            });
        }
    }

    Ok(extracted)
}

/// Relative location `unpack_in` writes an entry to: normal components only.
/// `None` for entries it refuses (`..`) or that name no file.
fn contained_entry_path(entry_path: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in entry_path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::ParentDir => return None,
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use super::*;
    use crate::test_helpers::build_tar_gz;

    fn write_archive(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("fixture.tar.gz");
        let mut file = File::create(&path).expect("archive file should be created");
        file.write_all(bytes).expect("archive should be written");
        path
    }

    #[test]
    fn extracts_regular_files_including_nested_ones() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let archive = write_archive(
            scratch.path(),
            &build_tar_gz(&[
                ("top.txt", b"top".as_slice()),
                ("nested/deep.csv", b"a,b\n".as_slice()),
            ]),
        );
        let destination = scratch.path().join("out");
        fs::create_dir_all(&destination).expect("destination should be created");

        let extracted = extract_archive(&archive, &destination).expect("extract should pass");

        let entry_paths: Vec<_> = extracted.iter().map(|file| file.entry_path.clone()).collect();
        assert_eq!(
            entry_paths,
            vec![PathBuf::from("top.txt"), PathBuf::from("nested/deep.csv")]
        );
        assert_eq!(
            fs::read(destination.join("nested/deep.csv")).expect("file should exist"),
            b"a,b\n"
        );
        assert!(extracted
            .iter()
            .all(|file| file.local_path.starts_with(&destination)));
    }

    #[test]
    fn absolute_entry_is_written_and_reported_inside_destination() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let archive = write_archive(
            scratch.path(),
            &build_tar_gz(&[("/tmp/absolute-entry.txt", b"from archive".as_slice())]),
        );
        let destination = scratch.path().join("out");
        fs::create_dir_all(&destination).expect("destination should be created");

        let extracted = extract_archive(&archive, &destination).expect("extract should pass");

        assert_eq!(
            extracted,
            vec![ExtractedFile {
                entry_path: PathBuf::from("tmp/absolute-entry.txt"),
                local_path: destination.join("tmp/absolute-entry.txt"),
            }]
        );
        assert_eq!(
            fs::read(&extracted[0].local_path).expect("file should exist"),
            b"from archive"
        );
    }

    #[test]
    fn parent_dir_entry_is_skipped() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let archive = write_archive(
            scratch.path(),
            &build_tar_gz(&[
                ("../escape.txt", b"outside".as_slice()),
                ("kept.txt", b"inside".as_slice()),
            ]),
        );
        let destination = scratch.path().join("out");
        fs::create_dir_all(&destination).expect("destination should be created");

        let extracted = extract_archive(&archive, &destination).expect("extract should pass");

        let entry_paths: Vec<_> = extracted.iter().map(|file| file.entry_path.clone()).collect();
        assert_eq!(entry_paths, vec![PathBuf::from("kept.txt")]);
        assert!(!scratch.path().join("escape.txt").exists());
    }

    #[test]
    fn rejects_non_gzip_input() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let archive = write_archive(scratch.path(), b"definitely not gzip");

        let error = extract_archive(&archive, scratch.path()).expect_err("garbage should fail");
        assert!(matches!(error, ExtractError::Read { .. }));
    }

    #[test]
    fn missing_archive_reports_open_error() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let error = extract_archive(&scratch.path().join("absent.tar.gz"), scratch.path())
            .expect_err("missing file should fail");
        assert!(matches!(error, ExtractError::Open { .. }));
    }
}
