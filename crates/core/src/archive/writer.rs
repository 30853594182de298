//! Zip writer for finished workspaces.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::ArchiveError;

/// One file to place in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk.
    pub source: PathBuf,
    /// Name inside the archive.
    pub name: String,
}

impl ArchiveEntry {
    /// Entry named after the source's file name.
    pub fn from_path(source: PathBuf) -> Self {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { source, name }
    }
}

/// A finished archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub entries: usize,
    pub size_bytes: u64,
}

/// Orders entries by numeric file stem, then by name.
///
/// `10.gif` sorts after `9.gif`.
pub fn sort_entries(entries: &mut [ArchiveEntry]) {
    entries.sort_by(|a, b| {
        let key = |e: &ArchiveEntry| {
            Path::new(&e.name)
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
        };
        match (key(a), key(b)) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    });
}

/// Writes `entries` into a new zip at `dest`.
///
/// Runs on the blocking pool. On failure the partial file is removed.
pub async fn write_archive(
    mut entries: Vec<ArchiveEntry>,
    dest: &Path,
) -> Result<ArchiveInfo, ArchiveError> {
    sort_entries(&mut entries);

    let mut seen = HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.name.as_str()) {
            return Err(ArchiveError::DuplicateEntry {
                name: entry.name.clone(),
            });
        }
    }

    let dest_owned = dest.to_path_buf();
    let result = tokio::task::spawn_blocking(move || write_blocking(&entries, &dest_owned))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))
        .and_then(|r| r);

    match result {
        Ok(info) => {
            debug!(path = %info.path.display(), entries = info.entries, bytes = info.size_bytes, "Archive written");
            Ok(info)
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(dest).await {
                if rm.kind() != io::ErrorKind::NotFound {
                    debug!(path = %dest.display(), error = %rm, "Failed to remove partial archive");
                }
            }
            Err(e)
        }
    }
}

fn write_blocking(entries: &[ArchiveEntry], dest: &Path) -> Result<ArchiveInfo, ArchiveError> {
    for entry in entries {
        if !entry.source.is_file() {
            return Err(ArchiveError::EntryNotFound {
                path: entry.source.clone(),
            });
        }
    }

    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        let mut input = File::open(&entry.source)?;
        io::copy(&mut input, &mut writer)?;
    }

    let mut inner = writer.finish()?;
    io::Write::flush(&mut inner)?;
    drop(inner);

    Ok(ArchiveInfo {
        path: dest.to_path_buf(),
        entries: entries.len(),
        size_bytes: std::fs::metadata(dest)?.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn entry(dir: &Path, name: &str, content: &[u8]) -> ArchiveEntry {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        ArchiveEntry::from_path(path)
    }

    #[test]
    fn test_sort_entries_numeric() {
        let mut entries: Vec<ArchiveEntry> = ["10.gif", "2.webm", "1.webp", "readme"]
            .iter()
            .map(|n| ArchiveEntry {
                source: PathBuf::from(n),
                name: n.to_string(),
            })
            .collect();
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["1.webp", "2.webm", "10.gif", "readme"]);
    }

    #[tokio::test]
    async fn test_write_archive() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            entry(dir.path(), "3.gif", b"three"),
            entry(dir.path(), "1.gif", b"one"),
        ];
        let dest = dir.path().join("out.zip");

        let info = write_archive(entries, &dest).await.unwrap();
        assert_eq!(info.entries, 2);
        assert!(info.size_bytes > 0);

        let mut zip = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), "1.gif");
        let mut content = String::new();
        zip.by_name("3.gif")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "three");
    }

    #[tokio::test]
    async fn test_empty_archive_is_valid() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.zip");
        let info = write_archive(Vec::new(), &dest).await.unwrap();
        assert_eq!(info.entries, 0);
        let zip = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_entry_removes_partial() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.zip");
        let entries = vec![ArchiveEntry::from_path(dir.path().join("missing.gif"))];

        let err = write_archive(entries, &dest).await.unwrap_err();
        assert!(matches!(err, ArchiveError::EntryNotFound { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(dir.path(), "1.gif", b"x")];
        let dest = dir.path().join("no-such-dir").join("out.zip");

        let err = write_archive(entries, &dest).await.unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let dir = TempDir::new().unwrap();
        let a = entry(dir.path(), "1.gif", b"x");
        let b = ArchiveEntry {
            source: a.source.clone(),
            name: "1.gif".into(),
        };
        let err = write_archive(vec![a, b], &dir.path().join("o.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry { .. }));
    }
}
