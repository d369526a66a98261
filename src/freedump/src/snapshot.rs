//! Snapshot Codec
//!
//! On-disk layout of a captured snapshot:
//!
//! ```text
//! <output_dir>/<DD-MM-HH-MM-SS>/
//!     info.freedump                  JSON array of manifest entries
//!     <base_hex>-<size_hex>.dump     raw bytes of each captured range
//! ```

use crate::error::{Error, Result};
use crate::model::{deserialize_u64_any, FileInfo, MemoryBlock, MemoryDump, MemoryRange};

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the manifest inside a snapshot directory
pub const MANIFEST_FILE_NAME: &str = "info.freedump";

/// `strftime` format of snapshot directory names
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%H-%M-%S";

/// One captured range as stored in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(deserialize_with = "deserialize_u64_any")]
    pub base: u64,
    #[serde(deserialize_with = "deserialize_u64_any")]
    pub size: u64,
    pub protection: String,
    pub file: FileInfo,
    /// Path of the `.dump` file holding the range's bytes
    pub filepath_dump: String,
}

impl ManifestEntry {
    pub fn new(range: &MemoryRange, filepath_dump: String) -> Self {
        let info = range.as_info();
        ManifestEntry {
            base: info.base,
            size: info.size,
            protection: info.protection,
            file: info.file,
            filepath_dump,
        }
    }

    /// Build a block whose dump file is opened on first read.
    ///
    /// A relative `filepath_dump` is taken relative to `snapshot_dir`.
    pub fn into_block(self, snapshot_dir: &Path) -> Result<MemoryBlock> {
        let range = MemoryRange::new(self.base, self.size, &self.protection, self.file)?;

        let dump_path = PathBuf::from(&self.filepath_dump);
        let dump_path = if dump_path.is_relative() {
            snapshot_dir.join(dump_path)
        } else {
            dump_path
        };

        Ok(MemoryBlock::from_dump(range, MemoryDump::lazy(dump_path)))
    }
}

/// `<base>-<size>.dump`, both in lowercase hex without prefix
pub fn dump_file_name(range: &MemoryRange) -> String {
    format!("{:x}-{:x}.dump", range.base(), range.size())
}

/// Save blocks into a new timestamped directory under `output_directory`.
///
/// Returns the path of the written manifest.
pub fn save<P: AsRef<Path>>(blocks: &[MemoryBlock], output_directory: P) -> Result<PathBuf> {
    let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    save_to(blocks, output_directory.as_ref().join(stamp))
}

/// Save blocks into `snapshot_dir`, which must not exist yet.
///
/// A failure part way leaves the files written so far in place.
pub fn save_to<P: AsRef<Path>>(blocks: &[MemoryBlock], snapshot_dir: P) -> Result<PathBuf> {
    let snapshot_dir = snapshot_dir.as_ref();

    if let Some(parent) = snapshot_dir.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir(snapshot_dir).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => Error::DirectoryExists(snapshot_dir.to_path_buf()),
        _ => Error::Io(e),
    })?;
    let snapshot_dir = snapshot_dir.canonicalize()?;

    let mut entries = Vec::with_capacity(blocks.len());
    for block in blocks {
        let dump_path = snapshot_dir.join(dump_file_name(&block.range));
        tracing::debug!("Writing {} to {:?}", block.range, dump_path);

        fs::write(&dump_path, block.data.bytes()?)?;
        entries.push(ManifestEntry::new(
            &block.range,
            dump_path.to_string_lossy().into_owned(),
        ));
    }

    let manifest_path = snapshot_dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string(&entries).map_err(io::Error::other)?;
    fs::write(&manifest_path, json)?;

    tracing::info!(
        "Saved {} ranges to {}",
        entries.len(),
        snapshot_dir.display()
    );
    Ok(manifest_path)
}

/// Parse a manifest into blocks backed by lazily opened dump files
pub fn load<P: AsRef<Path>>(manifest: P) -> Result<Vec<MemoryBlock>> {
    let manifest = manifest.as_ref();
    tracing::info!("Loading snapshot manifest {:?}", manifest);

    let bytes = fs::read(manifest)?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_slice(&bytes).map_err(|source| Error::ManifestParse {
            path: manifest.to_path_buf(),
            source,
        })?;

    let snapshot_dir = manifest.parent().unwrap_or_else(|| Path::new(""));
    entries
        .into_iter()
        .map(|entry| entry.into_block(snapshot_dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn block(base: u64, bytes: Vec<u8>, protection: &str) -> MemoryBlock {
        let range =
            MemoryRange::new(base, bytes.len() as u64, protection, FileInfo::anonymous()).unwrap();
        MemoryBlock::from_bytes(range, bytes)
    }

    fn sample_blocks() -> Vec<MemoryBlock> {
        vec![
            block(0x7f00_0000_0000, (0..=255).collect(), "r-x"),
            block(0x1000, vec![0xcc; 0x10], "rw-"),
        ]
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let blocks = sample_blocks();

        let manifest = save_to(&blocks, tmp.path().join("snap")).unwrap();
        let loaded = load(&manifest).unwrap();

        assert_eq!(loaded.len(), blocks.len());
        for (original, restored) in blocks.iter().zip(&loaded) {
            assert_eq!(original.range, restored.range);
            assert_eq!(
                restored.read(0, restored.range.size()).unwrap(),
                original.data.bytes().unwrap()
            );
        }
    }

    #[test]
    fn test_directory_layout() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("snap");
        let manifest = save_to(&sample_blocks(), &dir).unwrap();

        assert_eq!(manifest.file_name().unwrap(), MANIFEST_FILE_NAME);
        assert!(dir.join("7f0000000000-100.dump").is_file());
        assert_eq!(fs::read(dir.join("1000-10.dump")).unwrap(), vec![0xcc; 0x10]);
    }

    #[test]
    fn test_manifest_schema() {
        let tmp = TempDir::new().unwrap();
        let manifest = save_to(&sample_blocks(), tmp.path().join("snap")).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);

        let second = &entries[1];
        assert_eq!(second["base"], 0x1000);
        assert_eq!(second["size"], 0x10);
        assert_eq!(second["protection"], "rw-");
        assert_eq!(second["file"]["path"], "");
        assert_eq!(second["file"]["offset"], 0);
        assert_eq!(second["file"]["size"], 0);

        let dump = PathBuf::from(second["filepath_dump"].as_str().unwrap());
        assert!(dump.is_absolute());
        assert!(dump.ends_with("1000-10.dump"));
    }

    #[test]
    fn test_save_refuses_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("snap");
        fs::create_dir(&dir).unwrap();

        let err = save_to(&sample_blocks(), &dir).unwrap_err();
        assert!(matches!(err, Error::DirectoryExists(_)));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_save_timestamped_directory() {
        let tmp = TempDir::new().unwrap();
        let manifest = save(&sample_blocks(), tmp.path().join("out")).unwrap();

        let dir_name = manifest
            .parent()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        let fields: Vec<&str> = dir_name.split('-').collect();
        assert_eq!(fields.len(), 5);
        assert!(fields.iter().all(|f| f.len() == 2 && f.parse::<u8>().is_ok()));
    }

    #[test]
    fn test_load_is_lazy() {
        let tmp = TempDir::new().unwrap();
        let manifest = save_to(&sample_blocks(), tmp.path().join("snap")).unwrap();
        let loaded = load(&manifest).unwrap();

        for block in &loaded {
            match &block.data {
                crate::model::BlockData::Dump(dump) => assert!(!dump.is_opened()),
                crate::model::BlockData::Raw(_) => panic!("expected a dump-backed block"),
            }
        }
    }

    #[test]
    fn test_load_malformed_json() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE_NAME);
        fs::write(&manifest, "[{\"base\": 4096,").unwrap();

        assert!(matches!(load(&manifest), Err(Error::ManifestParse { .. })));
    }

    #[test]
    fn test_load_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE_NAME);
        fs::write(&manifest, [b'[', b'"', 0xff, 0xfe, b'"', b']']).unwrap();

        assert!(matches!(load(&manifest), Err(Error::ManifestParse { .. })));
    }

    #[test]
    fn test_load_missing_field() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE_NAME);
        fs::write(
            &manifest,
            r#"[{"base": 4096, "size": 16, "protection": "r--", "filepath_dump": "a.dump"}]"#,
        )
        .unwrap();

        assert!(matches!(load(&manifest), Err(Error::ManifestParse { .. })));
    }

    #[test]
    fn test_load_relative_dump_path_and_hex_base() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("2000-4.dump"), [1u8, 2, 3, 4]).unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE_NAME);
        fs::write(
            &manifest,
            r#"[{"base": "0x2000", "size": 4, "protection": "r--",
                 "file": {"path": "", "offset": 0, "size": 0},
                 "filepath_dump": "2000-4.dump"}]"#,
        )
        .unwrap();

        let loaded = load(&manifest).unwrap();
        assert_eq!(loaded[0].range.base(), 0x2000);
        assert_eq!(loaded[0].read(1, 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_load_invalid_range() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE_NAME);
        fs::write(
            &manifest,
            r#"[{"base": 4096, "size": 0, "protection": "r--",
                 "file": {"path": "", "offset": 0, "size": 0},
                 "filepath_dump": "x.dump"}]"#,
        )
        .unwrap();

        assert!(matches!(load(&manifest), Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_partial_block_saved_as_captured() {
        let tmp = TempDir::new().unwrap();
        let range = MemoryRange::new(0x5000, 0x100, "r--", FileInfo::anonymous()).unwrap();
        let partial = MemoryBlock::from_bytes(range, vec![9; 0x40]);

        let manifest = save_to(&[partial], tmp.path().join("snap")).unwrap();
        let loaded = load(&manifest).unwrap();

        assert_eq!(loaded[0].range.size(), 0x100);
        assert_eq!(loaded[0].read(0, 0x100).unwrap(), vec![9; 0x40]);
        assert!(loaded[0].is_partial().unwrap());
    }
}
