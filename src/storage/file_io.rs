//! File I/O utilities with atomic writes
//!
//! Provides safe JSON file operations that won't corrupt data on failure.

use std::io;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{BkupError, BkupResult};
use crate::fs::FileSystem;

/// Read JSON from a file, returning `None` if the file doesn't exist
///
/// Content that does not parse is reported as `BkupError::ConfigCorrupt`;
/// any other read failure is `BkupError::Io`.
pub fn read_json<T, F>(fs: &F, path: &Path) -> BkupResult<Option<T>>
where
    T: DeserializeOwned,
    F: FileSystem + ?Sized,
{
    let bytes = match fs.read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BkupError::io("read", path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| BkupError::ConfigCorrupt(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely replaced or not modified at all; a crash
/// leaves at most a stray `.tmp` sibling behind.
pub fn write_json_atomic<T, F>(fs: &F, path: &Path, data: &T) -> BkupResult<()>
where
    T: Serialize,
    F: FileSystem + ?Sized,
{
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .map_err(|e| BkupError::io("create directory", parent, e))?;
    }

    let json = serde_json::to_vec_pretty(data)
        .map_err(|e| BkupError::Io(format!("Failed to serialize {}: {}", path.display(), e)))?;

    // Temp file in the same directory so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    if let Err(e) = fs.write(&temp_path, &json) {
        let _ = fs.remove_file(&temp_path);
        return Err(BkupError::io("write", &temp_path, e));
    }

    fs.rename(&temp_path, path).map_err(|e| {
        let _ = fs.remove_file(&temp_path);
        BkupError::io("rename", &temp_path, e)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryFs, RealFs};
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_read_nonexistent_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let data: Option<TestData> = read_json(&RealFs, &path).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json_atomic(&RealFs, &path, &data).unwrap();
        assert!(path.exists());

        let loaded: Option<TestData> = read_json(&RealFs, &path).unwrap();
        assert_eq!(loaded, Some(data));
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");
        let temp_path = temp_dir.path().join("test.json.tmp");

        write_json_atomic(&RealFs, &path, &TestData::default()).unwrap();

        assert!(path.exists());
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("test.json");

        write_json_atomic(&RealFs, &path, &TestData::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let fs = MemoryFs::new();
        let path = Path::new("/broken.json");
        fs.write(path, b"not json at all").unwrap();

        let err = read_json::<TestData, _>(&fs, path).unwrap_err();
        assert!(matches!(err, BkupError::ConfigCorrupt(_)));
    }

    #[test]
    fn test_failed_write_keeps_previous_content() {
        let fs = MemoryFs::new();
        let path = Path::new("/data.json");
        let original = TestData {
            name: "original".into(),
            value: 1,
        };
        write_json_atomic(&fs, path, &original).unwrap();

        fs.fail_writes_where(|p| p.ends_with("data.json.tmp"));
        let replacement = TestData {
            name: "replacement".into(),
            value: 2,
        };
        assert!(write_json_atomic(&fs, path, &replacement).is_err());

        let loaded: Option<TestData> = read_json(&fs, path).unwrap();
        assert_eq!(loaded, Some(original));
        assert!(!fs.exists(Path::new("/data.json.tmp")));
    }
}
