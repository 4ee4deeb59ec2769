//! Filesystem boundary for submission artifacts

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWrite;

/// Creates and removes the on-disk source file of a submission
#[async_trait]
pub trait FileManager: Send + Sync {
    type Handle: AsyncWrite + Unpin + Send;

    /// Create `path`, truncating it if it already exists
    async fn create(&self, path: &Path) -> io::Result<Self::Handle>;

    /// Remove `path`; a path that no longer exists counts as removed
    async fn remove(&self, path: &Path) -> io::Result<()>;
}

/// `FileManager` backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileManager;

#[async_trait]
impl FileManager for LocalFileManager {
    type Handle = fs::File;

    async fn create(&self, path: &Path) -> io::Result<fs::File> {
        fs::File::create(path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };

        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.js");
        std::fs::write(&path, "a much longer previous submission").unwrap();

        let mut file = LocalFileManager.create(&path).await.unwrap();
        file.write_all(b"short").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("main.js");

        let err = LocalFileManager.create(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();

        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main").unwrap();
        LocalFileManager.remove(&file).await.unwrap();
        assert!(!file.exists());

        let nested = dir.path().join("build");
        std::fs::create_dir_all(nested.join("out")).unwrap();
        std::fs::write(nested.join("out").join("a.txt"), "x").unwrap();
        LocalFileManager.remove(&nested).await.unwrap();
        assert!(!nested.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_path_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        LocalFileManager
            .remove(&dir.path().join("never-written.py"))
            .await
            .unwrap();
    }
}
