//! Listing and downloading files from the watched Drive folder.

mod client;

pub use client::{folder_query, DriveClient};

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::DriveError;
use crate::ledger::KnownFiles;
use crate::models::remote::RemoteFile;

/// MIME type of the files the watcher picks up.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Remote file storage the watcher polls.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List files of `mime_type` directly inside `folder_id`.
    async fn list_files(&self, folder_id: &str, mime_type: &str) -> Result<Vec<RemoteFile>, DriveError>;

    /// Stream the contents of `file_id` into `dest`, replacing it.
    ///
    /// Returns the number of bytes written. On error `dest` may hold a
    /// partial download.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, DriveError>;
}

/// PDFs in `folder_id` that are not in the ledger yet.
///
/// Provider failures are logged and reported as an empty list.
pub async fn list_new_pdfs<S: RemoteStore + ?Sized>(
    store: &S,
    folder_id: &str,
    known: &KnownFiles,
) -> Vec<RemoteFile> {
    match store.list_files(folder_id, PDF_MIME_TYPE).await {
        Ok(files) => {
            let total = files.len();
            let new_files: Vec<RemoteFile> =
                files.into_iter().filter(|f| !known.contains(&f.id)).collect();
            debug!(total, new = new_files.len(), "Listed folder {}", folder_id);
            new_files
        }
        Err(e) => {
            error!(folder_id, "Drive API error while listing files: {}", e);
            Vec::new()
        }
    }
}

/// Download `file_id` into `dest`. Returns whether the download completed.
///
/// Failures are logged; after a failure `dest` may be partial or missing.
pub async fn fetch_to_path<S: RemoteStore + ?Sized>(store: &S, file_id: &str, dest: &Path) -> bool {
    match store.download(file_id, dest).await {
        Ok(bytes) => {
            debug!(file_id, bytes, "Downloaded to {}", dest.display());
            true
        }
        Err(DriveError::PermissionDenied(_)) => {
            error!(
                file_id,
                "No access to file {}. Make sure the application has the required permissions.",
                file_id
            );
            false
        }
        Err(e) => {
            error!(file_id, "Failed to download file {}: {}", file_id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FakeStore {
        files: Vec<RemoteFile>,
        fail: bool,
    }

    #[async_trait]
    impl RemoteStore for FakeStore {
        async fn list_files(&self, _folder_id: &str, mime_type: &str) -> Result<Vec<RemoteFile>, DriveError> {
            assert_eq!(mime_type, PDF_MIME_TYPE);
            if self.fail {
                return Err(DriveError::Status {
                    status: 500,
                    body: "backend error".to_string(),
                });
            }
            Ok(self.files.clone())
        }

        async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, DriveError> {
            if self.fail {
                return Err(DriveError::PermissionDenied(file_id.to_string()));
            }
            std::fs::write(dest, file_id)?;
            Ok(file_id.len() as u64)
        }
    }

    #[tokio::test]
    async fn test_known_files_are_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let mut known = KnownFiles::load(dir.path().join("known_files.txt")).unwrap();
        known.append("abc123").unwrap();

        let store = FakeStore {
            files: vec![
                RemoteFile::new("abc123", "invoice1.pdf"),
                RemoteFile::new("def456", "invoice2.pdf"),
            ],
            fail: false,
        };

        let new_files = list_new_pdfs(&store, "folder", &known).await;
        assert_eq!(new_files, vec![RemoteFile::new("def456", "invoice2.pdf")]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let known = KnownFiles::load(dir.path().join("known_files.txt")).unwrap();
        let store = FakeStore {
            files: vec![RemoteFile::new("abc123", "invoice1.pdf")],
            fail: true,
        };

        assert!(list_new_pdfs(&store, "folder", &known).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("temp_abc123.pdf");

        let ok = FakeStore { files: vec![], fail: false };
        assert!(fetch_to_path(&ok, "abc123", &dest).await);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "abc123");

        let denied = FakeStore { files: vec![], fail: true };
        assert!(!fetch_to_path(&denied, "abc123", &dest).await);
    }
}
