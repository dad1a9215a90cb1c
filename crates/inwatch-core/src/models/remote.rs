//! Files as reported by the storage provider.

use serde::{Deserialize, Serialize};

/// A file found in the watched folder.
///
/// Snapshot from a single listing call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-assigned, unique file ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl RemoteFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Body of a Drive `files.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_list() {
        let body = r#"{"files": [
            {"id": "abc123", "name": "invoice1.pdf"},
            {"id": "def456", "name": "invoice2.pdf"}
        ]}"#;

        let list: FileList = serde_json::from_str(body).unwrap();
        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0], RemoteFile::new("abc123", "invoice1.pdf"));
    }

    #[test]
    fn test_parse_empty_file_list() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }
}
