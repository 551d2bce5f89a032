//! File service API response types

use serde::{Deserialize, Serialize};

/// One entry in the `GET /files` listing
///
/// The server may attach more fields (size, upload time); only the filename
/// matters for reconciliation, so everything else is ignored on parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Stored filename
    pub filename: String,
}

/// `GET /files` response
#[derive(Debug, Deserialize)]
pub struct FilesListResponse {
    /// All files held for this device identity
    pub files: Vec<FileEntry>,
}

/// `POST /files` response
///
/// `duplicate` reports a server-side content-level match; the upload was
/// skipped, not stored twice.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub duplicate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_files_list_ignores_extra_fields() {
        let json = r#"{
            "files": [
                {"filename": "IMG_0001.jpg", "size": 12345},
                {"filename": "IMG_0002.jpg"}
            ]
        }"#;

        let response: FilesListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.files.len(), 2);
        assert_eq!(response.files[0].filename, "IMG_0001.jpg");
    }

    #[test]
    fn test_deserialize_upload_response_defaults() {
        let response: UploadResponse = serde_json::from_str("{}").unwrap();
        assert!(!response.duplicate);

        let response: UploadResponse = serde_json::from_str(r#"{"duplicate": true}"#).unwrap();
        assert!(response.duplicate);
    }
}
