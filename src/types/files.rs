use serde::{Deserialize, Serialize};

/// Metadata the backend records for a stored upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    /// The file name as supplied by the client.
    pub original_name: String,

    /// The unique name the backend saved the file under.
    pub saved_name: String,

    /// Server-side path, fed back into the process endpoint.
    pub file_path: String,

    /// Size of the stored file in bytes.
    pub size: u64,

    /// MIME type as reported at upload time.
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

/// Per-file outcome within an upload response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    /// Whether the backend accepted and stored this file.
    pub success: bool,

    /// Stored-file metadata, present on success.
    #[serde(default)]
    pub file_info: Option<FileInfo>,

    /// Backend-reported reason, present on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response body of the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// Human-readable summary from the backend.
    pub message: String,

    /// One entry per uploaded file, in submission order.
    pub results: Vec<UploadResult>,
}

/// Request body of the process endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest {
    /// Server-side path of a previously uploaded file.
    pub file_path: String,

    /// Text chunk size used when splitting the document.
    pub chunk_size: usize,

    /// Upper bound on the number of best-matching segments returned.
    pub return_best: usize,
}

/// Response body of the process endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    /// Extracted text assembled from the best-matching segments.
    pub content: String,
}

/// A locally recorded upload: created once the upload+process round trip
/// succeeds and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// MIME type sent with the upload.
    pub content_type: String,

    /// Extracted text returned by the process endpoint.
    pub content: String,

    /// Server-side path of the stored file.
    pub file_path: String,
}
