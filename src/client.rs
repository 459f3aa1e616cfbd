use std::env;
use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_ERRORS, UPLOADS, UPLOAD_ERRORS};
use crate::stream::{StreamEvent, demux_stream};
use crate::types::{ChatRequest, ChatResponse, FileInfo, ProcessRequest, ProcessResponse, UploadResponse};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the RAG chat backend.
///
/// Chat requests carry no overall timeout: streams are open-ended and there
/// is deliberately no mid-stream cancellation. Uploads get a per-request
/// timeout that aborts the transfer when it expires.
#[derive(Debug, Clone)]
pub struct RagChat {
    client: ReqwestClient,
    base_url: String,
    upload_timeout: Duration,
}

impl RagChat {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the
    /// RAGCHAT_BASE_URL environment variable, falling back to a localhost
    /// default.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, upload_timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var("RAGCHAT_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;

        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            upload_timeout: upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
        })
    }

    /// Returns the resolved base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a reqwest transport error into our Error type.
    fn transport_error(e: reqwest::Error, timeout: Option<Duration>) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        // FastAPI reports errors as {"detail": ...}; fall back to the raw
        // body when the shape is anything else.
        let message = serde_json::from_str::<serde_json::Value>(&error_body)
            .ok()
            .and_then(|v| {
                v.get("detail").map(|d| match d.as_str() {
                    Some(s) => s.to_string(),
                    None => d.to_string(),
                })
            })
            .unwrap_or(error_body);

        match status_code {
            400 => Error::bad_request(message, None),
            404 => Error::not_found(message),
            408 => Error::timeout(message, None),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(message),
            _ => Error::api(status_code, message),
        }
    }

    /// Send a prompt and get the complete response in one shot.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        CLIENT_REQUESTS.click();
        let response = self
            .client
            .post(self.endpoint("api/llm/chat"))
            .headers(self.default_headers())
            .json(&ChatRequest::new(prompt))
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                Self::transport_error(e, None)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let body = response.json::<ChatResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(body.response)
    }

    /// Send a prompt and get a streaming response.
    ///
    /// Returns a stream of [`StreamEvent`]s: the visible text in order,
    /// with the usage marker decoded out of band.
    pub async fn chat_stream(
        &self,
        prompt: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>> {
        CLIENT_REQUESTS.click();
        let mut headers = self.default_headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/plain"));

        let response = self
            .client
            .post(self.endpoint("api/llm/chat/stream"))
            .headers(headers)
            .json(&ChatRequest::new(prompt))
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                Self::transport_error(e, None)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let bytes = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {}", e), Some(Box::new(e)))
            })
        });

        Ok(Box::pin(demux_stream(bytes)))
    }

    /// Upload a single file as a multipart request.
    ///
    /// Returns the stored-file metadata, whose `file_path` feeds
    /// [`RagChat::process_file`].
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<FileInfo> {
        UPLOADS.click();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| {
                Error::validation(
                    format!("Invalid content type {:?}: {}", content_type, e),
                    Some("content_type".to_string()),
                )
            })?;
        let form = Form::new().part("files", part);

        let response = self
            .client
            .post(self.endpoint("api/files/upload"))
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| {
                UPLOAD_ERRORS.click();
                Self::transport_error(e, Some(self.upload_timeout))
            })?;

        if !response.status().is_success() {
            UPLOAD_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let body = response.json::<UploadResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse upload response: {}", e),
                Some(Box::new(e)),
            )
        })?;

        let Some(result) = body.results.into_iter().next() else {
            UPLOAD_ERRORS.click();
            return Err(Error::serialization(
                "Upload response contained no results",
                None,
            ));
        };
        if !result.success {
            UPLOAD_ERRORS.click();
            let message = result
                .error
                .unwrap_or_else(|| "Upload rejected by the backend".to_string());
            return Err(Error::bad_request(message, Some("files".to_string())));
        }
        result.file_info.ok_or_else(|| {
            Error::serialization("Upload result is missing file_info", None)
        })
    }

    /// Process a previously uploaded file into extracted text.
    pub async fn process_file(
        &self,
        file_path: &str,
        chunk_size: usize,
        return_best: usize,
    ) -> Result<String> {
        CLIENT_REQUESTS.click();
        let request = ProcessRequest {
            file_path: file_path.to_string(),
            chunk_size,
            return_best,
        };

        let response = self
            .client
            .post(self.endpoint("api/files/process"))
            .headers(self.default_headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                Self::transport_error(e, None)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let body = response.json::<ProcessResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse process response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(body.content)
    }
}

/// Validate the base URL and guarantee a trailing slash so endpoint paths
/// join predictably.
fn normalize_base_url(base_url: &str) -> Result<String> {
    Url::parse(base_url)?;
    if base_url.ends_with('/') {
        Ok(base_url.to_string())
    } else {
        Ok(format!("{}/", base_url))
    }
}
