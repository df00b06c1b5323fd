//! Document upload operations against the REST API.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use wharf_transport::{DigestClient, Multipart, RequestBody, RequestParams, random_boundary};
use wharf_watcher::DocumentSink;

use crate::error::{DocumentError, Result};

/// One file staged for a batch upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Target document URI.
    pub uri: String,

    /// Local file holding the content.
    pub path: PathBuf,
}

impl DocumentUpload {
    /// Stage `path` for upload at `uri`.
    pub fn new(uri: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            path: path.into(),
        }
    }
}

/// Uploads documents through the REST API.
///
/// Also serves as the [`DocumentSink`] behind a deploy watch, so watched
/// changes and scripted uploads share one code path.
#[derive(Clone)]
pub struct DocumentStore {
    client: DigestClient,
    rest: RequestParams,
}

impl DocumentStore {
    /// Create a store talking to the REST API described by `rest`.
    pub fn new(client: DigestClient, rest: RequestParams) -> Self {
        Self { client, rest }
    }

    /// Insert or replace one document from a local file.
    ///
    /// The content type is inferred from the file extension; unknown
    /// extensions upload as `application/octet-stream`. The server answers
    /// 201 for a new document and 204 for a replacement, anything else is
    /// an error.
    pub async fn insert(&self, database: &str, uri: &str, file: &Path) -> Result<()> {
        let content = tokio::fs::read(file).await?;
        let content_type = mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let path = format!(
            "/v1/documents?uri={}&database={}",
            urlencoding::encode(uri),
            urlencoding::encode(database)
        );

        debug!("Inserting {uri} into {database} from {}", file.display());
        let response = self
            .client
            .put(
                &self.rest,
                &path,
                RequestBody::Raw {
                    content,
                    content_type,
                },
            )
            .await?;
        if !response.status.is_success() {
            return Err(DocumentError::UnexpectedStatus {
                status: response.status,
                uri: uri.to_string(),
            });
        }
        Ok(())
    }

    /// Insert a set of documents in one `multipart/mixed` request.
    ///
    /// Each part carries its target URI in a `Content-Disposition` header
    /// and the raw file bytes as its body.
    pub async fn insert_batch(&self, database: &str, uploads: &[DocumentUpload]) -> Result<()> {
        let mut multipart = Multipart::new(random_boundary());
        for upload in uploads {
            multipart.add_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", upload.uri),
            );
            multipart.add_body(tokio::fs::read(&upload.path).await?);
        }

        let path = format!("/v1/documents?database={}", urlencoding::encode(database));
        let body = RequestBody::Raw {
            content: multipart.encode(),
            content_type: multipart.content_type(),
        };
        let response = self.client.post(&self.rest, &path, body).await?;
        if !response.status.is_success() {
            return Err(DocumentError::UnexpectedStatus {
                status: response.status,
                uri: "/v1/documents".to_string(),
            });
        }
        info!("Uploaded {} documents to {database}", uploads.len());
        Ok(())
    }
}

#[async_trait]
impl DocumentSink for DocumentStore {
    async fn insert(&self, database: &str, uri: &str, file: &Path) -> anyhow::Result<()> {
        Ok(DocumentStore::insert(self, database, uri, file).await?)
    }
}
