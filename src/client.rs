//! HTTP collaborators: corpus listing, document fetch, entity extraction.
//!
//! [`HttpCorpusClient`] implements all three collaborator traits against
//! the source's REST APIs. Listing paginates with a next-page token;
//! document fetch and entity analysis are single calls. Token acquisition
//! is out of scope — a pre-obtained bearer token may be supplied in the
//! config and is attached to every request.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::SourceConfig;
use crate::document::Document;
use crate::entities::RawEntity;
use crate::error::IndexError;
use crate::indexer::{CorpusSearch, DocumentFetcher, EntityAnalyzer};
use crate::models::DiscoveredDoc;

/// Cloning is cheap: the underlying `reqwest::Client` is reference-counted.
#[derive(Clone)]
pub struct HttpCorpusClient {
    http: reqwest::Client,
    config: SourceConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<FileItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    md5_checksum: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeEntitiesResponse {
    #[serde(default)]
    entities: Vec<RawEntity>,
}

impl HttpCorpusClient {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(url))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn check_status(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, IndexError> {
        match response.status() {
            StatusCode::NOT_FOUND => Err(IndexError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(IndexError::AccessDenied(what.to_string()))
            }
            _ => Ok(response.error_for_status()?),
        }
    }
}

#[async_trait]
impl CorpusSearch for HttpCorpusClient {
    async fn search(
        &self,
        query: &str,
        corpus_id: &str,
        corpora: &str,
        on_result: &mut (dyn FnMut(DiscoveredDoc) -> Result<(), IndexError> + Send),
    ) -> Result<(), IndexError> {
        let url = format!("{}/files", self.config.drive_base_url);
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .get(&url)
                .query(&[
                    ("q", query),
                    ("driveId", corpus_id),
                    ("corpora", corpora),
                    ("fields", "nextPageToken, files(id, name, mimeType, md5Checksum)"),
                ])
                .query(&[("pageSize", self.config.page_size)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = Self::check_status(request.send().await?, "file listing")?;
            let page: FileList = response.json().await?;

            for f in page.files {
                debug!(id = %f.id, name = %f.name, "discovered file");
                on_result(DiscoveredDoc {
                    id: f.id,
                    name: f.name,
                    content_type: f.mime_type,
                    revision: f.md5_checksum,
                })?;
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentFetcher for HttpCorpusClient {
    async fn get_document(&self, external_id: &str) -> Result<Document, IndexError> {
        let url = format!("{}/documents/{}", self.config.docs_base_url, external_id);
        let response = Self::check_status(self.get(&url).send().await?, external_id)?;
        let doc: Document = response.json().await?;
        Ok(doc)
    }
}

#[async_trait]
impl EntityAnalyzer for HttpCorpusClient {
    async fn analyze_entities(&self, text: &str) -> Result<Vec<RawEntity>, IndexError> {
        let url = format!("{}/documents:analyzeEntities", self.config.nlp_base_url);
        let body = serde_json::json!({
            "document": { "content": text, "type": "PLAIN_TEXT" },
            "encodingType": "UTF8",
        });

        let response = Self::check_status(
            self.authorize(self.http.post(&url)).json(&body).send().await?,
            "entity analysis",
        )?;
        let parsed: AnalyzeEntitiesResponse = response.json().await?;
        Ok(parsed.entities)
    }
}
