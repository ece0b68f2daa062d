use async_trait::async_trait;
use base64::{ engine::general_purpose::STANDARD as BASE64, Engine };
use chrono::Utc;
use log::{ debug, info };
use reqwest::header::{ AUTHORIZATION, CONTENT_TYPE };
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use url::{ form_urlencoded, Url };
use super::{ BlobKey, RemoteStore, StoreError };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoType {
    Model,
    Dataset,
    Space,
}

impl RepoType {
    fn resolve_prefix(&self) -> &'static str {
        match self {
            RepoType::Model => "",
            RepoType::Dataset => "datasets/",
            RepoType::Space => "spaces/",
        }
    }

    fn api_segment(&self) -> &'static str {
        match self {
            RepoType::Model => "models",
            RepoType::Dataset => "datasets",
            RepoType::Space => "spaces",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseRepoTypeError {
    message: String,
}

impl fmt::Display for ParseRepoTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseRepoTypeError {}

impl FromStr for RepoType {
    type Err = ParseRepoTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "model" => Ok(RepoType::Model),
            "dataset" => Ok(RepoType::Dataset),
            "space" => Ok(RepoType::Space),
            _ =>
                Err(ParseRepoTypeError {
                    message: format!("Invalid repo type: '{}'", s),
                }),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "key", content = "value", rename_all = "lowercase")]
enum CommitLine<'a> {
    Header {
        summary: String,
        description: String,
    },
    File {
        content: String,
        path: &'a str,
        encoding: &'static str,
    },
}

/// Hugging Face Hub repository file access: `resolve` for reads, the commit API for writes.
pub struct HubStore {
    client: reqwest::Client,
    endpoint: String,
    repo_type: RepoType,
    revision: String,
    token: String,
}

impl HubStore {
    pub fn new(
        endpoint: &str,
        repo_type: RepoType,
        revision: &str,
        token: &str
    ) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            repo_type,
            revision: revision.to_string(),
            token: token.to_string(),
        })
    }

    fn encoded_revision(&self) -> String {
        form_urlencoded::byte_serialize(self.revision.as_bytes()).collect()
    }

    fn resolve_url(&self, key: &BlobKey) -> String {
        format!(
            "{}/{}{}/resolve/{}/{}",
            self.endpoint,
            self.repo_type.resolve_prefix(),
            key.repo_id,
            self.encoded_revision(),
            key.path
        )
    }

    fn commit_url(&self, key: &BlobKey) -> String {
        format!(
            "{}/api/{}/{}/commit/{}",
            self.endpoint,
            self.repo_type.api_segment(),
            key.repo_id,
            self.encoded_revision()
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // An empty token means anonymous access.
        if self.token.is_empty() {
            req
        } else {
            req.header(AUTHORIZATION, format!("Bearer {}", self.token))
        }
    }

    fn commit_body(key: &BlobKey, bytes: &[u8]) -> Result<String, StoreError> {
        let lines = [
            CommitLine::Header {
                summary: format!("Update {} ({})", key.path, Utc::now().to_rfc3339()),
                description: String::new(),
            },
            CommitLine::File {
                content: BASE64.encode(bytes),
                path: &key.path,
                encoding: "base64",
            },
        ];

        let mut body = String::new();
        for line in &lines {
            let json = serde_json
                ::to_string(line)
                .map_err(|e| StoreError::Other(format!("Failed to build commit payload: {}", e)))?;
            body.push_str(&json);
            body.push('\n');
        }
        Ok(body)
    }
}

#[async_trait]
impl RemoteStore for HubStore {
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StoreError> {
        let url = self.resolve_url(key);
        debug!("GET {}", url);
        let resp = self.authorize(self.client.get(&url)).send().await?;

        match resp.status() {
            reqwest::StatusCode::OK => Ok(resp.bytes().await?.to_vec()),
            reqwest::StatusCode::NOT_FOUND => Err(StoreError::NotFound(key.clone())),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(StoreError::Status { status, body })
            }
        }
    }

    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> Result<(), StoreError> {
        let url = self.commit_url(key);
        let body = Self::commit_body(key, &bytes)?;
        debug!("POST {} ({} bytes)", url, bytes.len());

        let resp = self
            .authorize(self.client.post(&url))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send().await?;

        let status = resp.status();
        if status.is_success() {
            info!("Committed {} to {}", key.path, key.repo_id);
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(StoreError::Status { status, body })
        }
    }
}
