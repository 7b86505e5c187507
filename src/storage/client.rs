//! HTTP client wrapper for the object storage REST API.

use crate::config::Config;
use crate::storage::types::{ListedObject, StorageError, StorageObject};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::json;

/// Read-only view of the storage namespace consumed by the pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in the configured folder.
    async fn list_objects(&self) -> Result<Vec<StorageObject>, StorageError>;

    /// Download the raw bytes of an object by file name.
    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Publicly reachable URL for an object.
    fn public_url(&self, name: &str) -> String;
}

/// Lightweight HTTP client for storage operations.
pub struct StorageService {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) api_key: String,
    pub(crate) bucket: String,
    pub(crate) prefix: String,
    pub(crate) list_limit: usize,
}

impl StorageService {
    /// Construct a new client from the run configuration.
    pub fn new(config: &Config) -> Result<Self, StorageError> {
        let client = Client::builder()
            .user_agent(concat!("iadb-vectorizer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = normalize_base_url(&config.storage_url).map_err(StorageError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            bucket = %config.storage_bucket,
            prefix = %config.storage_prefix,
            "Initialized storage HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.storage_api_key.clone(),
            bucket: config.storage_bucket.clone(),
            prefix: config.storage_prefix.clone(),
            list_limit: config.storage_list_limit,
        })
    }

    fn object_path<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        self.prefix
            .split('/')
            .chain(name.split('/'))
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn list_objects(&self) -> Result<Vec<StorageObject>, StorageError> {
        let url = self.endpoint(&["storage", "v1", "object", "list", self.bucket.as_str()])?;
        let body = json!({
            "prefix": self.prefix,
            "limit": self.list_limit,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });

        let response = self.request(Method::POST, url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = StorageError::UnexpectedStatus { status, body };
            tracing::error!(bucket = %self.bucket, error = %error, "Failed to list storage objects");
            return Err(error);
        }

        let listed: Vec<ListedObject> = response.json().await?;
        let objects: Vec<StorageObject> = listed
            .into_iter()
            .filter_map(ListedObject::into_object)
            .collect();
        if objects.len() >= self.list_limit {
            tracing::warn!(
                limit = self.list_limit,
                "Storage listing reached the page limit; some objects may be missing"
            );
        }
        tracing::info!(bucket = %self.bucket, objects = objects.len(), "Storage listing fetched");
        Ok(objects)
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut segments = vec!["storage", "v1", "object", self.bucket.as_str()];
        segments.extend(self.object_path(name));
        let url = self.endpoint(&segments)?;

        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UnexpectedStatus { status, body });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(file = name, bytes = bytes.len(), "Object downloaded");
        Ok(bytes.to_vec())
    }

    fn public_url(&self, name: &str) -> String {
        let mut segments = vec!["storage", "v1", "object", "public", self.bucket.as_str()];
        segments.extend(self.object_path(name));
        self.endpoint(&segments)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}/{}", self.base_url, segments.join("/")))
    }
}

fn normalize_base_url(url: &str) -> Result<Url, String> {
    let mut parsed = Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed)
}
