/// Droplet metadata service and the self-instance snapshot
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Link-local metadata endpoint available on every droplet
pub const METADATA_BASE: &str = "http://169.254.169.254/metadata/v1/";

/// Source of the running droplet's identity
#[async_trait]
pub trait InstanceMetadata: Send + Sync {
    /// Region slug of the droplet
    async fn region(&self) -> Result<String>;

    /// Numeric droplet ID
    async fn droplet_id(&self) -> Result<u64>;
}

/// Plain HTTP client for the droplet metadata service.
///
/// No retries and no timeout override: the first failure is returned.
#[derive(Clone)]
pub struct MetadataClient {
    client: Client,
    base_url: Url,
}

impl MetadataClient {
    /// Client for the well-known link-local endpoint
    pub fn new() -> Result<Self> {
        Ok(Self::with_base_url(Url::parse(METADATA_BASE)?))
    }

    /// Client for a custom metadata base URL
    pub fn with_base_url(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn fetch(&self, key: &str) -> Result<String> {
        let url = self.base_url.join(key)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            debug!("error fetching {} from metadata service: {}", key, e);
            Error::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Metadata(format!(
                "metadata service returned {} for {}",
                status, key
            )));
        }

        let body = response.text().await?;
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl InstanceMetadata for MetadataClient {
    async fn region(&self) -> Result<String> {
        self.fetch("region").await
    }

    async fn droplet_id(&self) -> Result<u64> {
        let raw = self.fetch("id").await?;
        raw.parse::<u64>().map_err(|_| {
            debug!("droplet ID {:?} is invalid", raw);
            Error::Metadata(format!("invalid droplet ID {:?}", raw))
        })
    }
}

/// Identity of the droplet the provider runs on, captured once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfInstance {
    droplet_id: u64,
    region: String,
}

impl SelfInstance {
    pub fn new(droplet_id: u64, region: impl Into<String>) -> Self {
        Self {
            droplet_id,
            region: region.into(),
        }
    }

    /// Query region and droplet ID; any failure aborts resolution
    pub async fn resolve(metadata: &dyn InstanceMetadata) -> Result<Self> {
        let region = metadata.region().await?;
        let droplet_id = metadata.droplet_id().await?;

        Ok(Self { droplet_id, region })
    }

    pub fn droplet_id(&self) -> u64 {
        self.droplet_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}
