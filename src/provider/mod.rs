/// DigitalOcean cloud provider facade
pub mod device;
pub mod directory;
mod instances;
mod volumes;
mod zones;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error};

pub use directory::InstanceDirectory;

use crate::cloudprovider::{Capability, CloudProvider, Instances, Volumes, Zones};
use crate::config::{read_config, ProviderConfig};
use crate::digitalocean::{DigitalOceanApi, DigitalOceanClient, TokenSource};
use crate::error::Result;
use crate::metadata::{InstanceMetadata, MetadataClient, SelfInstance};

/// Name under which the provider is known to the orchestrator
pub const PROVIDER_NAME: &str = "digitalocean";

/// Directory holding stable block device links
pub const DEVICE_DIR: &str = "/dev/disk/by-id/";

/// Cloud provider backed by the DigitalOcean API
pub struct DigitalOcean {
    api: Arc<dyn DigitalOceanApi>,
    directory: InstanceDirectory,
    region: String,
    self_instance: SelfInstance,
    device_dir: PathBuf,
}

impl DigitalOcean {
    /// Provider factory: read the cloud config and construct the provider
    pub async fn from_config<R: Read>(config: Option<R>) -> Result<Self> {
        let config = read_config(config)?;
        Self::new(config).await
    }

    /// Authenticate against the API and resolve the local droplet
    pub async fn new(config: ProviderConfig) -> Result<Self> {
        Self::builder(config).build().await
    }

    pub fn builder(config: ProviderConfig) -> ProviderBuilder {
        ProviderBuilder {
            config,
            api: None,
            metadata: None,
            device_dir: PathBuf::from(DEVICE_DIR),
        }
    }

    /// Region from the provider configuration
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Droplet the provider runs on
    pub fn self_instance(&self) -> &SelfInstance {
        &self.self_instance
    }

    pub fn directory(&self) -> &InstanceDirectory {
        &self.directory
    }
}

/// Staged construction of [`DigitalOcean`].
///
/// `build` consumes the builder, so the local droplet is resolved exactly
/// once per provider.
pub struct ProviderBuilder {
    config: ProviderConfig,
    api: Option<Arc<dyn DigitalOceanApi>>,
    metadata: Option<Arc<dyn InstanceMetadata>>,
    device_dir: PathBuf,
}

impl ProviderBuilder {
    /// Use a specific API implementation instead of the REST client
    pub fn with_api(mut self, api: Arc<dyn DigitalOceanApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Use a specific metadata source instead of the link-local service
    pub fn with_metadata(mut self, metadata: Arc<dyn InstanceMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Scan a different directory for attached volume devices
    pub fn with_device_dir(mut self, device_dir: impl Into<PathBuf>) -> Self {
        self.device_dir = device_dir.into();
        self
    }

    pub async fn build(self) -> Result<DigitalOcean> {
        let api: Arc<dyn DigitalOceanApi> = match self.api {
            Some(api) => api,
            None => {
                let token_source = TokenSource::new(self.config.api_key.clone());
                Arc::new(DigitalOceanClient::new(&token_source)?)
            }
        };

        // The account lookup is the only check that the API key works
        api.get_account().await.map_err(|e| {
            error!("DigitalOcean account check failed: {}", e);
            e
        })?;

        let metadata: Arc<dyn InstanceMetadata> = match self.metadata {
            Some(metadata) => metadata,
            None => Arc::new(MetadataClient::new()?),
        };

        let self_instance = SelfInstance::resolve(metadata.as_ref()).await?;
        debug!(
            "DigitalOcean Droplet region: {}, droplet ID: {}",
            self_instance.region(),
            self_instance.droplet_id()
        );

        Ok(DigitalOcean {
            directory: InstanceDirectory::new(api.clone()),
            api,
            region: self.config.region,
            self_instance,
            device_dir: self.device_dir,
        })
    }
}

impl CloudProvider for DigitalOcean {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Instances | Capability::Zones | Capability::Volumes
        )
    }

    fn instances(&self) -> Option<&dyn Instances> {
        Some(self)
    }

    fn zones(&self) -> Option<&dyn Zones> {
        Some(self)
    }

    fn volumes(&self) -> Option<&dyn Volumes> {
        Some(self)
    }

    fn scrub_dns(
        &self,
        nameservers: Vec<String>,
        searches: Vec<String>,
    ) -> (Vec<String>, Vec<String>) {
        (nameservers, searches)
    }
}
