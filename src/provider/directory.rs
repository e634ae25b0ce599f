/// Droplet lookups backing the node identity queries
use std::sync::Arc;

use tracing::debug;

use crate::cloudprovider::NodeName;
use crate::digitalocean::models::{Droplet, ListOptions};
use crate::digitalocean::DigitalOceanApi;
use crate::error::{Error, Result};

/// Droplets fetched per lookup.
///
/// Only the first page is ever requested, so droplets beyond the first 200
/// cannot be found.
pub const LIST_PAGE_SIZE: u32 = 200;

/// Uncached view over the droplet listing
#[derive(Clone)]
pub struct InstanceDirectory {
    api: Arc<dyn DigitalOceanApi>,
}

impl InstanceDirectory {
    pub fn new(api: Arc<dyn DigitalOceanApi>) -> Self {
        Self { api }
    }

    async fn list(&self) -> Result<Vec<Droplet>> {
        self.api
            .list_droplets(ListOptions {
                page: 1,
                per_page: LIST_PAGE_SIZE,
            })
            .await
    }

    /// Find the droplet known by `name`.
    ///
    /// Each droplet is checked against its name (case-insensitive), then its
    /// private IPv4, then its public IPv4; the first droplet that matches wins.
    pub async fn find_by_identity(&self, name: &NodeName) -> Result<Droplet> {
        let droplets = self.list().await?;
        let wanted = name.as_str().to_lowercase();

        droplets
            .into_iter()
            .find(|droplet| {
                droplet.name.to_lowercase() == wanted
                    || droplet.private_ipv4() == Some(name.as_str())
                    || droplet.public_ipv4() == Some(name.as_str())
            })
            .ok_or_else(|| {
                debug!("No droplet matches {}", name);
                Error::NotFound
            })
    }

    /// Names of droplets whose name contains `filter`, in listing order
    pub async fn find_by_name_substring(&self, filter: &str) -> Result<Vec<NodeName>> {
        let droplets = self.list().await?;

        Ok(droplets
            .into_iter()
            .filter(|droplet| droplet.name.contains(filter))
            .map(|droplet| NodeName::new(droplet.name))
            .collect())
    }
}
