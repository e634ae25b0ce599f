//! DigitalOcean cloud provider for Kubernetes
//!
//! Maps the orchestrator's instance, zone and volume capabilities onto the
//! DigitalOcean API, the droplet metadata service and local device links.

pub mod cloudprovider;
pub mod config;
pub mod digitalocean;
pub mod error;
pub mod metadata;
pub mod provider;

#[cfg(test)]
mod test_support;

pub use cloudprovider::{CloudProvider, Instances, NodeName, Volumes, Zones};
pub use crate::config::{read_config, ProviderConfig};
pub use error::{Error, Result};
pub use provider::{DigitalOcean, PROVIDER_NAME};
