/// Capability contract between the orchestrator and a cloud provider
use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of a node as known to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Kind of a node address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeAddressType {
    InternalIP,
    /// The private IP used to be reported as the host IP
    LegacyHostIP,
    ExternalIP,
}

/// Address of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: NodeAddressType,
    pub address: String,
}

impl NodeAddress {
    pub fn new(address_type: NodeAddressType, address: impl Into<String>) -> Self {
        Self {
            address_type,
            address: address.into(),
        }
    }
}

/// Failure domain and region of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub failure_domain: String,
    pub region: String,
}

/// Capability groups an orchestrator may ask a provider for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Instances,
    Zones,
    Volumes,
    LoadBalancer,
    Routes,
    Clusters,
}

/// Node identity and address queries
#[async_trait]
pub trait Instances: Send + Sync {
    /// Addresses of the named node
    async fn node_addresses(&self, name: &NodeName) -> Result<Vec<NodeAddress>>;

    /// Provider ID of the named node, used to detect deleted nodes
    async fn external_id(&self, name: &NodeName) -> Result<String>;

    /// Provider ID of the named node
    async fn instance_id(&self, name: &NodeName) -> Result<String>;

    /// Provider ID of the node the process runs on
    fn local_instance_id(&self) -> Result<String>;

    /// Machine type of the named node
    async fn instance_type(&self, name: &NodeName) -> Result<String>;

    /// Names of all nodes matching a filter
    async fn list(&self, filter: &str) -> Result<Vec<NodeName>>;

    /// Push an SSH key to every node
    async fn add_ssh_key_to_all_instances(&self, user: &str, key_data: &[u8]) -> Result<()>;

    /// Node name for the given hostname
    async fn current_node_name(&self, hostname: &str) -> Result<NodeName>;
}

/// Zone information for the node the process runs on
pub trait Zones: Send + Sync {
    fn zone(&self) -> Result<Zone>;
}

/// Block storage lifecycle
#[async_trait]
pub trait Volumes: Send + Sync {
    /// Create a volume of the given size in GiB, returning its ID
    async fn create_volume(
        &self,
        region: &str,
        name: &str,
        description: &str,
        size_gigabytes: u64,
    ) -> Result<String>;

    /// Delete a volume that is not attached to any node
    async fn delete_volume(&self, volume_id: &str) -> Result<()>;

    /// Attach a volume to an instance, returning the volume ID
    async fn attach_volume(&self, instance_id: u64, volume_id: &str) -> Result<String>;

    /// Detach a volume
    async fn detach_volume(&self, instance_id: u64, volume_id: &str) -> Result<()>;

    /// Local device path of an attached volume, or an empty string
    fn device_path(&self, volume_id: &str) -> String;

    /// Expected device path of a volume attached to the given instance
    async fn attachment_volume_path(&self, instance_id: u64, volume_id: &str) -> Result<String>;

    /// Whether a volume is attached to the given instance
    async fn disk_is_attached(&self, volume_id: &str, instance_id: u64) -> Result<bool>;

    /// Attachment state of several volumes, best effort
    async fn disks_are_attached(
        &self,
        volume_ids: &[String],
        instance_id: u64,
    ) -> Result<HashMap<String, bool>>;
}

/// Entry point the orchestrator holds for a provider
pub trait CloudProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    fn supports(&self, capability: Capability) -> bool;

    fn instances(&self) -> Option<&dyn Instances>;

    fn zones(&self) -> Option<&dyn Zones>;

    fn volumes(&self) -> Option<&dyn Volumes>;

    /// Filter DNS settings handed to pods
    fn scrub_dns(
        &self,
        nameservers: Vec<String>,
        searches: Vec<String>,
    ) -> (Vec<String>, Vec<String>);
}
