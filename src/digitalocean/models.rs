/// DigitalOcean API data models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Droplet (compute instance) resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub disk: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub size_slug: String,
    pub region: Option<Region>,
    pub networks: Option<Networks>,
    #[serde(default)]
    pub volume_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Droplet {
    /// First private IPv4 address, if the droplet has private networking
    pub fn private_ipv4(&self) -> Option<&str> {
        self.ipv4_of_type("private")
    }

    /// First public IPv4 address
    pub fn public_ipv4(&self) -> Option<&str> {
        self.ipv4_of_type("public")
    }

    fn ipv4_of_type(&self, network_type: &str) -> Option<&str> {
        self.networks
            .as_ref()?
            .v4
            .iter()
            .find(|n| n.network_type == network_type)
            .map(|n| n.ip_address.as_str())
    }
}

/// Region information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// Droplet network interfaces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<NetworkV4>,
    #[serde(default)]
    pub v6: Vec<NetworkV6>,
}

/// IPv4 interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkV4 {
    pub ip_address: String,
    #[serde(default)]
    pub netmask: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(rename = "type")]
    pub network_type: String,
}

/// IPv6 interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkV6 {
    pub ip_address: String,
    #[serde(default)]
    pub netmask: u32,
    #[serde(default)]
    pub gateway: String,
    #[serde(rename = "type")]
    pub network_type: String,
}

/// Block storage volume resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size_gigabytes: u64,
    pub region: Option<Region>,
    #[serde(default)]
    pub droplet_ids: Vec<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Volume {
    /// A volume is attached when its attachment set is non-empty
    pub fn is_attached(&self) -> bool {
        !self.droplet_ids.is_empty()
    }

    /// Whether the given droplet is in the attachment set
    pub fn is_attached_to(&self, droplet_id: u64) -> bool {
        self.droplet_ids.contains(&droplet_id)
    }

    /// Lifecycle state as reported by the record
    pub fn state(&self) -> VolumeState {
        if self.is_attached() {
            VolumeState::Attached
        } else {
            VolumeState::Available
        }
    }
}

/// Volume lifecycle state.
///
/// A fetched record is only ever `Available` or `Attached`; the transitional
/// states name the vendor call currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeState {
    Absent,
    Creating,
    Available,
    Attaching,
    Attached,
    Detaching,
}

impl fmt::Display for VolumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            VolumeState::Absent => "absent",
            VolumeState::Creating => "creating",
            VolumeState::Available => "available",
            VolumeState::Attaching => "attaching",
            VolumeState::Attached => "attached",
            VolumeState::Detaching => "detaching",
        };
        f.write_str(state)
    }
}

/// Account information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub droplet_limit: u32,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_message: String,
}

/// Action represents an asynchronous operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: u64,
    pub status: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resource_id: Option<u64>,
    pub resource_type: Option<String>,
    pub region_slug: Option<String>,
}

/// Options for paginated listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub per_page: u32,
}

/// Request structure for creating a volume
#[derive(Debug, Clone, Serialize)]
pub struct VolumeCreateRequest {
    pub region: String,
    pub name: String,
    pub description: String,
    pub size_gigabytes: u64,
}

/// Request structure for volume actions
#[derive(Debug, Serialize)]
pub struct VolumeActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub droplet_id: Option<u64>,
}

/// Account response
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: Account,
}

/// Droplet list response
#[derive(Debug, Serialize, Deserialize)]
pub struct DropletListResponse {
    pub droplets: Vec<Droplet>,
    pub meta: Option<ListMeta>,
}

/// Listing metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ListMeta {
    pub total: u64,
}

/// Single volume response
#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub volume: Volume,
}

/// Action response
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub action: Action,
}

/// Error response from API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub id: String,
    pub message: String,
    pub request_id: Option<String>,
}
