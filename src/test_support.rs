/// Test doubles shared by the unit test suites
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::digitalocean::models::{
    Account, Action, Droplet, ListOptions, NetworkV4, Networks, Region, Volume,
    VolumeCreateRequest,
};
use crate::digitalocean::DigitalOceanApi;
use crate::error::{Error, Result};
use crate::metadata::InstanceMetadata;

/// Build a droplet record with optional private and public IPv4 addresses
pub fn droplet(id: u64, name: &str, private: Option<&str>, public: Option<&str>) -> Droplet {
    let mut v4 = Vec::new();
    if let Some(ip) = public {
        v4.push(NetworkV4 {
            ip_address: ip.to_string(),
            netmask: "255.255.240.0".to_string(),
            gateway: String::new(),
            network_type: "public".to_string(),
        });
    }
    if let Some(ip) = private {
        v4.push(NetworkV4 {
            ip_address: ip.to_string(),
            netmask: "255.255.0.0".to_string(),
            gateway: String::new(),
            network_type: "private".to_string(),
        });
    }

    Droplet {
        id,
        name: name.to_string(),
        memory: 2048,
        vcpus: 2,
        disk: 60,
        status: "active".to_string(),
        size_slug: "s-2vcpu-2gb".to_string(),
        region: Some(Region {
            slug: "nyc1".to_string(),
            name: "New York 1".to_string(),
        }),
        networks: Some(Networks { v4, v6: vec![] }),
        volume_ids: vec![],
        tags: vec![],
        created_at: None,
    }
}

/// Build a volume record attached to the given droplets
pub fn volume(id: &str, name: &str, droplet_ids: &[u64]) -> Volume {
    Volume {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        size_gigabytes: 10,
        region: Some(Region {
            slug: "nyc1".to_string(),
            name: "New York 1".to_string(),
        }),
        droplet_ids: droplet_ids.to_vec(),
        created_at: None,
    }
}

fn server_error(endpoint: &'static str) -> Error {
    Error::Api {
        endpoint,
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        id: "server_error".to_string(),
        message: "Server was unable to give you a response.".to_string(),
    }
}

/// In-memory DigitalOcean API recording every call it receives
#[derive(Default)]
pub struct FakeApi {
    droplets: Vec<Droplet>,
    volumes: Mutex<HashMap<String, Volume>>,
    failing_volumes: HashSet<String>,
    fail_listing: bool,
    fail_account: bool,
    fail_create: bool,
    next_volume: AtomicU64,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_droplet(mut self, droplet: Droplet) -> Self {
        self.droplets.push(droplet);
        self
    }

    pub fn with_volume(self, volume: Volume) -> Self {
        self.volumes
            .lock()
            .unwrap()
            .insert(volume.id.clone(), volume);
        self
    }

    pub fn with_failing_volume(mut self, volume_id: &str) -> Self {
        self.failing_volumes.insert(volume_id.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_account(mut self) -> Self {
        self.fail_account = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn volume(&self, volume_id: &str) -> Option<Volume> {
        self.volumes.lock().unwrap().get(volume_id).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, volume_id: &str) -> Result<Volume> {
        if self.failing_volumes.contains(volume_id) {
            return Err(server_error("get volume"));
        }
        self.volumes
            .lock()
            .unwrap()
            .get(volume_id)
            .cloned()
            .ok_or_else(|| Error::Api {
                endpoint: "get volume",
                status: reqwest::StatusCode::NOT_FOUND,
                id: "not_found".to_string(),
                message: "The resource you were accessing could not be found.".to_string(),
            })
    }

    fn action(&self, action_type: &str) -> Action {
        Action {
            id: 72531856,
            status: "completed".to_string(),
            action_type: action_type.to_string(),
            started_at: None,
            completed_at: None,
            resource_id: None,
            resource_type: Some("volume".to_string()),
            region_slug: Some("nyc1".to_string()),
        }
    }
}

#[async_trait]
impl DigitalOceanApi for FakeApi {
    async fn get_account(&self) -> Result<Account> {
        self.record("get_account".to_string());
        if self.fail_account {
            return Err(Error::Api {
                endpoint: "get account",
                status: reqwest::StatusCode::UNAUTHORIZED,
                id: "unauthorized".to_string(),
                message: "Unable to authenticate you.".to_string(),
            });
        }
        Ok(Account {
            droplet_limit: 25,
            email: "sammy@digitalocean.com".to_string(),
            uuid: "b6fr89dbf6d9156cace5f3c78dc9851d957381ef".to_string(),
            email_verified: true,
            status: "active".to_string(),
            status_message: String::new(),
        })
    }

    async fn list_droplets(&self, options: ListOptions) -> Result<Vec<Droplet>> {
        self.record(format!(
            "list_droplets page={} per_page={}",
            options.page, options.per_page
        ));
        if self.fail_listing {
            return Err(server_error("list droplets"));
        }
        Ok(self
            .droplets
            .iter()
            .take(options.per_page as usize)
            .cloned()
            .collect())
    }

    async fn get_volume(&self, volume_id: &str) -> Result<Volume> {
        self.record(format!("get_volume {}", volume_id));
        self.lookup(volume_id)
    }

    async fn create_volume(&self, request: &VolumeCreateRequest) -> Result<Volume> {
        self.record(format!("create_volume {}", request.name));
        if self.fail_create {
            return Err(server_error("create volume"));
        }
        let id = format!("vol-{}", self.next_volume.fetch_add(1, Ordering::SeqCst));
        let mut created = volume(&id, &request.name, &[]);
        created.description = request.description.clone();
        created.size_gigabytes = request.size_gigabytes;
        self.volumes
            .lock()
            .unwrap()
            .insert(id.clone(), created.clone());
        Ok(created)
    }

    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.record(format!("delete_volume {}", volume_id));
        self.volumes
            .lock()
            .unwrap()
            .remove(volume_id)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }

    async fn attach_volume(&self, volume_id: &str, droplet_id: u64) -> Result<Action> {
        self.record(format!("attach_volume {} {}", volume_id, droplet_id));
        let mut volumes = self.volumes.lock().unwrap();
        let volume = volumes.get_mut(volume_id).ok_or(Error::NotFound)?;
        volume.droplet_ids.push(droplet_id);
        Ok(self.action("attach"))
    }

    async fn detach_volume(&self, volume_id: &str) -> Result<Action> {
        self.record(format!("detach_volume {}", volume_id));
        let mut volumes = self.volumes.lock().unwrap();
        let volume = volumes.get_mut(volume_id).ok_or(Error::NotFound)?;
        volume.droplet_ids.clear();
        Ok(self.action("detach"))
    }
}

/// Metadata source returning a fixed identity
pub struct FakeMetadata {
    pub region: String,
    pub droplet_id: Option<u64>,
}

impl FakeMetadata {
    pub fn new(droplet_id: u64, region: &str) -> Self {
        Self {
            region: region.to_string(),
            droplet_id: Some(droplet_id),
        }
    }

    /// Metadata whose droplet ID lookup fails
    pub fn broken(region: &str) -> Self {
        Self {
            region: region.to_string(),
            droplet_id: None,
        }
    }
}

#[async_trait]
impl InstanceMetadata for FakeMetadata {
    async fn region(&self) -> Result<String> {
        Ok(self.region.clone())
    }

    async fn droplet_id(&self) -> Result<u64> {
        self.droplet_id
            .ok_or_else(|| Error::Metadata("invalid droplet ID \"\"".to_string()))
    }
}

/// Provider built on a [`FakeApi`], running on droplet 4242 in nyc3
pub async fn provider_with(api: FakeApi) -> (crate::provider::DigitalOcean, Arc<FakeApi>) {
    let api = Arc::new(api);
    let config = crate::config::ProviderConfig {
        api_key: "123456".to_string(),
        region: "nyc1".to_string(),
    };

    let provider = crate::provider::DigitalOcean::builder(config)
        .with_api(api.clone())
        .with_metadata(Arc::new(FakeMetadata::new(4242, "nyc3")))
        .build()
        .await
        .unwrap();

    (provider, api)
}
