/// Node identity and address queries
use async_trait::async_trait;
use tracing::debug;

use super::DigitalOcean;
use crate::cloudprovider::{Instances, NodeAddress, NodeAddressType, NodeName};
use crate::error::{Error, Result};

/// Collapse any lookup failure into the orchestrator's "instance not found"
fn instance_not_found(name: &str, err: Error) -> Error {
    debug!("Lookup of {} failed: {}", name, err);
    Error::InstanceNotFound
}

impl DigitalOcean {
    async fn droplet_id_of(&self, name: &NodeName) -> Result<String> {
        let droplet = self
            .directory
            .find_by_identity(name)
            .await
            .map_err(|e| instance_not_found(name.as_str(), e))?;
        Ok(droplet.id.to_string())
    }
}

#[async_trait]
impl Instances for DigitalOcean {
    async fn node_addresses(&self, name: &NodeName) -> Result<Vec<NodeAddress>> {
        let droplet = self.directory.find_by_identity(name).await?;

        let internal_ip = droplet.private_ipv4().ok_or(Error::NoAddressFound)?;
        let external_ip = droplet.public_ipv4().ok_or(Error::NoAddressFound)?;

        Ok(vec![
            NodeAddress::new(NodeAddressType::InternalIP, internal_ip),
            NodeAddress::new(NodeAddressType::LegacyHostIP, internal_ip),
            NodeAddress::new(NodeAddressType::ExternalIP, external_ip),
        ])
    }

    async fn external_id(&self, name: &NodeName) -> Result<String> {
        self.droplet_id_of(name).await
    }

    async fn instance_id(&self, name: &NodeName) -> Result<String> {
        self.droplet_id_of(name).await
    }

    fn local_instance_id(&self) -> Result<String> {
        Ok(self.self_instance.droplet_id().to_string())
    }

    async fn instance_type(&self, name: &NodeName) -> Result<String> {
        let droplet = self.directory.find_by_identity(name).await?;
        Ok(droplet.size_slug)
    }

    async fn list(&self, filter: &str) -> Result<Vec<NodeName>> {
        self.directory
            .find_by_name_substring(filter)
            .await
            .map_err(|e| instance_not_found(filter, e))
    }

    async fn add_ssh_key_to_all_instances(&self, _user: &str, _key_data: &[u8]) -> Result<()> {
        Err(Error::Unimplemented("add_ssh_key_to_all_instances"))
    }

    async fn current_node_name(&self, hostname: &str) -> Result<NodeName> {
        let droplet = self
            .directory
            .find_by_identity(&NodeName::from(hostname))
            .await
            .map_err(|e| instance_not_found(hostname, e))?;
        Ok(NodeName::new(droplet.name.to_lowercase()))
    }
}
