/// Block storage volume lifecycle
use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::device::{find_device_path, DEVICE_PREFIX};
use super::DigitalOcean;
use crate::cloudprovider::Volumes;
use crate::digitalocean::models::{Volume, VolumeCreateRequest, VolumeState};
use crate::error::{Error, Result};

impl DigitalOcean {
    async fn get_volume(&self, volume_id: &str) -> Result<Volume> {
        self.api.get_volume(volume_id).await.map_err(|e| {
            error!("Error occurred getting volume {}: {}", volume_id, e);
            e
        })
    }

    /// Current lifecycle state of a volume; a vendor 404 means `Absent`
    pub async fn volume_state(&self, volume_id: &str) -> Result<VolumeState> {
        match self.api.get_volume(volume_id).await {
            Ok(volume) => Ok(volume.state()),
            Err(e) if e.is_not_found() => Ok(VolumeState::Absent),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Volumes for DigitalOcean {
    async fn create_volume(
        &self,
        region: &str,
        name: &str,
        description: &str,
        size_gigabytes: u64,
    ) -> Result<String> {
        let request = VolumeCreateRequest {
            region: region.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            size_gigabytes,
        };

        let volume = self.api.create_volume(&request).await.map_err(|e| {
            error!("Failed to create a {} GB volume: {}", size_gigabytes, e);
            e
        })?;

        info!("Created volume {} ({})", volume.id, volume.state());
        Ok(volume.id)
    }

    // Not atomic: another actor may attach between the check and the delete
    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        let volume = self.api.get_volume(volume_id).await?;
        if volume.is_attached() {
            warn!(
                "Cannot delete the volume {}, it's still attached to {:?}",
                volume_id, volume.droplet_ids
            );
            return Err(Error::VolumeInUse(volume_id.to_string()));
        }

        self.api.delete_volume(volume_id).await.map_err(|e| {
            error!("Cannot delete volume {}: {}", volume_id, e);
            e
        })?;

        info!("Deleted volume {}", volume_id);
        Ok(())
    }

    async fn attach_volume(&self, instance_id: u64, volume_id: &str) -> Result<String> {
        let action = self
            .api
            .attach_volume(volume_id, instance_id)
            .await
            .map_err(|e| {
                error!(
                    "Failed to attach {} volume to {} compute: {}",
                    volume_id, instance_id, e
                );
                e
            })?;

        debug!("Attach action {} is {}", action.id, action.status);
        info!("Successfully attached {} volume to {} compute", volume_id, instance_id);
        Ok(volume_id.to_string())
    }

    async fn detach_volume(&self, instance_id: u64, volume_id: &str) -> Result<()> {
        // The detach action targets every attachment; instance_id is informational
        let action = self.api.detach_volume(volume_id).await.map_err(|e| {
            error!("Failed to detach {} volume from {}: {}", volume_id, instance_id, e);
            e
        })?;

        debug!("Detach action {} is {}", action.id, action.status);
        info!("Successfully detached {} volume", volume_id);
        Ok(())
    }

    fn device_path(&self, volume_id: &str) -> String {
        match find_device_path(&self.device_dir, volume_id) {
            Some(path) => path.to_string_lossy().into_owned(),
            None => {
                warn!("Failed to find device for the disk ID: {:?}", volume_id);
                String::new()
            }
        }
    }

    async fn attachment_volume_path(&self, instance_id: u64, volume_id: &str) -> Result<String> {
        let volume = self.get_volume(volume_id).await?;
        if !volume.is_attached_to(instance_id) {
            return Err(Error::VolumeNotAttached {
                volume_id: volume_id.to_string(),
                instance_id,
            });
        }

        let path = self
            .device_dir
            .join(format!("{}{}", DEVICE_PREFIX, volume.name));
        Ok(path.to_string_lossy().into_owned())
    }

    async fn disk_is_attached(&self, volume_id: &str, instance_id: u64) -> Result<bool> {
        let volume = self.get_volume(volume_id).await?;
        Ok(volume.is_attached_to(instance_id))
    }

    async fn disks_are_attached(
        &self,
        volume_ids: &[String],
        instance_id: u64,
    ) -> Result<HashMap<String, bool>> {
        let mut attached: HashMap<String, bool> =
            volume_ids.iter().map(|id| (id.clone(), false)).collect();

        let lookups = volume_ids
            .iter()
            .map(|volume_id| async move { (volume_id, self.get_volume(volume_id).await) });

        // Volumes that cannot be fetched stay marked as detached
        for (volume_id, result) in join_all(lookups).await {
            match result {
                Ok(volume) if volume.is_attached_to(instance_id) => {
                    attached.insert(volume_id.clone(), true);
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping volume {}: {}", volume_id, e),
            }
        }

        Ok(attached)
    }
}
