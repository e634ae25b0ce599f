/// Vendor API surface consumed by the provider
use async_trait::async_trait;

use super::models::{Account, Action, Droplet, ListOptions, Volume, VolumeCreateRequest};
use crate::error::Result;

/// The subset of DigitalOcean endpoints the provider relies on.
///
/// Implemented by [`super::DigitalOceanClient`] against the REST API; tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait DigitalOceanApi: Send + Sync {
    /// `GET /v2/account`
    async fn get_account(&self) -> Result<Account>;

    /// `GET /v2/droplets` for a single page
    async fn list_droplets(&self, options: ListOptions) -> Result<Vec<Droplet>>;

    /// `GET /v2/volumes/{id}`
    async fn get_volume(&self, volume_id: &str) -> Result<Volume>;

    /// `POST /v2/volumes`
    async fn create_volume(&self, request: &VolumeCreateRequest) -> Result<Volume>;

    /// `DELETE /v2/volumes/{id}`
    async fn delete_volume(&self, volume_id: &str) -> Result<()>;

    /// `POST /v2/volumes/{id}/actions` with `type = attach`
    async fn attach_volume(&self, volume_id: &str, droplet_id: u64) -> Result<Action>;

    /// `POST /v2/volumes/{id}/actions` with `type = detach`
    async fn detach_volume(&self, volume_id: &str) -> Result<Action>;
}
