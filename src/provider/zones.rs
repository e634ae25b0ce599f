/// Zone information from the self-instance snapshot
use super::DigitalOcean;
use crate::cloudprovider::{Zone, Zones};
use crate::error::Result;

impl Zones for DigitalOcean {
    // DigitalOcean has no failure domains below the region
    fn zone(&self) -> Result<Zone> {
        Ok(Zone {
            failure_domain: self.self_instance.region().to_string(),
            region: self.self_instance.region().to_string(),
        })
    }
}
