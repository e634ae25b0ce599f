/// Local block device discovery for attached volumes
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

/// Name prefix of DigitalOcean volume device links
pub const DEVICE_PREFIX: &str = "scsi-0DO_Volume_";

/// Find the device link for a volume in `dir`.
///
/// Matches entries named `scsi-0DO_Volume_<suffix>` where `volume_id`
/// contains `<suffix>`. An unreadable directory yields `None`.
pub fn find_device_path(dir: &Path, volume_id: &str) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot read {}: {}", dir.display(), e);
            return None;
        }
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(DEVICE_PREFIX) else {
            continue;
        };

        if !suffix.is_empty() && volume_id.contains(suffix) {
            let path = dir.join(name);
            trace!("Found disk attached as {:?}; full devicepath: {}", name, path.display());
            return Some(path);
        }
    }

    None
}
