/// Error types shared by the provider, the API client and the config loader
use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "no DigitalOcean cloud provider config file given. Restart process with \
         --cloud-provider=digitalocean --cloud-config=[path_to_config_file]"
    )]
    ConfigMissing,

    #[error("invalid cloud config: {0}")]
    Config(#[from] ConfigError),

    #[error("digitalocean api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("digitalocean api {endpoint} returned {status}: {id} - {message}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        id: String,
        message: String,
    },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid API token format")]
    InvalidToken,

    #[error("metadata service error: {0}")]
    Metadata(String),

    #[error("failed to find object")]
    NotFound,

    #[error("no address found for host")]
    NoAddressFound,

    /// Canonical form handed to the orchestrator for node-identity lookups.
    #[error("instance not found")]
    InstanceNotFound,

    #[error("cannot delete the volume {0}, it's still attached to a node")]
    VolumeInUse(String),

    #[error("volume {volume_id} is not attached to {instance_id}")]
    VolumeNotAttached { volume_id: String, instance_id: u64 },

    #[error("{0} is unimplemented")]
    Unimplemented(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error is a vendor 404 for the requested resource
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound | Self::InstanceNotFound => true,
            Self::Api { status, .. } => *status == reqwest::StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}
