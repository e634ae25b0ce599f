/// DigitalOcean cloud provider
///
/// Command line front end for the DigitalOcean cloud provider: loads the cloud
/// config, constructs the provider and runs a single capability call.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digitalocean_cloud::{
    CloudProvider, DigitalOcean, Instances, NodeName, ProviderConfig, Volumes, Zones,
};

#[derive(Parser)]
#[command(name = "do-cloud-provider")]
#[command(about = "Query the DigitalOcean cloud provider", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cloud config file path
    #[arg(short, long)]
    cloud_config: Option<PathBuf>,

    /// Read DO_API_KEY and DO_REGION_NAME instead of a config file
    #[arg(long, conflicts_with = "cloud_config")]
    from_env: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    Init,

    /// Authenticate, resolve the local droplet and show provider details
    Check,

    /// Show the addresses of a node
    NodeAddresses { name: String },

    /// Show the external ID of a node
    ExternalId { name: String },

    /// Show the instance ID of a node
    InstanceId { name: String },

    /// Show the droplet size of a node
    InstanceType { name: String },

    /// List nodes whose name contains a filter
    List {
        #[arg(default_value = "")]
        filter: String,
    },

    /// Resolve a hostname to its node name
    CurrentNodeName { hostname: String },

    /// Show the zone of the local droplet
    Zone,

    /// Block storage volume operations
    #[command(subcommand)]
    Volume(VolumeCommands),
}

#[derive(Subcommand)]
enum VolumeCommands {
    /// Create a volume
    Create {
        /// Region slug (defaults to the configured region)
        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Size in GiB
        #[arg(long)]
        size_gb: u64,
    },

    /// Delete a detached volume
    Delete { volume_id: String },

    /// Attach a volume to a droplet
    Attach {
        /// Droplet ID (defaults to the local droplet)
        #[arg(long)]
        instance: Option<u64>,
        volume_id: String,
    },

    /// Detach a volume
    Detach {
        /// Droplet ID (defaults to the local droplet)
        #[arg(long)]
        instance: Option<u64>,
        volume_id: String,
    },

    /// Show the lifecycle state of a volume
    Status { volume_id: String },

    /// Find the local device of an attached volume
    DevicePath { volume_id: String },

    /// Show the expected device path of a volume attached to a droplet
    AttachmentPath {
        /// Droplet ID (defaults to the local droplet)
        #[arg(long)]
        instance: Option<u64>,
        volume_id: String,
    },

    /// Check whether a volume is attached to a droplet
    IsAttached {
        /// Droplet ID (defaults to the local droplet)
        #[arg(long)]
        instance: Option<u64>,
        volume_id: String,
    },

    /// Check the attachment of several volumes
    AreAttached {
        /// Droplet ID (defaults to the local droplet)
        #[arg(long)]
        instance: Option<u64>,
        #[arg(required = true)]
        volume_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing; results go to stdout, logs to stderr
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "digitalocean_cloud={},do_cloud_provider={}",
                    log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        print!("{}", ProviderConfig::example().to_gcfg());
        return Ok(());
    }

    let provider = load_provider(cli).await?;

    match &cli.command {
        Commands::Init => Ok(()),
        Commands::Check => check(cli, &provider),
        Commands::Zone => emit(cli.output, &provider.zone()?),
        Commands::NodeAddresses { name } => {
            let addresses = provider
                .node_addresses(&NodeName::from(name.as_str()))
                .await
                .with_context(|| format!("Failed to get addresses of {}", name))?;
            emit(cli.output, &addresses)
        }
        Commands::ExternalId { name } => {
            let id = provider.external_id(&NodeName::from(name.as_str())).await?;
            emit(cli.output, &id)
        }
        Commands::InstanceId { name } => {
            let id = provider.instance_id(&NodeName::from(name.as_str())).await?;
            emit(cli.output, &id)
        }
        Commands::InstanceType { name } => {
            let size = provider
                .instance_type(&NodeName::from(name.as_str()))
                .await
                .with_context(|| format!("Failed to get instance type of {}", name))?;
            emit(cli.output, &size)
        }
        Commands::List { filter } => emit(cli.output, &provider.list(filter).await?),
        Commands::CurrentNodeName { hostname } => {
            emit(cli.output, &provider.current_node_name(hostname).await?)
        }
        Commands::Volume(command) => run_volume(cli, &provider, command).await,
    }
}

/// Load the cloud config and construct the provider
async fn load_provider(cli: &Cli) -> Result<DigitalOcean> {
    let provider = if cli.from_env {
        let config = ProviderConfig::from_env()
            .context("DO_API_KEY and DO_REGION_NAME must be set when using --from-env")?;
        DigitalOcean::new(config).await
    } else {
        let file = cli
            .cloud_config
            .as_ref()
            .map(File::open)
            .transpose()
            .context("Failed to open cloud config")?;
        DigitalOcean::from_config(file).await
    };

    provider.context("Failed to initialize DigitalOcean cloud provider")
}

fn check(cli: &Cli, provider: &DigitalOcean) -> Result<()> {
    info!(
        "Running on droplet {} in {}",
        provider.self_instance().droplet_id(),
        provider.self_instance().region()
    );

    let details = serde_json::json!({
        "provider": provider.provider_name(),
        "region": provider.region(),
        "local_instance_id": provider.local_instance_id()?,
        "zone": provider.zone()?,
    });
    emit(cli.output, &details)
}

async fn run_volume(cli: &Cli, provider: &DigitalOcean, command: &VolumeCommands) -> Result<()> {
    let local = provider.self_instance().droplet_id();

    match command {
        VolumeCommands::Create {
            region,
            name,
            description,
            size_gb,
        } => {
            let region = region.as_deref().unwrap_or(provider.region());
            let id = provider
                .create_volume(region, name, description, *size_gb)
                .await
                .with_context(|| format!("Failed to create volume {}", name))?;
            emit(cli.output, &id)
        }
        VolumeCommands::Delete { volume_id } => {
            provider
                .delete_volume(volume_id)
                .await
                .with_context(|| format!("Failed to delete volume {}", volume_id))?;
            info!("Volume {} deleted", volume_id);
            Ok(())
        }
        VolumeCommands::Attach {
            instance,
            volume_id,
        } => {
            let id = provider
                .attach_volume(instance.unwrap_or(local), volume_id)
                .await
                .with_context(|| format!("Failed to attach volume {}", volume_id))?;
            emit(cli.output, &id)
        }
        VolumeCommands::Detach {
            instance,
            volume_id,
        } => {
            provider
                .detach_volume(instance.unwrap_or(local), volume_id)
                .await
                .with_context(|| format!("Failed to detach volume {}", volume_id))?;
            info!("Volume {} detached", volume_id);
            Ok(())
        }
        VolumeCommands::Status { volume_id } => {
            let state = provider.volume_state(volume_id).await?;
            emit(cli.output, &state)
        }
        VolumeCommands::DevicePath { volume_id } => {
            emit(cli.output, &provider.device_path(volume_id))
        }
        VolumeCommands::AttachmentPath {
            instance,
            volume_id,
        } => {
            let path = provider
                .attachment_volume_path(instance.unwrap_or(local), volume_id)
                .await?;
            emit(cli.output, &path)
        }
        VolumeCommands::IsAttached {
            instance,
            volume_id,
        } => {
            let attached = provider
                .disk_is_attached(volume_id, instance.unwrap_or(local))
                .await?;
            emit(cli.output, &attached)
        }
        VolumeCommands::AreAttached {
            instance,
            volume_ids,
        } => {
            let attached = provider
                .disks_are_attached(volume_ids, instance.unwrap_or(local))
                .await?;
            emit(cli.output, &attached)
        }
    }
}

/// Print a result in the requested format
fn emit<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
