//! IronCore Machine Controller Manager Provider
//!
//! Command line front end of the provider: validates machine classes,
//! renders ignition and drives machine operations against IronCore.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::Client;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ironcore_mcm_provider::adapters::{InMemoryMachineStore, KubeMachineStore, KubeStoreConnector};
use ironcore_mcm_provider::driver::{
    CreateMachineRequest, DeleteMachineRequest, GetMachineStatusRequest, ListMachinesRequest,
    MachineClass, MachineRef, DEFAULT_FIELD_MANAGER, IRONCORE_CSI_DRIVER,
};
use ironcore_mcm_provider::ignition::{self, prepare_user_data};
use ironcore_mcm_provider::validation::{validate_provider_spec_and_secret, SecretScope};
use ironcore_mcm_provider::{
    Composer, ComposerConfig, Driver, DriverConfig, Error, IroncoreDriver, ProviderSpec, Target,
    PROVIDER_NAME,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// IronCore provider for the Gardener machine controller manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Butane template every ignition starts from (built-in if unset)
    #[arg(long, env = "IGNITION_TEMPLATE", global = true)]
    ignition_template: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a provider spec and machine secret
    Validate {
        /// Provider spec (JSON)
        #[arg(long)]
        provider_spec: PathBuf,

        /// Machine secret (YAML)
        #[arg(long)]
        secret: Option<PathBuf>,

        /// Require the kubeconfig and namespace keys of remote clusters
        #[arg(long)]
        remote: bool,
    },

    /// Render the ignition of a machine
    RenderIgnition {
        #[arg(long)]
        hostname: String,

        /// File holding the user data
        #[arg(long)]
        user_data: Option<PathBuf>,

        #[arg(long = "dns-server")]
        dns_servers: Vec<String>,

        /// Butane document merged into the template
        #[arg(long)]
        ignition: Option<PathBuf>,

        /// Replace lists of the template instead of appending
        #[arg(long)]
        ignition_override: bool,
    },

    /// Wrap user data for cloud-init and add SSH keys
    PrepareUserData {
        /// File holding the user data
        #[arg(long)]
        user_data: PathBuf,

        #[arg(long = "ssh-key")]
        ssh_keys: Vec<String>,
    },

    /// Create a machine
    Create {
        #[arg(long)]
        machine: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Delete a machine and wait until it is gone
    Delete {
        #[arg(long)]
        machine: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print the provider ID of a machine
    Status {
        #[arg(long)]
        machine: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the machines of a machine class
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct TargetArgs {
    /// Machine class name
    #[arg(long, default_value = "default")]
    machine_class: String,

    /// Provider spec of the machine class (JSON)
    #[arg(long)]
    provider_spec: PathBuf,

    /// Machine secret (YAML)
    #[arg(long)]
    secret: PathBuf,

    /// Namespace machines are created in
    #[arg(long, env = "IRONCORE_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Use the cluster and namespace of the secret's kubeconfig
    #[arg(long, conflicts_with = "dry_run")]
    secret_kubeconfig: bool,

    /// Keep machines in memory instead of applying them
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,

    /// Field manager of server-side applies
    #[arg(long, env = "FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    field_manager: String,

    /// CSI driver of IronCore volumes
    #[arg(long, env = "IRONCORE_CSI_DRIVER", default_value = IRONCORE_CSI_DRIVER)]
    csi_driver: String,

    /// Seconds to wait for a deleted machine to disappear
    #[arg(long, env = "DELETE_TIMEOUT_SECONDS", default_value = "600")]
    delete_timeout_seconds: u64,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let composer_config = match &args.ignition_template {
        Some(path) => ComposerConfig {
            base_template: read_string(path)?,
        },
        None => ComposerConfig::default(),
    };

    match args.command {
        Command::Validate {
            provider_spec,
            secret,
            remote,
        } => {
            let spec = ProviderSpec::from_bytes(&read(&provider_spec)?)
                .with_context(|| format!("failed to decode {}", provider_spec.display()))?;
            let secret = secret.as_deref().map(read_secret).transpose()?;
            let scope = if remote {
                SecretScope::Remote
            } else {
                SecretScope::Local
            };

            let errs = validate_provider_spec_and_secret(&spec, secret.as_ref(), scope);
            if !errs.is_empty() {
                for err in &errs {
                    println!("{err}");
                }
                anyhow::bail!("provider spec is invalid ({} errors)", errs.len());
            }
            println!("provider spec is valid");
        }

        Command::RenderIgnition {
            hostname,
            user_data,
            dns_servers,
            ignition: overlay,
            ignition_override,
        } => {
            let composer = Composer::new(composer_config)?;
            let rendered = composer.render(&ignition::Config {
                hostname,
                user_data: user_data.as_deref().map(read_string).transpose()?.unwrap_or_default(),
                dns_servers,
                ignition: overlay.as_deref().map(read_string).transpose()?.unwrap_or_default(),
                ignition_override,
            })?;
            println!("{rendered}");
        }

        Command::PrepareUserData { user_data, ssh_keys } => {
            print!("{}", prepare_user_data(&read_string(&user_data)?, &ssh_keys)?);
        }

        Command::Create { machine, target } => {
            let (driver, class, secret) = driver(&target, composer_config).await?;
            let res = driver
                .create_machine(&CreateMachineRequest {
                    machine: Some(MachineRef::new(machine)),
                    machine_class: Some(class),
                    secret: Some(secret),
                })
                .await
                .map_err(status)?;
            println!("{}\t{}", res.provider_id, res.node_name);
        }

        Command::Delete { machine, target } => {
            let (driver, class, secret) = driver(&target, composer_config).await?;
            driver
                .delete_machine(&DeleteMachineRequest {
                    machine: Some(MachineRef::new(machine.clone())),
                    machine_class: Some(class),
                    secret: Some(secret),
                })
                .await
                .map_err(status)?;
            info!(machine = %machine, "Machine deleted");
        }

        Command::Status { machine, target } => {
            let (driver, class, secret) = driver(&target, composer_config).await?;
            let res = driver
                .get_machine_status(&GetMachineStatusRequest {
                    machine: Some(MachineRef::new(machine)),
                    machine_class: Some(class),
                    secret: Some(secret),
                })
                .await
                .map_err(status)?;
            println!("{}\t{}", res.provider_id, res.node_name);
        }

        Command::List { target } => {
            let (driver, class, secret) = driver(&target, composer_config).await?;
            let res = driver
                .list_machines(&ListMachinesRequest {
                    machine_class: Some(class),
                    secret: Some(secret),
                })
                .await
                .map_err(status)?;
            for (provider_id, name) in res.machine_list {
                println!("{provider_id}\t{name}");
            }
        }
    }

    Ok(())
}

// =============================================================================
// Driver Setup
// =============================================================================

async fn driver(
    args: &TargetArgs,
    composer_config: ComposerConfig,
) -> anyhow::Result<(IroncoreDriver, MachineClass, Secret)> {
    let target = if args.dry_run {
        info!(namespace = %args.namespace, "Dry-run mode: machines are kept in memory");
        Target::Namespace {
            store: Arc::new(InMemoryMachineStore::new()),
            namespace: args.namespace.clone(),
        }
    } else if args.secret_kubeconfig {
        Target::SecretKubeconfig(Arc::new(KubeStoreConnector::new(&args.field_manager)))
    } else {
        let client = Client::try_default().await.map_err(|e| {
            error!("Failed to create Kubernetes client: {}", e);
            e
        })?;
        info!("Connected to Kubernetes cluster");
        Target::Namespace {
            store: Arc::new(KubeMachineStore::new(client, &args.field_manager)),
            namespace: args.namespace.clone(),
        }
    };

    let config = DriverConfig {
        csi_driver: args.csi_driver.clone(),
        delete_timeout: Duration::from_secs(args.delete_timeout_seconds),
        ..Default::default()
    };
    let driver = IroncoreDriver::new(target, Composer::new(composer_config)?, config);

    let class = MachineClass {
        name: args.machine_class.clone(),
        provider: PROVIDER_NAME.to_string(),
        provider_spec: read(&args.provider_spec)?,
    };
    Ok((driver, class, read_secret(&args.secret)?))
}

/// Attach the status code the machine controller would see.
fn status(err: Error) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", err.code(), err)
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_string(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load a secret manifest, folding `stringData` into `data` the way the API
/// server does.
fn read_secret(path: &Path) -> anyhow::Result<Secret> {
    let mut secret: Secret = serde_yaml::from_str(&read_string(path)?)
        .with_context(|| format!("failed to decode secret {}", path.display()))?;
    if let Some(string_data) = secret.string_data.take() {
        let data = secret.data.get_or_insert_with(BTreeMap::new);
        for (key, value) in string_data {
            data.insert(key, ByteString(value.into_bytes()));
        }
    }
    Ok(secret)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("kube=info".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
