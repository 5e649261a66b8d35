use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fleet_deploy_rs::{
    ControlPlaneClient, CredentialProvider, EndpointProtocol, NewServiceParams,
    PromptCredentials, ReconcileState, ReconcileWorkflow, ReconcilerConfig, StaticCredentials,
    StepResult, TracingObserver, DEFAULT_INSTANCE_COUNT,
};

#[derive(Parser)]
#[command(name = "fleet-deploy")]
#[command(about = "Provision VM fleets behind a load-balanced endpoint", long_about = None)]
struct Cli {
    /// Control plane base URL
    #[arg(long, env = "FLEET_API_URL")]
    api: String,

    /// Bearer token for the control plane
    #[arg(long, env = "FLEET_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new deployment from scratch
    New {
        /// Hosted service to create the deployment in
        #[arg(long)]
        service: String,

        /// Instance names are this base plus a sequential index
        #[arg(long)]
        name_base: String,

        /// Instance size (e.g., "Small")
        #[arg(long)]
        size: String,

        /// Target location; must match the current storage account
        #[arg(long)]
        location: String,

        /// Affinity group, created at the location if absent
        #[arg(long)]
        affinity_group: String,

        /// Name of the load-balanced endpoint
        #[arg(long)]
        endpoint_name: String,

        /// Endpoint protocol
        #[arg(long, default_value = "tcp")]
        protocol: EndpointProtocol,

        /// Public port of the load-balanced endpoint
        #[arg(long)]
        public_port: u16,

        /// Local port the instances listen on
        #[arg(long)]
        local_port: u16,

        /// OS image family filter (wildcards allowed)
        #[arg(long)]
        image_family: String,

        /// Instances to create
        #[arg(long, default_value_t = DEFAULT_INSTANCE_COUNT)]
        count: u32,
    },

    /// Append instances to an existing deployment, reusing its
    /// endpoint, size, and image configuration
    Add {
        /// Hosted service holding the deployment
        #[arg(long)]
        service: String,

        /// Instance name base of the deployment to extend
        #[arg(long)]
        name_base: String,

        /// Instances to add
        #[arg(long, default_value_t = DEFAULT_INSTANCE_COUNT)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut cloud = ControlPlaneClient::new(cli.api)?;
    if let Some(token) = cli.token {
        cloud = cloud.with_bearer_token(token);
    }

    // Capture the administrator credential once, before anything runs.
    let credentials = match (
        std::env::var("FLEET_ADMIN_USER"),
        std::env::var("FLEET_ADMIN_PASSWORD"),
    ) {
        (Ok(user), Ok(password)) => {
            StaticCredentials::new(user, password).admin_credential().await?
        }
        _ => PromptCredentials.admin_credential().await?,
    };

    let mut state = match cli.command {
        Commands::New {
            service,
            name_base,
            size,
            location,
            affinity_group,
            endpoint_name,
            protocol,
            public_port,
            local_port,
            image_family,
            count,
        } => ReconcileState::new_service(
            service,
            name_base,
            NewServiceParams {
                instance_size: size,
                location,
                affinity_group,
                endpoint_name,
                protocol,
                public_port,
                local_port,
                image_family,
            },
        )
        .with_instance_count(count),

        Commands::Add {
            service,
            name_base,
            count,
        } => ReconcileState::existing_service(service, name_base).with_instance_count(count),
    };

    let workflow = ReconcileWorkflow::new(
        &cloud,
        &credentials,
        ReconcilerConfig::default(),
        &TracingObserver,
    );

    match workflow.run_to_completion(&mut state).await? {
        StepResult::Complete => {
            for name in &state.created {
                println!("created {}", name);
            }
            if !state.failed.is_empty() {
                for failure in &state.failed {
                    eprintln!("FAILED {}: {}", failure.name, failure.reason);
                }
                eprintln!(
                    "batch finished with {} failure(s); re-run to fill the gaps",
                    state.failed.len()
                );
            }
            Ok(())
        }
        StepResult::Failed(reason) => anyhow::bail!(reason),
        StepResult::Continue => unreachable!("run_to_completion never yields Continue"),
    }
}
