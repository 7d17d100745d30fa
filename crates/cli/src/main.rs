use std::path::PathBuf;
use std::process::ExitCode;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};

use clusterup_cluster_config::{ClusterConfig, DeclaredNode};
use clusterup_provision::SshProvisioner;
use clusterup_update_runner::clock::TokioClock;
use clusterup_update_runner::confirm::StdinConfirmer;
use clusterup_update_runner::probe::HttpHealthProbe;
use clusterup_update_runner::ui::HeadlessUI;
use clusterup_update_runner::{
    run_update, KubectlCluster, NodeProvisioner, UpdateOptions, UpdateOutcome, UpdateRunnerError,
};

#[derive(Parser)]
#[command(name = "clusterup", version, about = "cluster machine reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the cluster membership with the declared configuration
    Update {
        #[command(flatten)]
        cluster: ClusterArgs,
        /// Remote user for provisioning
        #[arg(long, default_value = "root")]
        ssh_user: String,
        /// Remote ssh port for provisioning
        #[arg(long, default_value_t = 22)]
        ssh_port: u16,
        /// Bootstrap script streamed to added nodes
        #[arg(long, default_value = "scripts/bootstrap.sh")]
        install_script: PathBuf,
        /// Cleanup script streamed to removed nodes
        #[arg(long, default_value = "scripts/cleanup.sh")]
        cleanup_script: PathBuf,
    },
    /// Show the reconciliation plan without executing it
    Plan {
        #[command(flatten)]
        cluster: ClusterArgs,
    },
}

#[derive(Args)]
struct ClusterArgs {
    /// Path to the kubeconfig used to reach the cluster
    #[arg(long)]
    kube_config: Option<PathBuf>,
    /// Path to the declared cluster configuration
    #[arg(long, default_value = "cluster.yaml")]
    cluster_config: PathBuf,
}

impl ClusterArgs {
    fn load(&self) -> anyhow::Result<(KubectlCluster, ClusterConfig)> {
        let kube_config = self.kube_config.clone().ok_or_else(|| {
            anyhow::anyhow!("Unable to find a kubeconfig. Pass it with --kube-config.")
        })?;

        let config = ClusterConfig::load(&self.cluster_config)?;
        Ok((KubectlCluster::new(kube_config), config))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Update {
            cluster,
            ssh_user,
            ssh_port,
            install_script,
            cleanup_script,
        } => {
            let (backend, config) = cluster.load()?;
            let provisioner =
                SshProvisioner::new(ssh_user, ssh_port, install_script, cleanup_script);

            let outcome = run_update(
                &backend,
                &provisioner,
                &HttpHealthProbe::new(),
                &TokioClock,
                &mut StdinConfirmer,
                &config,
                UpdateOptions::default(),
                &mut HeadlessUI,
            )
            .await?;

            if let UpdateOutcome::Declined = outcome {
                println!("Operation not confirmed, nothing was changed.");
            }
        }
        Commands::Plan { cluster } => {
            let (backend, config) = cluster.load()?;

            let outcome = run_update(
                &backend,
                &NoopProvisioner,
                &HttpHealthProbe::new(),
                &TokioClock,
                &mut StdinConfirmer,
                &config,
                UpdateOptions { dry_run: true },
                &mut HeadlessUI,
            )
            .await?;

            if let UpdateOutcome::Planned(plan) = outcome {
                if plan.is_empty() {
                    println!("Cluster membership is up to date.");
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Platzhalter für den Dry-Run - der Plan-Pfad provisioniert nie.
struct NoopProvisioner;

#[async_trait]
impl NodeProvisioner for NoopProvisioner {
    async fn install(&self, _node: &DeclaredNode) -> Result<(), UpdateRunnerError> {
        Ok(())
    }

    async fn teardown(&self, _node: &DeclaredNode) -> Result<(), UpdateRunnerError> {
        Ok(())
    }
}
