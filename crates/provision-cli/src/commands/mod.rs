mod run;
mod show_config;

use clap::{Args, Subcommand};
use provision_saga::CompensationPolicy;

use crate::config::{Config, FailAt, FaultArg, Overrides};
use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Provision a user against simulated collaborators
    Run(RunArgs),
    /// Print the effective configuration as TOML
    Config(SagaArgs),
}

impl Commands {
    pub(crate) async fn execute(self, config: Config) -> Result<()> {
        match self {
            Self::Run(args) => run::run(args, config).await,
            Self::Config(args) => show_config::run(&args, config),
        }
    }
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Display name of the user
    #[arg(long, default_value = "John Doe")]
    pub name: String,

    /// Email address of the user
    #[arg(long, default_value = "john@example.com")]
    pub email: String,

    #[command(flatten)]
    pub saga: SagaArgs,
}

#[derive(Args)]
pub(crate) struct SagaArgs {
    /// When compensations run after a failure: deferred or eager
    #[arg(long)]
    pub policy: Option<CompensationPolicy>,

    /// Make the forward call of this stage fail
    #[arg(long, value_enum)]
    pub fail_at: Option<FailAt>,

    /// How the injected failure manifests
    #[arg(long, value_enum)]
    pub fault: Option<FaultArg>,

    /// Delay applied to every collaborator call, in milliseconds
    #[arg(long)]
    pub latency_ms: Option<u64>,
}

impl SagaArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            policy: self.policy,
            fail_at: self.fail_at,
            fault: self.fault.map(Into::into),
            latency_ms: self.latency_ms,
        }
    }
}
