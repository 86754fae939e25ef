use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use provision_operations::providers::{FaultKind, Operation};
use provision_saga::CompensationPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Stage whose forward call is made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailAt {
    Record,
    Container,
    Upload,
    Notify,
}

impl FailAt {
    pub const fn operation(self) -> Operation {
        match self {
            Self::Record => Operation::CreateRecord,
            Self::Container => Operation::CreateContainer,
            Self::Upload => Operation::UploadObject,
            Self::Notify => Operation::Publish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FaultArg {
    /// The call returns an error
    Error,
    /// The call panics
    Panic,
}

impl From<FaultArg> for FaultKind {
    fn from(arg: FaultArg) -> Self {
        match arg {
            FaultArg::Error => Self::Error,
            FaultArg::Panic => Self::Panic,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub saga: SagaConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SagaConfig {
    pub compensation_policy: CompensationPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Delay applied to every collaborator call.
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_at: Option<FailAt>,
    pub fault: FaultKind,
}

impl SimulationConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub policy: Option<CompensationPolicy>,
    pub fail_at: Option<FailAt>,
    pub fault: Option<FaultKind>,
    pub latency_ms: Option<u64>,
}

impl Config {
    /// Load from `path`, or fall back to defaults when no file is given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(policy) = overrides.policy {
            self.saga.compensation_policy = policy;
        }
        if let Some(fail_at) = overrides.fail_at {
            self.simulation.fail_at = Some(fail_at);
        }
        if let Some(fault) = overrides.fault {
            self.simulation.fault = fault;
        }
        if let Some(latency_ms) = overrides.latency_ms {
            self.simulation.latency_ms = latency_ms;
        }
        self
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}
