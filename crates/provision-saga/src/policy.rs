use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When the compensations of a failed saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompensationPolicy {
    /// Return the failure with every compensation pending. The caller
    /// decides when to call [`StageError::rollback`](crate::StageError::rollback).
    #[default]
    Deferred,
    /// Run every pending compensation before returning the failure.
    Eager,
}

impl CompensationPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Eager => "eager",
        }
    }
}

impl fmt::Display for CompensationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compensation policy '{0}' (expected 'deferred' or 'eager')")]
pub struct UnknownPolicy(String);

impl FromStr for CompensationPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deferred" => Ok(Self::Deferred),
            "eager" => Ok(Self::Eager),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}
