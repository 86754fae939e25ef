use provision_saga::{StageError, Tagged};
use thiserror::Error;

/// A modeled failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProvisionFault {
    #[error("record store rejected user '{email}'")]
    RecordRejected { email: String },

    #[error("container '{container}' is unavailable")]
    ContainerUnavailable { container: String },

    #[error("upload to container '{container}' was rejected: {reason}")]
    UploadRejected { container: String, reason: String },

    #[error("notification for user '{user_id}' was rejected")]
    PublishRejected { user_id: String },

    #[error("{kind} '{id}' could not be released")]
    ReleaseRejected { kind: &'static str, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
}

impl Tagged for ProvisionFault {
    fn tag(&self) -> &'static str {
        match self {
            Self::RecordRejected { .. } => "RecordRejected",
            Self::ContainerUnavailable { .. } => "ContainerUnavailable",
            Self::UploadRejected { .. } => "UploadRejected",
            Self::PublishRejected { .. } => "PublishRejected",
            Self::ReleaseRejected { .. } => "ReleaseRejected",
            Self::NotFound { .. } => "NotFound",
        }
    }
}

/// The failure class of a provisioning stage.
///
/// Container creation and upload share [`ProvisionStage::Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionStage {
    RecordCreate,
    Resource,
    Notification,
}

impl ProvisionStage {
    pub const ALL: [Self; 3] = [Self::RecordCreate, Self::Resource, Self::Notification];
}

impl Tagged for ProvisionStage {
    fn tag(&self) -> &'static str {
        match self {
            Self::RecordCreate => "RecordCreateError",
            Self::Resource => "ResourceError",
            Self::Notification => "NotificationError",
        }
    }
}

/// A provisioning run that stopped at a stage.
///
/// Borrows the context whose collaborators its pending compensations call.
pub type ProvisionError<'a> = StageError<'a, ProvisionStage, ProvisionFault>;

pub type Result<T> = std::result::Result<T, ProvisionFault>;
