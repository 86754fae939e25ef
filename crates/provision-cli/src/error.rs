use std::path::PathBuf;

use provision_saga::UnhandledTag;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render configuration")]
    ConfigRender(#[from] toml::ser::Error),

    #[error("{tag}: step '{step}' failed: {reason}")]
    Provisioning {
        tag: &'static str,
        step: &'static str,
        reason: String,
    },

    #[error("rollback incomplete: {failed} compensation(s) failed")]
    RollbackIncomplete { failed: usize },

    #[error("no handler for saga outcome")]
    UnhandledOutcome(#[from] UnhandledTag),
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::CliError;

    #[test]
    fn config_read_error_includes_path_and_source() {
        let err = CliError::ConfigRead {
            path: PathBuf::from("/etc/provision.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        assert!(err.to_string().contains("/etc/provision.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn provisioning_error_names_stage_and_step() {
        let err = CliError::Provisioning {
            tag: "ResourceError",
            step: "upload_object",
            reason: "upload rejected".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "ResourceError: step 'upload_object' failed: upload rejected"
        );
    }

    #[test]
    fn unhandled_tag_converts_via_from() {
        let err: CliError = provision_saga::UnhandledTag { tag: "Mystery" }.into();

        assert!(matches!(err, CliError::UnhandledOutcome(_)));
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("unhandled tag: Mystery".to_string())
        );
    }
}
