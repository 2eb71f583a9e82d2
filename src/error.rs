use crate::cloud::CloudError;
use crate::provision::SetupStep;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// A remote call failed during one orchestrator step
    #[error("{step} failed: {source}")]
    Step {
        step: SetupStep,
        #[source]
        source: Box<SetupError>,
    },

    #[error("Gateway {gateway_id} entered status {status}")]
    GatewayFailed { gateway_id: String, status: String },

    #[error("Could not write state file {}: {source}", path.display())]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build deployment package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {message}", path.display())]
    ParsingFailed { path: PathBuf, message: String },
}

impl SetupError {
    /// Attach the step that was running when `self` happened.
    ///
    /// Already-wrapped errors keep their innermost step.
    pub fn at(self, step: SetupStep) -> Self {
        match self {
            err @ Self::Step { .. } => err,
            err => Self::Step {
                step,
                source: Box::new(err),
            },
        }
    }

    /// The underlying control-plane error, if any
    pub fn cloud_error(&self) -> Option<&CloudError> {
        match self {
            Self::Cloud(e) => Some(e),
            Self::Step { source, .. } => source.cloud_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_context_in_message() {
        let err = SetupError::from(CloudError::from_code(
            "CreateFunction",
            Some("AccessDeniedException"),
            "not allowed",
        ))
        .at(SetupStep::EnsureCompute);

        let message = err.to_string();
        assert!(message.starts_with("ENSURE_COMPUTE failed"));
        assert!(message.contains("AccessDeniedException"));
        assert!(err.cloud_error().is_some());
    }

    #[test]
    fn test_at_keeps_innermost_step() {
        let err = SetupError::Json(serde_json::from_str::<u8>("x").unwrap_err())
            .at(SetupStep::EnsureGateway)
            .at(SetupStep::Persist);

        match err {
            SetupError::Step { step, .. } => assert_eq!(step, SetupStep::EnsureGateway),
            other => panic!("unexpected error: {other}"),
        }
    }
}
