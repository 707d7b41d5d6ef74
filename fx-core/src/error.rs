use std::fmt;

use thiserror::Error;

/// Who is expected to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    User,
    System,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::User => write!(f, "UserError"),
            ErrorCategory::System => write!(f, "SystemError"),
        }
    }
}

/// Failure reported by a remote service. `status` is `None` when no response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Builds a remote error from a transport failure (no HTTP response).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// 4xx responses are caused by the caller; 5xx and missing responses are not.
    pub fn category(&self) -> ErrorCategory {
        match self.status {
            Some(status) if (400..500).contains(&status) => ErrorCategory::User,
            _ => ErrorCategory::System,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "no response: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

#[derive(Error, Debug)]
pub enum FxError {
    #[error("{0} is missing")]
    SomethingMissing(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("{0}")]
    Precondition(String),

    #[error("The bot has not been provisioned yet")]
    DeployWithoutProvision,

    #[error("Invalid or missing answer for question '{0}'")]
    UserInput(String),

    #[error("Working directory {0} does not exist")]
    PackDirExistence(String),

    #[error("Invalid value for {field}: {value}")]
    Validation { field: String, value: String },

    #[error("Failed to provision {resource}")]
    Provision {
        resource: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to update {config}")]
    ConfigUpdating {
        config: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to update message endpoint to {endpoint}")]
    MessageEndpointUpdating {
        endpoint: String,
        #[source]
        source: RemoteError,
    },

    #[error("Bot registration {0} was not found")]
    BotRegistrationNotFound(String),

    #[error("Failed to retrieve template archive for {group}: {message}")]
    TemplateZipFallback { group: String, message: String },

    #[error("Failed to unzip templates into {path}: {message}")]
    Unzip { path: String, message: String },

    #[error("Failed to list publishing credentials of {site}")]
    ListPublishingCredentials {
        site: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to deploy zip package to {endpoint}")]
    ZipDeploy {
        endpoint: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to restart web app {site}")]
    RestartWebApp {
        site: String,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to register resource providers: {}", providers.join(", "))]
    RegisterResourceProvider {
        providers: Vec<String>,
        #[source]
        source: Option<RemoteError>,
    },

    #[error("Command `{command}` failed in {dir}: {message}")]
    CommandExecution {
        command: String,
        dir: String,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const HELP_LINK: &str = "https://aka.ms/teamsfx-bot-help";

const CHECK_LOG: &str = "Check the log for more details.";
const RETRY: &str = "Retry the command after the issue is fixed.";

impl FxError {
    /// Short machine-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            FxError::SomethingMissing(_) => "SomethingMissingError",
            FxError::MissingParameter(_) => "MissingParameterError",
            FxError::MissingResource(_) => "MissingResourceError",
            FxError::MissingConfiguration(_) => "MissingConfigurationError",
            FxError::Precondition(_) => "PreconditionError",
            FxError::DeployWithoutProvision => "DeployWithoutProvisionError",
            FxError::UserInput(_) => "UserInputsError",
            FxError::PackDirExistence(_) => "PackDirectoryExistenceError",
            FxError::Validation { .. } => "ValidationError",
            FxError::Provision { .. } => "ProvisionError",
            FxError::ConfigUpdating { .. } => "ConfigUpdatingError",
            FxError::MessageEndpointUpdating { .. } => "MessageEndpointUpdatingError",
            FxError::BotRegistrationNotFound(_) => "BotRegistrationNotFoundError",
            FxError::TemplateZipFallback { .. } => "TemplateZipFallbackError",
            FxError::Unzip { .. } => "UnzipError",
            FxError::ListPublishingCredentials { .. } => "ListPublishingCredentialsError",
            FxError::ZipDeploy { .. } => "ZipDeployError",
            FxError::RestartWebApp { .. } => "RestartWebAppError",
            FxError::RegisterResourceProvider { .. } => "RegisterResourceProviderError",
            FxError::CommandExecution { .. } => "CommandExecutionError",
            FxError::Storage(_) => "StorageError",
            FxError::Io(_) => "IOError",
        }
    }

    /// The remote failure behind this error, if any.
    pub fn inner(&self) -> Option<&RemoteError> {
        match self {
            FxError::Provision { source, .. }
            | FxError::ConfigUpdating { source, .. }
            | FxError::MessageEndpointUpdating { source, .. }
            | FxError::ListPublishingCredentials { source, .. }
            | FxError::ZipDeploy { source, .. }
            | FxError::RestartWebApp { source, .. } => Some(source),
            FxError::RegisterResourceProvider { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FxError::Provision { source, .. }
            | FxError::ConfigUpdating { source, .. }
            | FxError::MessageEndpointUpdating { source, .. }
            | FxError::ListPublishingCredentials { source, .. }
            | FxError::ZipDeploy { source, .. }
            | FxError::RestartWebApp { source, .. } => source.category(),
            FxError::MissingResource(_) | FxError::Storage(_) | FxError::Io(_) => {
                ErrorCategory::System
            }
            _ => ErrorCategory::User,
        }
    }

    pub fn is_user_error(&self) -> bool {
        self.category() == ErrorCategory::User
    }

    /// Remediation hints rendered after the message.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            FxError::SomethingMissing(_)
            | FxError::MissingParameter(_)
            | FxError::MissingConfiguration(_)
            | FxError::Precondition(_) => vec![
                "Run the previous lifecycle steps before this one.".to_string(),
                RETRY.to_string(),
            ],
            FxError::DeployWithoutProvision => {
                vec!["Run provision before deploy.".to_string()]
            }
            FxError::UserInput(question) => {
                vec![format!("Provide a valid answer for '{}'.", question)]
            }
            FxError::PackDirExistence(_) => vec![
                "Make sure the bot project exists. Run scaffold if it was removed.".to_string(),
            ],
            FxError::Validation { field, .. } => {
                vec![format!("Correct the value of {} and retry.", field)]
            }
            FxError::BotRegistrationNotFound(_) => vec![
                "Run local debug again to recreate the bot registration.".to_string(),
            ],
            FxError::TemplateZipFallback { .. } | FxError::Unzip { .. } => vec![
                CHECK_LOG.to_string(),
                "Reopen the working directory.".to_string(),
                RETRY.to_string(),
            ],
            FxError::RegisterResourceProvider { providers, .. } => vec![
                format!(
                    "Register the resource providers {} manually in the Azure portal.",
                    providers.join(", ")
                ),
                RETRY.to_string(),
            ],
            FxError::CommandExecution { command, .. } => vec![
                format!("Run `{}` manually in the bot folder to see the error.", command),
                CHECK_LOG.to_string(),
            ],
            _ => vec![CHECK_LOG.to_string(), RETRY.to_string()],
        }
    }

    pub fn help_link(&self) -> Option<&'static str> {
        match self.category() {
            ErrorCategory::User => Some(HELP_LINK),
            ErrorCategory::System => None,
        }
    }
}

pub type FxResult<T> = std::result::Result<T, FxError>;
