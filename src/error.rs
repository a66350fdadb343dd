use thiserror::Error;

/// Fail-fast errors surfaced at startup or at first use of an optional
/// feature (email, content filters). Per-host DNS/HTTP failures never
/// construct this type; those are swallowed at the source.
#[derive(Error, Debug)]
pub enum EnumError {
    #[error("{0} is not a valid domain")]
    InvalidApex(String),

    #[error("dictionary file {0} is not readable: {1}")]
    DictUnreadable(String, std::io::Error),

    #[error("config file {0} is not readable: {1}")]
    ConfigUnreadable(String, std::io::Error),

    #[error("config file {0} is not valid YAML: {1}")]
    ConfigInvalid(String, serde_yaml::Error),

    #[error("invalid --start-time {0}, expected HH:MM")]
    InvalidStartTime(String),

    #[error("-mf is required when --start-time is given")]
    MonitorFileRequired,

    #[error("email is enabled but config.yaml is missing {0}")]
    EmailConfigIncomplete(&'static str),

    #[error("failed to send notification email: {0}")]
    EmailSendFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EnumError>;
