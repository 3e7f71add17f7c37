use std::path::PathBuf;
use std::process::ExitStatus;

pub type RebuildResult<T> = Result<T, RebuildError>;

#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("compose file not found: {}", .0.display())]
    ComposeFileMissing(PathBuf),

    #[error("invalid value for {name}: '{value}'")]
    EnvInvalid { name: String, value: String },

    #[error("container '{0}' did not report running after {1} attempts")]
    ContainerTimeout(String, u32),

    #[error("{0} did not answer with a success status after {1} attempts")]
    HttpTimeout(String, u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
