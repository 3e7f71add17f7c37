pub mod docker;

use std::path::Path;

use serde::Deserialize;

use crate::error::RebuildResult;

/// A `docker compose` subcommand run against the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    /// Parse and validate the compose file.
    Config,
    Build { no_cache: bool },
    /// Tear down the stack, orphans included.
    Down,
    /// Start the stack detached.
    Up,
    /// Print the container status table.
    Ps,
}

impl ComposeAction {
    #[must_use]
    pub fn args(self) -> Vec<&'static str> {
        match self {
            Self::Config => vec!["config", "--quiet"],
            Self::Build { no_cache: true } => vec!["build", "--no-cache"],
            Self::Build { no_cache: false } => vec!["build"],
            Self::Down => vec!["down", "--remove-orphans"],
            Self::Up => vec!["up", "-d"],
            Self::Ps => vec!["ps"],
        }
    }

    /// Whether the action changes the state of the stack.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Build { .. } | Self::Down | Self::Up)
    }
}

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerInfo {
    #[serde(rename = "Names")]
    pub name: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Status", default)]
    pub status: String,
}

impl ContainerInfo {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == "running" || self.status.starts_with("Up")
    }
}

/// The container runtime the orchestrator drives.
///
/// Mutating calls are `compose` with a mutating action and `pull`;
/// everything else only inspects.
pub trait ContainerRuntime {
    /// Verify the runtime tooling is installed and usable.
    fn check_prerequisites(&self) -> RebuildResult<()>;

    /// Run `docker compose` with the given profiles.
    fn compose(
        &self,
        compose_file: &Path,
        profiles: &[String],
        action: ComposeAction,
    ) -> RebuildResult<()>;

    /// Pull an image from its registry.
    fn pull(&self, image: &str) -> RebuildResult<()>;

    /// List containers known to the runtime, stopped ones included.
    fn containers(&self) -> RebuildResult<Vec<ContainerInfo>>;

    /// Host port mapped to `port` inside `container`, if any.
    fn host_port(&self, container: &str, port: u16) -> RebuildResult<Option<u16>>;

    /// Whether a container with exactly this name is running.
    fn is_running(&self, container: &str) -> RebuildResult<bool> {
        Ok(self
            .containers()?
            .iter()
            .any(|c| c.name == container && c.is_running()))
    }
}
