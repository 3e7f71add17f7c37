use std::path::Path;

use crate::cmd;
use crate::error::{RebuildError, RebuildResult};
use crate::runtime::{ComposeAction, ContainerInfo, ContainerRuntime};

/// Drives the local Docker engine through the `docker` CLI.
pub struct Docker;

impl Docker {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for Docker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for Docker {
    fn check_prerequisites(&self) -> RebuildResult<()> {
        if !cmd::command_exists("docker") {
            return Err(RebuildError::PrerequisiteMissing(
                "docker not found on PATH".into(),
            ));
        }
        cmd::run("docker", &["compose", "version"]).map_err(|_| {
            RebuildError::PrerequisiteMissing("docker compose plugin not available".into())
        })?;
        Ok(())
    }

    fn compose(
        &self,
        compose_file: &Path,
        profiles: &[String],
        action: ComposeAction,
    ) -> RebuildResult<()> {
        let args = compose_args(compose_file, profiles, action);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();

        // Validation output is only interesting when it fails.
        if action == ComposeAction::Config {
            cmd::run("docker", &refs).map(|_| ())
        } else {
            cmd::run_interactive("docker", &refs)
        }
    }

    fn pull(&self, image: &str) -> RebuildResult<()> {
        cmd::run_interactive("docker", &["pull", image])
    }

    fn containers(&self) -> RebuildResult<Vec<ContainerInfo>> {
        let output = cmd::run("docker", &["ps", "--all", "--format", "{{json .}}"])?;
        parse_ps(&output)
    }

    fn host_port(&self, container: &str, port: u16) -> RebuildResult<Option<u16>> {
        let output = cmd::run("docker", &["port", container, &port.to_string()])?;
        Ok(parse_port(&output))
    }
}

/// Arguments after `docker` for a compose invocation.
#[must_use]
pub fn compose_args(compose_file: &Path, profiles: &[String], action: ComposeAction) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "-f".to_string(),
        compose_file.display().to_string(),
    ];
    for profile in profiles {
        args.push("--profile".to_string());
        args.push(profile.clone());
    }
    args.extend(action.args().into_iter().map(String::from));
    args
}

/// Full command line for a compose invocation, as shown in
/// dry-run output.
#[must_use]
pub fn compose_command_line(
    compose_file: &Path,
    profiles: &[String],
    action: ComposeAction,
) -> String {
    let args = compose_args(compose_file, profiles, action);
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    cmd::format_command("docker", &refs)
}

/// Parse `docker ps --format '{{json .}}'` output, one object per
/// line.
pub fn parse_ps(output: &str) -> RebuildResult<Vec<ContainerInfo>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(RebuildError::from))
        .collect()
}

/// Extract the host port from `docker port` output such as
/// `0.0.0.0:8098` followed by `[::]:8098`.
#[must_use]
pub fn parse_port(output: &str) -> Option<u16> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| line.rsplit(':').next()?.trim().parse().ok())
}
