use std::fmt;
use std::path::PathBuf;

use crate::compose::Manifest;
use crate::runtime::ComposeAction;
use crate::runtime::docker::compose_command_line;
use crate::stack::Stack;

/// Checks for the proxy container to report running.
pub const LIVENESS_ATTEMPTS: u32 = 60;

/// HTTP requests sent before the readiness probe gives up.
pub const READINESS_ATTEMPTS: u32 = 30;

/// How the tunnel profile should be chosen for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TunnelMode {
    /// Mirror whether the tunnel container is running right now.
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelSource {
    /// Set by `--tunnel` or `--no-tunnel`.
    Forced,
    /// Mirrored from the currently running containers.
    Detected,
    /// The stack has no tunnel container.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelResolution {
    pub active: bool,
    pub source: TunnelSource,
}

impl fmt::Display for TunnelResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "enabled" } else { "disabled" };
        let source = match self.source {
            TunnelSource::Forced => "forced",
            TunnelSource::Detected => "auto-detected",
            TunnelSource::Unsupported => "not configured",
        };
        write!(f, "{state} ({source})")
    }
}

/// What a failing step does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run.
    Fatal,
    /// Log and continue.
    BestEffort,
    /// Log a warning and continue; the run still succeeds.
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Validate,
    Build { no_cache: bool },
    Pull { image: String },
    Down,
    Up,
    WaitRunning { container: String, attempts: u32 },
    WaitHttp {
        container: String,
        container_port: u16,
        path: String,
        attempts: u32,
    },
    Status,
}

impl Step {
    /// The compose subcommand this step runs, if any.
    #[must_use]
    pub const fn compose_action(&self) -> Option<ComposeAction> {
        match self {
            Self::Validate => Some(ComposeAction::Config),
            Self::Build { no_cache } => Some(ComposeAction::Build {
                no_cache: *no_cache,
            }),
            Self::Down => Some(ComposeAction::Down),
            Self::Up => Some(ComposeAction::Up),
            Self::Status => Some(ComposeAction::Ps),
            Self::Pull { .. } | Self::WaitRunning { .. } | Self::WaitHttp { .. } => None,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        match self {
            Self::Validate | Self::Build { .. } | Self::Up => FailurePolicy::Fatal,
            Self::Pull { .. } | Self::Down | Self::Status => FailurePolicy::BestEffort,
            Self::WaitRunning { .. } | Self::WaitHttp { .. } => FailurePolicy::Advisory,
        }
    }

    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        match self.compose_action() {
            Some(action) => action.is_mutating(),
            None => matches!(self, Self::Pull { .. }),
        }
    }

    /// Short name used in log lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Build { .. } => "build",
            Self::Pull { .. } => "pull",
            Self::Down => "down",
            Self::Up => "up",
            Self::WaitRunning { .. } => "liveness",
            Self::WaitHttp { .. } => "readiness",
            Self::Status => "status",
        }
    }
}

/// The resolved action sequence for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub compose_file: PathBuf,
    pub profiles: Vec<String>,
    pub tunnel: TunnelResolution,
    /// Host port probed when the runtime cannot report the mapping.
    pub fallback_port: u16,
    pub steps: Vec<Step>,
}

impl Plan {
    /// Build the action sequence. Image names and the fallback
    /// port come from `manifest` when it declares them.
    #[must_use]
    pub fn new(
        stack: &Stack,
        compose_file: PathBuf,
        clean: bool,
        tunnel: TunnelResolution,
        manifest: Option<&Manifest>,
    ) -> Self {
        let image_for = |container: &str, default: &str| {
            manifest
                .and_then(|m| m.image_for(container))
                .unwrap_or(default)
                .to_string()
        };

        let active_tunnel = stack.tunnel.as_ref().filter(|_| tunnel.active);
        let profiles: Vec<String> = active_tunnel.map(|t| t.profile.clone()).into_iter().collect();

        let mut steps = vec![
            Step::Validate,
            Step::Build { no_cache: clean },
            Step::Pull {
                image: image_for(&stack.proxy_container, &stack.proxy_image),
            },
        ];
        if let Some(t) = active_tunnel {
            steps.push(Step::Pull {
                image: image_for(&t.container, &t.image),
            });
        }
        steps.extend([
            Step::Down,
            Step::Up,
            Step::WaitRunning {
                container: stack.proxy_container.clone(),
                attempts: LIVENESS_ATTEMPTS,
            },
            Step::WaitHttp {
                container: stack.proxy_container.clone(),
                container_port: stack.proxy_port,
                path: stack.health_path.clone(),
                attempts: READINESS_ATTEMPTS,
            },
            Step::Status,
        ]);

        let fallback_port = manifest
            .and_then(|m| m.published_port(&stack.proxy_container, stack.proxy_port))
            .unwrap_or(stack.default_host_port);

        Self {
            compose_file,
            profiles,
            tunnel,
            fallback_port,
            steps,
        }
    }

    /// Human-readable form of a step, with compose steps rendered
    /// as the exact command that runs.
    #[must_use]
    pub fn describe(&self, step: &Step) -> String {
        if let Some(action) = step.compose_action() {
            return compose_command_line(&self.compose_file, &self.profiles, action);
        }

        match step {
            Step::Pull { image } => format!("docker pull {image} (best effort)"),
            Step::WaitRunning {
                container,
                attempts,
            } => format!("wait for container {container} to be running (up to {attempts} checks)"),
            Step::WaitHttp {
                container,
                container_port,
                path,
                attempts,
            } => format!(
                "wait for {} to answer (host port of {container}:{container_port}, \
                 up to {attempts} requests)",
                health_url(self.fallback_port, path)
            ),
            _ => step.label().to_string(),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compose file: {}", self.compose_file.display())?;
        writeln!(f, "Tunnel profile: {}", self.tunnel)?;
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "{}. {}", index + 1, self.describe(step))?;
        }
        Ok(())
    }
}

/// URL of the health endpoint on the local host.
#[must_use]
pub fn health_url(port: u16, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("http://localhost:{port}/{path}")
}
