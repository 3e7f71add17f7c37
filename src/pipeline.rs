use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};

use crate::compose::Manifest;
use crate::error::{RebuildError, RebuildResult};
use crate::plan::{
    FailurePolicy, Plan, Step, TunnelMode, TunnelResolution, TunnelSource, health_url,
};
use crate::probe::{HttpClient, HttpProbe};
use crate::runtime::ContainerRuntime;
use crate::runtime::docker::Docker;
use crate::stack::Stack;
use crate::wait;

/// Settings for one run, fixed once parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub clean: bool,
    pub tunnel: TunnelMode,
    pub dry_run: bool,
    pub compose_file: Option<PathBuf>,
}

impl Invocation {
    /// Parse command-line arguments, the program name first.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from_cli)
    }

    fn from_cli(cli: Cli) -> Self {
        // overrides_with leaves only the flag given last set.
        let tunnel = if cli.tunnel {
            TunnelMode::On
        } else if cli.no_tunnel {
            TunnelMode::Off
        } else {
            TunnelMode::Auto
        };

        Self {
            clean: cli.clean,
            tunnel,
            dry_run: cli.dry_run,
            compose_file: cli.file,
        }
    }
}

#[derive(Parser)]
#[command(name = "restack")]
#[command(about = "Stop, rebuild, and restart the file-browser compose stack")]
#[command(args_override_self = true)]
struct Cli {
    /// Build images without the layer cache
    #[arg(long)]
    clean: bool,

    /// Start the tunnel profile
    #[arg(long, overrides_with = "no_tunnel")]
    tunnel: bool,

    /// Leave the tunnel profile stopped
    #[arg(long = "no-tunnel", overrides_with = "tunnel")]
    no_tunnel: bool,

    /// Print the planned steps without executing them
    #[arg(long)]
    dry_run: bool,

    /// Compose file to use instead of the configured one
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: Option<PathBuf>,
}

/// Outcome of a run that did not hit a fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub dry_run: bool,
    pub tunnel: bool,
    pub running: bool,
    pub reachable: bool,
    /// Health URL that was probed.
    pub url: Option<String>,
    /// Best-effort failures and timeouts, in order.
    pub warnings: Vec<String>,
}

/// Rebuild orchestrator: resolves the plan for an invocation and
/// drives the container runtime through it.
pub struct Pipeline {
    stack: Stack,
    runtime: Box<dyn ContainerRuntime>,
    probe: Option<Box<dyn HttpProbe>>,
    poll_interval: Duration,
}

impl Pipeline {
    #[must_use]
    pub fn new(stack: Stack) -> Self {
        Self {
            stack,
            runtime: Box::new(Docker::new()),
            probe: None,
            poll_interval: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn runtime(mut self, runtime: impl ContainerRuntime + 'static) -> Self {
        self.runtime = Box::new(runtime);
        self
    }

    /// Readiness probe to use instead of an [`HttpClient`] built
    /// at run time.
    #[must_use]
    pub fn probe(mut self, probe: impl HttpProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Delay between liveness and readiness checks.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Run the invocation. In dry-run mode the plan is written to
    /// `out` and nothing is executed.
    pub fn run(&self, invocation: &Invocation, out: &mut dyn Write) -> RebuildResult<Report> {
        let plan = self.plan(invocation)?;

        if invocation.dry_run {
            eprintln!("=== Dry run: no changes will be made ===");
            write!(out, "{plan}")?;
            return Ok(Report {
                dry_run: true,
                tunnel: plan.tunnel.active,
                ..Report::default()
            });
        }

        let default_probe;
        let probe: &dyn HttpProbe = match &self.probe {
            Some(probe) => probe.as_ref(),
            None => {
                default_probe = HttpClient::new()?;
                &default_probe
            }
        };

        self.runtime.check_prerequisites()?;
        self.execute(&plan, probe)
    }

    /// Resolve the compose file and tunnel profile into a plan.
    /// Only inspects the runtime.
    pub fn plan(&self, invocation: &Invocation) -> RebuildResult<Plan> {
        let compose_file = invocation
            .compose_file
            .clone()
            .unwrap_or_else(|| self.stack.compose_file.clone());

        if !compose_file.is_file() {
            return Err(RebuildError::ComposeFileMissing(compose_file));
        }

        let manifest = match Manifest::load(&compose_file) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                debug!(%err, "compose file not understood locally, using stack defaults");
                None
            }
        };

        let tunnel = self.resolve_tunnel(invocation.tunnel);
        info!(tunnel = %tunnel, file = %compose_file.display(), "resolved invocation");

        Ok(Plan::new(
            &self.stack,
            compose_file,
            invocation.clean,
            tunnel,
            manifest.as_ref(),
        ))
    }

    /// Decide whether the tunnel profile is active. `Auto` mirrors
    /// the tunnel container's current state.
    pub fn resolve_tunnel(&self, mode: TunnelMode) -> TunnelResolution {
        let Some(tunnel) = &self.stack.tunnel else {
            if mode == TunnelMode::On {
                warn!("--tunnel ignored: this stack has no tunnel container");
            }
            return TunnelResolution {
                active: false,
                source: TunnelSource::Unsupported,
            };
        };

        let (active, source) = match mode {
            TunnelMode::On => (true, TunnelSource::Forced),
            TunnelMode::Off => (false, TunnelSource::Forced),
            TunnelMode::Auto => {
                let running = self.runtime.is_running(&tunnel.container).unwrap_or_else(|err| {
                    warn!(%err, "could not inspect containers, assuming no tunnel");
                    false
                });
                (running, TunnelSource::Detected)
            }
        };

        TunnelResolution { active, source }
    }

    fn execute(&self, plan: &Plan, probe: &dyn HttpProbe) -> RebuildResult<Report> {
        let mut report = Report {
            tunnel: plan.tunnel.active,
            ..Report::default()
        };

        for step in &plan.steps {
            info!("{}", plan.describe(step));

            let Err(err) = self.perform(plan, step, probe, &mut report) else {
                continue;
            };

            match step.policy() {
                FailurePolicy::Fatal => return Err(err),
                FailurePolicy::BestEffort => {
                    warn!(%err, "{} failed, continuing", step.label());
                    report.warnings.push(format!("{}: {err}", step.label()));
                }
                FailurePolicy::Advisory => {
                    warn!("{err}");
                    report.warnings.push(err.to_string());
                }
            }
        }

        match &report.url {
            Some(url) if report.reachable => info!("Stack is up: {url}"),
            _ => warn!("Stack started, but did not confirm it is serving"),
        }
        if !report.warnings.is_empty() {
            info!(warnings = report.warnings.len(), "finished with warnings");
        }

        Ok(report)
    }

    fn perform(
        &self,
        plan: &Plan,
        step: &Step,
        probe: &dyn HttpProbe,
        report: &mut Report,
    ) -> RebuildResult<()> {
        if let Some(action) = step.compose_action() {
            return self
                .runtime
                .compose(&plan.compose_file, &plan.profiles, action);
        }

        match step {
            Step::Pull { image } => self.runtime.pull(image),
            Step::WaitRunning {
                container,
                attempts,
            } => {
                report.running = self.wait_running(container, *attempts);
                if report.running {
                    Ok(())
                } else {
                    Err(RebuildError::ContainerTimeout(container.clone(), *attempts))
                }
            }
            Step::WaitHttp {
                container,
                container_port,
                path,
                attempts,
            } => {
                let port = self.host_port(container, *container_port, plan.fallback_port);
                let url = health_url(port, path);
                report.url = Some(url.clone());
                report.reachable = self.wait_http(probe, &url, *attempts);
                if report.reachable {
                    Ok(())
                } else {
                    Err(RebuildError::HttpTimeout(url, *attempts))
                }
            }
            _ => Ok(()),
        }
    }

    /// Poll until `container` reports running. Inspection errors
    /// count as "not yet".
    pub fn wait_running(&self, container: &str, attempts: u32) -> bool {
        wait::poll_until(attempts, self.poll_interval, |attempt| {
            let running = self.runtime.is_running(container).unwrap_or(false);
            debug!(attempt, attempts, running, "liveness check");
            running
        })
        .is_some()
    }

    /// Poll `url` until it answers with a success status.
    pub fn wait_http(&self, probe: &dyn HttpProbe, url: &str, attempts: u32) -> bool {
        wait::poll_until(attempts, self.poll_interval, |attempt| {
            let reachable = probe.is_reachable(url);
            debug!(attempt, attempts, reachable, "readiness check");
            reachable
        })
        .is_some()
    }

    /// Host port mapped to the container port, or `fallback` when
    /// the runtime cannot tell.
    pub fn host_port(&self, container: &str, container_port: u16, fallback: u16) -> u16 {
        match self.runtime.host_port(container, container_port) {
            Ok(Some(port)) => port,
            Ok(None) => fallback,
            Err(err) => {
                debug!(%err, fallback, "port mapping unreadable");
                fallback
            }
        }
    }
}
