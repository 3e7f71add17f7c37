#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write as _;
use std::os::unix::process::ExitStatusExt as _;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;

use restack::error::{RebuildError, RebuildResult};
use restack::probe::HttpProbe;
use restack::runtime::{ComposeAction, ContainerInfo, ContainerRuntime};
use restack::runtime::docker::compose_command_line;
use tempfile::TempDir;

pub const COMPOSE_YML: &str = r#"
services:
  filebrowser:
    image: filebrowser/filebrowser:latest
    container_name: filebrowser
  nginx:
    image: nginx:1.27-alpine
    container_name: filebrowser-nginx
    ports:
      - "9090:80"
    depends_on:
      - filebrowser
  cloudflared:
    image: cloudflare/cloudflared:2024.6.0
    container_name: filebrowser-cloudflared
    profiles:
      - tunnel
"#;

/// Write a compose file into a fresh temporary directory.
pub fn compose_dir(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("docker-compose.yml");
    let mut file = std::fs::File::create(&path).expect("create compose file");
    file.write_all(content.as_bytes()).expect("write compose file");
    (dir, path)
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    running: Vec<String>,
    /// Liveness checks before the proxy reports running.
    up_after: Option<u32>,
    liveness_checks: u32,
    port: Option<u16>,
    port_fails: bool,
    fail_pull: bool,
    fail_down: bool,
    fail_build: bool,
    fail_ps: bool,
}

/// Records every runtime call instead of touching docker.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    state: Rc<RefCell<State>>,
}

fn failure(command: &str) -> RebuildError {
    RebuildError::CommandFailed {
        command: command.to_string(),
        status: ExitStatus::from_raw(1 << 8),
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_running(self, name: &str) -> Self {
        self.state.borrow_mut().running.push(name.to_string());
        self
    }

    /// The proxy reports running from the given liveness check on.
    pub fn proxy_up_after(self, checks: u32) -> Self {
        self.state.borrow_mut().up_after = Some(checks);
        self
    }

    pub fn port(self, port: u16) -> Self {
        self.state.borrow_mut().port = Some(port);
        self
    }

    pub fn port_fails(self) -> Self {
        self.state.borrow_mut().port_fails = true;
        self
    }

    pub fn fail_pull(self) -> Self {
        self.state.borrow_mut().fail_pull = true;
        self
    }

    pub fn fail_down(self) -> Self {
        self.state.borrow_mut().fail_down = true;
        self
    }

    pub fn fail_build(self) -> Self {
        self.state.borrow_mut().fail_build = true;
        self
    }

    pub fn fail_ps(self) -> Self {
        self.state.borrow_mut().fail_ps = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Calls that would change the stack.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.starts_with("docker pull")
                    || c.contains(" build")
                    || c.contains(" down")
                    || c.contains(" up -d")
            })
            .collect()
    }

    pub fn liveness_checks(&self) -> u32 {
        self.state.borrow().liveness_checks
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl ContainerRuntime for FakeRuntime {
    fn check_prerequisites(&self) -> RebuildResult<()> {
        Ok(())
    }

    fn compose(
        &self,
        compose_file: &Path,
        profiles: &[String],
        action: ComposeAction,
    ) -> RebuildResult<()> {
        let line = compose_command_line(compose_file, profiles, action);
        self.record(line.clone());

        let state = self.state.borrow();
        match action {
            ComposeAction::Build { .. } if state.fail_build => Err(failure(&line)),
            ComposeAction::Down if state.fail_down => Err(failure(&line)),
            ComposeAction::Ps if state.fail_ps => Err(failure(&line)),
            _ => Ok(()),
        }
    }

    fn pull(&self, image: &str) -> RebuildResult<()> {
        let line = format!("docker pull {image}");
        self.record(line.clone());
        if self.state.borrow().fail_pull {
            Err(failure(&line))
        } else {
            Ok(())
        }
    }

    fn containers(&self) -> RebuildResult<Vec<ContainerInfo>> {
        self.record("docker ps".to_string());
        let state = self.state.borrow();
        Ok(state
            .running
            .iter()
            .map(|name| ContainerInfo {
                name: name.clone(),
                state: "running".to_string(),
                status: "Up 2 minutes".to_string(),
            })
            .collect())
    }

    fn host_port(&self, container: &str, port: u16) -> RebuildResult<Option<u16>> {
        self.record(format!("docker port {container} {port}"));
        let state = self.state.borrow();
        if state.port_fails {
            Err(failure("docker port"))
        } else {
            Ok(state.port)
        }
    }

    fn is_running(&self, container: &str) -> RebuildResult<bool> {
        if container != "filebrowser-nginx" {
            return Ok(self
                .containers()?
                .iter()
                .any(|c| c.name == container && c.is_running()));
        }

        self.record(format!("liveness {container}"));
        let mut state = self.state.borrow_mut();
        state.liveness_checks += 1;
        let checks = state.liveness_checks;
        Ok(state.up_after.is_some_and(|n| checks >= n))
    }
}

#[derive(Default)]
struct ProbeState {
    urls: Vec<String>,
    ready_after: Option<u32>,
}

/// Answers successfully from the n-th request on, or never.
#[derive(Clone, Default)]
pub struct FakeProbe {
    state: Rc<RefCell<ProbeState>>,
}

impl FakeProbe {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn ready_after(requests: u32) -> Self {
        let probe = Self::default();
        probe.state.borrow_mut().ready_after = Some(requests);
        probe
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().urls.clone()
    }
}

impl HttpProbe for FakeProbe {
    fn is_reachable(&self, url: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.urls.push(url.to_string());
        let count = u32::try_from(state.urls.len()).unwrap_or(u32::MAX);
        state.ready_after.is_some_and(|n| count >= n)
    }
}
