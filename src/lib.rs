//! Idempotent rebuild-and-restart for a docker compose stack.
//!
//! `restack` stops, rebuilds, and restarts a file-browser stack
//! served behind an Nginx reverse proxy, with an optional
//! Cloudflare tunnel enabled through a compose profile. Once the
//! stack is up it waits for the proxy container to run and for
//! the proxy to answer HTTP requests.
//!
//! # Overview
//!
//! A run is driven by a [`Pipeline`] built from:
//!
//! - A [`Stack`] describing the compose project (compose file,
//!   proxy container, optional [`Tunnel`])
//! - A [`ContainerRuntime`](runtime::ContainerRuntime), by default
//!   [`Docker`] which shells out to the `docker` CLI
//! - An [`HttpProbe`](probe::HttpProbe) for the readiness check,
//!   by default [`HttpClient`]
//!
//! # Action sequence
//!
//! 1. **Validate** - `docker compose config` (fatal)
//! 2. **Build** - `docker compose build`, `--no-cache` with
//!    `--clean` (fatal)
//! 3. **Pull** - proxy image, and tunnel image when active (best
//!    effort)
//! 4. **Down** - `docker compose down --remove-orphans` (best
//!    effort)
//! 5. **Up** - `docker compose up -d` (fatal)
//! 6. **Liveness** - up to 60 checks for the proxy container
//!    (warning on timeout)
//! 7. **Readiness** - up to 30 HTTP requests to the proxy
//!    (warning on timeout)
//! 8. **Status** - `docker compose ps`
//!
//! The tunnel profile is forced with `--tunnel` / `--no-tunnel`
//! (last one wins) or mirrors whether the tunnel container is
//! running right now.
//!
//! # Example
//!
//! ```rust,no_run
//! use restack::{Invocation, Pipeline, Stack, Tunnel};
//!
//! fn main() -> Result<(), restack::error::RebuildError> {
//!     let stack = Stack::new("docker-compose.yml")
//!         .proxy_container("filebrowser-nginx")
//!         .default_host_port(8098)
//!         .tunnel(Tunnel::new("filebrowser-cloudflared"));
//!
//!     let invocation = Invocation::try_parse_from(["restack", "--clean"])
//!         .expect("valid arguments");
//!
//!     let report = Pipeline::new(stack).run(&invocation, &mut std::io::stdout())?;
//!     assert!(report.warnings.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! Preview without touching the stack:
//!
//! ```sh
//! restack --dry-run --tunnel --clean
//! ```

// Allow noisy pedantic lints that don't add value for an
// operational tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cli;
pub mod cmd;
pub mod compose;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod probe;
pub mod runtime;
pub mod stack;
pub mod wait;

pub use compose::Manifest;
pub use pipeline::{Invocation, Pipeline, Report};
pub use plan::{Plan, Step, TunnelMode};
pub use probe::HttpClient;
pub use runtime::docker::Docker;
pub use stack::{Stack, Tunnel};
