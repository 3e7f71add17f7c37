//! Rebuild a stack whose container names differ from the defaults.
//!
//! Arguments are forwarded to the same parser the binary uses:
//!
//! ```sh
//! cargo run --example custom_stack -- --dry-run --tunnel
//! ```

use std::process::ExitCode;

use restack::{Invocation, Pipeline, Stack, Tunnel};

fn main() -> ExitCode {
    restack::logging::init();

    let stack = Stack::new("deploy/docker-compose.yml")
        .proxy_container("media-nginx")
        .proxy_image("nginx:1.27-alpine")
        .default_host_port(8180)
        .health_path("/healthz")
        .tunnel(
            Tunnel::new("media-cloudflared")
                .image("cloudflare/cloudflared:2024.12.2")
                .profile("public"),
        );

    let invocation = match Invocation::try_parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(err) => err.exit(),
    };

    match Pipeline::new(stack).run(&invocation, &mut std::io::stdout()) {
        Ok(report) => {
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
