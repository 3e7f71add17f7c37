use std::path::PathBuf;

use restack::plan::{
    FailurePolicy, LIVENESS_ATTEMPTS, READINESS_ATTEMPTS, TunnelResolution, TunnelSource,
};
use restack::{Manifest, Plan, Stack, Step};

fn tunnel(active: bool) -> TunnelResolution {
    TunnelResolution {
        active,
        source: TunnelSource::Forced,
    }
}

fn plan(clean: bool, active: bool) -> Plan {
    Plan::new(
        &Stack::default(),
        PathBuf::from("docker-compose.yml"),
        clean,
        tunnel(active),
        None,
    )
}

#[test]
fn step_order_with_tunnel() {
    let plan = plan(false, true);

    assert_eq!(
        plan.steps,
        vec![
            Step::Validate,
            Step::Build { no_cache: false },
            Step::Pull {
                image: "nginx:alpine".into()
            },
            Step::Pull {
                image: "cloudflare/cloudflared:latest".into()
            },
            Step::Down,
            Step::Up,
            Step::WaitRunning {
                container: "filebrowser-nginx".into(),
                attempts: LIVENESS_ATTEMPTS,
            },
            Step::WaitHttp {
                container: "filebrowser-nginx".into(),
                container_port: 80,
                path: "/".into(),
                attempts: READINESS_ATTEMPTS,
            },
            Step::Status,
        ]
    );
    assert_eq!(plan.profiles, vec!["tunnel".to_string()]);
}

#[test]
fn no_tunnel_pull_without_tunnel() {
    let plan = plan(false, false);

    let pulls: Vec<&Step> = plan
        .steps
        .iter()
        .filter(|s| matches!(s, Step::Pull { .. }))
        .collect();
    assert_eq!(pulls.len(), 1);
    assert!(plan.profiles.is_empty());
}

#[test]
fn windows_are_sixty_and_thirty() {
    assert_eq!(LIVENESS_ATTEMPTS, 60);
    assert_eq!(READINESS_ATTEMPTS, 30);
}

#[test]
fn rendered_plan_lists_each_step_once_in_order() {
    let text = plan(true, true).to_string();

    let expected = [
        "1. docker compose -f docker-compose.yml --profile tunnel config --quiet",
        "2. docker compose -f docker-compose.yml --profile tunnel build --no-cache",
        "3. docker pull nginx:alpine (best effort)",
        "4. docker pull cloudflare/cloudflared:latest (best effort)",
        "5. docker compose -f docker-compose.yml --profile tunnel down --remove-orphans",
        "6. docker compose -f docker-compose.yml --profile tunnel up -d",
        "7. wait for container filebrowser-nginx to be running (up to 60 checks)",
        "8. wait for http://localhost:8098/ to answer",
        "9. docker compose -f docker-compose.yml --profile tunnel ps",
    ];

    let numbered: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with(|c: char| c.is_ascii_digit()))
        .collect();
    assert_eq!(numbered.len(), expected.len());
    for (line, prefix) in numbered.iter().zip(expected) {
        assert!(line.starts_with(prefix), "{line:?} should start with {prefix:?}");
    }
}

#[test]
fn rendered_plan_states_tunnel_resolution() {
    assert!(plan(false, true).to_string().contains("Tunnel profile: enabled (forced)"));
    assert!(plan(false, false).to_string().contains("Tunnel profile: disabled (forced)"));
}

#[test]
fn without_tunnel_support_never_adds_profile() {
    let plan = Plan::new(
        &Stack::default().without_tunnel(),
        PathBuf::from("c.yml"),
        false,
        tunnel(true),
        None,
    );

    assert!(plan.profiles.is_empty());
    assert!(!plan.to_string().contains("--profile"));
}

#[test]
fn manifest_supplies_images_and_port() {
    let manifest = Manifest::parse(
        r#"
services:
  web:
    image: nginx:1.27
    container_name: filebrowser-nginx
    ports:
      - "127.0.0.1:8181:80"
  cloudflared:
    image: cloudflare/cloudflared:2024.6.0
    container_name: filebrowser-cloudflared
"#,
    )
    .unwrap();

    let plan = Plan::new(
        &Stack::default(),
        PathBuf::from("c.yml"),
        false,
        tunnel(true),
        Some(&manifest),
    );

    assert_eq!(plan.fallback_port, 8181);
    assert!(plan.steps.contains(&Step::Pull {
        image: "nginx:1.27".into()
    }));
    assert!(plan.steps.contains(&Step::Pull {
        image: "cloudflare/cloudflared:2024.6.0".into()
    }));
}

#[test]
fn custom_health_path_in_description() {
    let stack = Stack::default().health_path("/health").default_host_port(9000);
    let plan = Plan::new(&stack, PathBuf::from("c.yml"), false, tunnel(false), None);

    assert!(plan.to_string().contains("http://localhost:9000/health"));
}

#[test]
fn step_policies() {
    let plan = plan(false, true);
    let policies: Vec<FailurePolicy> = plan.steps.iter().map(Step::policy).collect();

    assert_eq!(
        policies,
        vec![
            FailurePolicy::Fatal,
            FailurePolicy::Fatal,
            FailurePolicy::BestEffort,
            FailurePolicy::BestEffort,
            FailurePolicy::BestEffort,
            FailurePolicy::Fatal,
            FailurePolicy::Advisory,
            FailurePolicy::Advisory,
            FailurePolicy::BestEffort,
        ]
    );
}
