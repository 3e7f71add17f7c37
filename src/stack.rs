use std::path::PathBuf;

use crate::error::{RebuildError, RebuildResult};

/// Describes the compose project being rebuilt: where the compose
/// file lives, which container fronts the stack, and the optional
/// tunnel profile.
///
/// # Example
///
/// ```
/// use restack::{Stack, Tunnel};
///
/// let stack = Stack::new("deploy/docker-compose.yml")
///     .proxy_container("files-nginx")
///     .default_host_port(8080)
///     .tunnel(Tunnel::new("files-cloudflared").profile("public"));
///
/// assert_eq!(stack.proxy_container, "files-nginx");
/// assert_eq!(stack.tunnel.unwrap().profile, "public");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub compose_file: PathBuf,
    pub proxy_container: String,
    pub proxy_image: String,
    pub proxy_port: u16,
    pub default_host_port: u16,
    pub health_path: String,
    pub tunnel: Option<Tunnel>,
}

/// The outbound tunnel container, started only when its compose
/// profile is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    pub container: String,
    pub image: String,
    pub profile: String,
}

impl Tunnel {
    #[must_use]
    pub fn new(container: &str) -> Self {
        Self {
            container: container.to_string(),
            image: "cloudflare/cloudflared:latest".to_string(),
            profile: "tunnel".to_string(),
        }
    }

    #[must_use]
    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = profile.to_string();
        self
    }
}

impl Stack {
    #[must_use]
    pub fn new(compose_file: impl Into<PathBuf>) -> Self {
        Self {
            compose_file: compose_file.into(),
            proxy_container: "filebrowser-nginx".to_string(),
            proxy_image: "nginx:alpine".to_string(),
            proxy_port: 80,
            default_host_port: 8098,
            health_path: "/".to_string(),
            tunnel: Some(Tunnel::new("filebrowser-cloudflared")),
        }
    }

    /// Default stack, with overrides read from `RESTACK_*`
    /// environment variables.
    pub fn from_env() -> RebuildResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Stack::from_env`] but reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RebuildResult<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut stack = Self::default();

        if let Some(file) = get("RESTACK_COMPOSE_FILE") {
            stack.compose_file = PathBuf::from(file);
        }
        if let Some(container) = get("RESTACK_PROXY_CONTAINER") {
            stack.proxy_container = container;
        }
        if let Some(port) = get("RESTACK_HTTP_PORT") {
            stack.default_host_port =
                port.trim().parse().map_err(|_| RebuildError::EnvInvalid {
                    name: "RESTACK_HTTP_PORT".into(),
                    value: port.clone(),
                })?;
        }
        if let (Some(container), Some(tunnel)) =
            (get("RESTACK_TUNNEL_CONTAINER"), stack.tunnel.as_mut())
        {
            tunnel.container = container;
        }
        if get("RESTACK_NO_TUNNEL").is_some() {
            stack.tunnel = None;
        }

        Ok(stack)
    }

    #[must_use]
    pub fn compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = path.into();
        self
    }

    #[must_use]
    pub fn proxy_container(mut self, name: &str) -> Self {
        self.proxy_container = name.to_string();
        self
    }

    #[must_use]
    pub fn proxy_image(mut self, image: &str) -> Self {
        self.proxy_image = image.to_string();
        self
    }

    /// Port the proxy listens on inside its container.
    #[must_use]
    pub const fn proxy_port(mut self, port: u16) -> Self {
        self.proxy_port = port;
        self
    }

    /// Host port probed when the runtime cannot report the
    /// mapping.
    #[must_use]
    pub const fn default_host_port(mut self, port: u16) -> Self {
        self.default_host_port = port;
        self
    }

    #[must_use]
    pub fn health_path(mut self, path: &str) -> Self {
        self.health_path = path.to_string();
        self
    }

    #[must_use]
    pub fn tunnel(mut self, tunnel: Tunnel) -> Self {
        self.tunnel = Some(tunnel);
        self
    }

    /// Drop tunnel support entirely; the tunnel profile is then
    /// never activated.
    #[must_use]
    pub fn without_tunnel(mut self) -> Self {
        self.tunnel = None;
        self
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new("docker-compose.yml")
    }
}
