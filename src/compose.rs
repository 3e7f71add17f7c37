use std::path::Path;

use docker_compose_types::{Compose, Ports, Service};
use indexmap::IndexMap;

use crate::error::RebuildResult;

/// Read-only view of a `docker-compose.yml`.
///
/// Only used to discover names the stack refers to (images,
/// published ports). `docker compose config` stays the authority
/// on whether the file is valid.
#[derive(Debug, Clone)]
pub struct Manifest {
    compose: Compose,
}

impl Manifest {
    pub fn load(path: &Path) -> RebuildResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> RebuildResult<Self> {
        let compose: Compose = serde_yaml::from_str(content)?;
        Ok(Self { compose })
    }

    #[must_use]
    pub const fn services(&self) -> &IndexMap<String, Option<Service>> {
        &self.compose.services.0
    }

    /// Find a service by container name, falling back to the
    /// service key when no `container_name` is set.
    #[must_use]
    pub fn service_for(&self, container: &str) -> Option<&Service> {
        let services = self.services();

        services
            .values()
            .flatten()
            .find(|svc| svc.container_name.as_deref() == Some(container))
            .or_else(|| {
                services
                    .get(container)
                    .and_then(Option::as_ref)
                    .filter(|svc| svc.container_name.is_none())
            })
    }

    #[must_use]
    pub fn image_for(&self, container: &str) -> Option<&str> {
        self.service_for(container)?.image.as_deref()
    }

    /// Host port published for `target` on the given container,
    /// from the short `ports:` syntax.
    #[must_use]
    pub fn published_port(&self, container: &str, target: u16) -> Option<u16> {
        match &self.service_for(container)?.ports {
            Ports::Short(entries) => entries
                .iter()
                .find_map(|entry| parse_short_port(entry, target)),
            _ => None,
        }
    }
}

/// Parse `[HOST_IP:]PUBLISHED:TARGET[/PROTO]` and return the
/// published port when the target matches.
fn parse_short_port(entry: &str, target: u16) -> Option<u16> {
    let mapping = entry.split('/').next()?.trim();
    let mut parts = mapping.rsplit(':');

    let container_port: u16 = parts.next()?.parse().ok()?;
    if container_port != target {
        return None;
    }
    parts.next()?.parse().ok()
}
