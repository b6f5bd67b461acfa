//! Container address lookup.
//!
//! Used to find the router container the network's traffic is sent through.

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::InspectContainerOptions;
use torbridge_common::{BoxError, TorbridgeError, TorbridgeResult};

/// Container runtime queried for container network settings.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Primary IPv4 address of a container, `None` if it has none.
    async fn container_ipv4(&self, name: &str) -> Result<Option<String>, BoxError>;
}

/// IPv4 address of the named container.
///
/// Returns an empty string when the runtime reports no address.
///
/// # Errors
///
/// `ContainerInspectFailed` if the runtime query fails.
pub async fn container_ip<R>(runtime: &R, name: &str) -> TorbridgeResult<String>
where
    R: ContainerRuntime + ?Sized,
{
    let ip = runtime
        .container_ipv4(name)
        .await
        .map_err(|source| TorbridgeError::ContainerInspectFailed {
            container: name.to_string(),
            source,
        })?
        .unwrap_or_default();

    tracing::debug!(container = name, ip = %ip, "Resolved container address");
    Ok(ip)
}

/// Docker engine runtime.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon (socket or `DOCKER_HOST`).
    pub fn connect() -> TorbridgeResult<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(std::io::Error::other)?;
        Ok(Self { docker })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn container_ipv4(&self, name: &str) -> Result<Option<String>, BoxError> {
        let info = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await?;

        Ok(info
            .network_settings
            .and_then(|settings| settings.ip_address)
            .filter(|ip| !ip.is_empty()))
    }
}
