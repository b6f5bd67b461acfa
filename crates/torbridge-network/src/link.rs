//! Host link management.
//!
//! Each operation performs a single step of an interface's life
//! (created, addressed, up) and assumes the previous step already happened.
//! Nothing is rolled back when a later step fails.

use ipnet::{IpNet, Ipv4Net};
use torbridge_common::{TorbridgeError, TorbridgeResult};

use crate::handle::{Link, LinkHandle};
use crate::naming::DriverNaming;
use crate::retry::RetryPolicy;
use crate::veth::VethPair;

/// Link manager for bridge networks.
pub struct LinkManager<H> {
    handle: H,
    naming: DriverNaming,
    retry: RetryPolicy,
}

impl<H: LinkHandle> LinkManager<H> {
    /// Create a manager with default naming and retry policy.
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            naming: DriverNaming::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Use different naming conventions.
    #[must_use]
    pub fn with_naming(mut self, naming: DriverNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Use a different lookup retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The underlying handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    async fn lookup(&self, name: &str) -> TorbridgeResult<Link> {
        self.handle
            .link_by_name(name)
            .await
            .map_err(|e| TorbridgeError::InterfaceNotFound {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    /// IPv4 address of an interface.
    ///
    /// When the interface has several, the first one reported by the kernel
    /// is used.
    pub async fn interface_address(&self, name: &str) -> TorbridgeResult<Ipv4Net> {
        let link = self.lookup(name).await?;
        let addresses = self.handle.ipv4_addresses(&link).await.map_err(|e| {
            TorbridgeError::InterfaceNotFound {
                name: name.to_string(),
                source: Box::new(e),
            }
        })?;

        let Some(first) = addresses.first().copied() else {
            return Err(TorbridgeError::NoAddressAssigned {
                name: name.to_string(),
            });
        };
        if addresses.len() > 1 {
            tracing::info!(
                name,
                count = addresses.len(),
                address = %first,
                "Interface has more than one IPv4 address, using the first"
            );
        }
        Ok(first)
    }

    /// Add `cidr` to an interface that may have just been created.
    ///
    /// The lookup is retried under the manager's retry policy.
    pub async fn assign_address(&self, name: &str, cidr: &str) -> TorbridgeResult<()> {
        tracing::debug!(name, address = cidr, "Assigning address");

        let link = self
            .retry
            .retry(name, || self.handle.link_by_name(name))
            .await
            .map_err(|e| TorbridgeError::LinkUnavailable {
                name: name.to_string(),
                attempts: self.retry.attempts(),
                source: Box::new(e),
            })?;

        let address: IpNet = cidr.parse().map_err(|e: ipnet::AddrParseError| {
            TorbridgeError::AddressParseError {
                value: cidr.to_string(),
                reason: e.to_string(),
            }
        })?;

        self.handle
            .add_address(&link, address)
            .await
            .map_err(|e| TorbridgeError::AddressAssignFailed {
                name: name.to_string(),
                address: cidr.to_string(),
                source: Box::new(e),
            })
    }

    /// Describe a veth pair attached to `bridge_name`. The host is not modified.
    pub async fn build_veth_pair(&self, suffix: &str, bridge_name: &str) -> TorbridgeResult<VethPair> {
        let bridge = self.handle.link_by_name(bridge_name).await.map_err(|e| {
            TorbridgeError::BridgeNotFound {
                name: bridge_name.to_string(),
                source: Box::new(e),
            }
        })?;

        Ok(VethPair::new(
            self.naming.veth_name(suffix),
            self.naming.peer_name(suffix),
            bridge.index,
        ))
    }

    /// Bring an interface up.
    pub async fn activate_link(&self, name: &str) -> TorbridgeResult<()> {
        tracing::debug!(name, "Bringing link up");

        let link = self.lookup(name).await?;
        self.handle
            .set_up(&link)
            .await
            .map_err(|e| TorbridgeError::LinkActivationFailed {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    /// Create a bridge with the given MTU.
    pub async fn create_bridge(&self, name: &str, mtu: u32) -> TorbridgeResult<()> {
        tracing::debug!(name, mtu, "Creating bridge");

        self.handle
            .add_bridge(name, mtu)
            .await
            .map_err(|e| TorbridgeError::LinkCreateFailed {
                name: name.to_string(),
                kind: "bridge",
                source: Box::new(e),
            })?;

        tracing::info!(name, mtu, "Bridge created");
        Ok(())
    }

    /// Create the veth pair described by `pair`.
    pub async fn create_veth(&self, pair: &VethPair) -> TorbridgeResult<()> {
        tracing::debug!(name = %pair.name, peer = %pair.peer_name, "Creating veth pair");

        self.handle
            .add_veth(pair)
            .await
            .map_err(|e| TorbridgeError::LinkCreateFailed {
                name: pair.name.clone(),
                kind: "veth",
                source: Box::new(e),
            })
    }

    /// Delete an interface. Deleting one end of a veth pair removes both.
    pub async fn delete_link(&self, name: &str) -> TorbridgeResult<()> {
        tracing::debug!(name, "Deleting link");

        let link = self.lookup(name).await?;
        self.handle
            .delete(&link)
            .await
            .map_err(|e| TorbridgeError::LinkDeleteFailed {
                name: name.to_string(),
                source: Box::new(e),
            })
    }
}
