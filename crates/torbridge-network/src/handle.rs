//! Host link access.
//!
//! [`LinkHandle`] is the seam between the link manager and the kernel. The
//! production implementation is [`NetlinkHandle`](crate::netlink::NetlinkHandle).

use std::io;

use async_trait::async_trait;
use ipnet::{IpNet, Ipv4Net};
use thiserror::Error;

use crate::veth::VethPair;

/// A host interface, referenced by name and kernel index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Interface name.
    pub name: String,
    /// Kernel interface index.
    pub index: u32,
}

/// Failures reported by a [`LinkHandle`].
#[derive(Error, Debug)]
pub enum HostError {
    /// No interface with this name is visible.
    #[error("no link named {name}")]
    NotFound {
        /// The interface name.
        name: String,
    },

    /// The kernel refused the request.
    #[error(transparent)]
    Os(#[from] io::Error),

    /// The netlink exchange itself failed.
    #[error("netlink: {0}")]
    Netlink(#[from] rtnetlink::Error),
}

/// Operations on host network links.
#[async_trait]
pub trait LinkHandle: Send + Sync {
    /// Look up an interface by name.
    async fn link_by_name(&self, name: &str) -> Result<Link, HostError>;

    /// IPv4 addresses of an interface, in kernel order.
    async fn ipv4_addresses(&self, link: &Link) -> Result<Vec<Ipv4Net>, HostError>;

    /// Add an address to an interface.
    async fn add_address(&self, link: &Link, address: IpNet) -> Result<(), HostError>;

    /// Bring an interface up.
    async fn set_up(&self, link: &Link) -> Result<(), HostError>;

    /// Create a bridge.
    async fn add_bridge(&self, name: &str, mtu: u32) -> Result<(), HostError>;

    /// Create a veth pair from its descriptor.
    async fn add_veth(&self, pair: &VethPair) -> Result<(), HostError>;

    /// Delete an interface.
    async fn delete(&self, link: &Link) -> Result<(), HostError>;
}
