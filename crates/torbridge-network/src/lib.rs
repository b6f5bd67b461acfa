//! # torbridge-network
//!
//! Provisioning core of the torbridge network driver.
//!
//! This crate derives a network's topology from its creation request and
//! realizes it on the host:
//! - [`options`] and [`planner`] turn a request into a [`ResolvedTopology`]
//! - [`link`] creates, addresses and brings up bridges and veth pairs
//! - [`container`] finds the router container's address

#![warn(missing_docs)]

pub mod container;
pub mod handle;
pub mod link;
pub mod naming;
pub mod netlink;
pub mod options;
pub mod planner;
pub mod retry;
pub mod veth;

pub use container::{ContainerRuntime, DockerRuntime, container_ip};
pub use handle::{HostError, Link, LinkHandle};
pub use link::LinkManager;
pub use naming::DriverNaming;
pub use netlink::NetlinkHandle;
pub use options::{NetworkOptions, OptionResolver};
pub use planner::{AddressPlanner, BridgeTopology, GatewayPreference, ResolvedTopology, resolve_gateway};
pub use retry::RetryPolicy;
pub use veth::VethPair;
