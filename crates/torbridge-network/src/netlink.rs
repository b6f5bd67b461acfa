//! rtnetlink-backed [`LinkHandle`].

use std::io;
use std::net::IpAddr;

use async_trait::async_trait;
use futures::TryStreamExt;
use ipnet::{IpNet, Ipv4Net};
use rtnetlink::packet_route::AddressFamily;
use rtnetlink::packet_route::address::AddressAttribute;
use rtnetlink::{Handle, LinkBridge, LinkUnspec, LinkVeth};
use torbridge_common::TorbridgeResult;

use crate::handle::{HostError, Link, LinkHandle};
use crate::veth::VethPair;

/// Link handle talking to the kernel over a route netlink socket.
#[derive(Clone)]
pub struct NetlinkHandle {
    handle: Handle,
}

impl NetlinkHandle {
    /// Open a netlink connection. Must be called from within a tokio runtime.
    pub fn connect() -> TorbridgeResult<Self> {
        let (connection, handle, _) = rtnetlink::new_connection()?;
        tokio::spawn(connection);
        Ok(Self { handle })
    }
}

/// Turn kernel error codes into OS errors so callers can inspect the errno.
fn host_error(err: rtnetlink::Error) -> HostError {
    match err {
        rtnetlink::Error::NetlinkError(ref msg) if msg.raw_code() != 0 => {
            HostError::Os(io::Error::from_raw_os_error(msg.raw_code().abs()))
        }
        other => HostError::Netlink(other),
    }
}

#[async_trait]
impl LinkHandle for NetlinkHandle {
    async fn link_by_name(&self, name: &str) -> Result<Link, HostError> {
        let not_found = || HostError::NotFound {
            name: name.to_string(),
        };

        let mut links = self.handle.link().get().match_name(name.to_string()).execute();
        match links.try_next().await.map_err(host_error) {
            Ok(Some(link)) => Ok(Link {
                name: name.to_string(),
                index: link.header.index,
            }),
            Ok(None) => Err(not_found()),
            Err(HostError::Os(e)) if e.raw_os_error() == Some(libc::ENODEV) => Err(not_found()),
            Err(e) => Err(e),
        }
    }

    async fn ipv4_addresses(&self, link: &Link) -> Result<Vec<Ipv4Net>, HostError> {
        let mut messages = self
            .handle
            .address()
            .get()
            .set_link_index_filter(link.index)
            .execute();

        let mut addresses = Vec::new();
        while let Some(msg) = messages.try_next().await.map_err(host_error)? {
            if msg.header.family != AddressFamily::Inet {
                continue;
            }
            let local = msg.attributes.iter().find_map(|attr| match attr {
                AddressAttribute::Local(IpAddr::V4(ip)) | AddressAttribute::Address(IpAddr::V4(ip)) => {
                    Some(*ip)
                }
                _ => None,
            });
            if let Some(ip) = local {
                if let Ok(net) = Ipv4Net::new(ip, msg.header.prefix_len) {
                    addresses.push(net);
                }
            }
        }
        Ok(addresses)
    }

    async fn add_address(&self, link: &Link, address: IpNet) -> Result<(), HostError> {
        self.handle
            .address()
            .add(link.index, address.addr(), address.prefix_len())
            .execute()
            .await
            .map_err(host_error)
    }

    async fn set_up(&self, link: &Link) -> Result<(), HostError> {
        self.handle
            .link()
            .set(LinkUnspec::new_with_index(link.index).up().build())
            .execute()
            .await
            .map_err(host_error)
    }

    async fn add_bridge(&self, name: &str, mtu: u32) -> Result<(), HostError> {
        self.handle
            .link()
            .add(LinkBridge::new(name).mtu(mtu).build())
            .execute()
            .await
            .map_err(host_error)
    }

    async fn add_veth(&self, pair: &VethPair) -> Result<(), HostError> {
        self.handle
            .link()
            .add(
                LinkVeth::new(&pair.name, &pair.peer_name)
                    .controller(pair.master_index)
                    .build(),
            )
            .execute()
            .await
            .map_err(host_error)
    }

    async fn delete(&self, link: &Link) -> Result<(), HostError> {
        self.handle
            .link()
            .del(link.index)
            .execute()
            .await
            .map_err(host_error)
    }
}
