//! End-to-end provisioning of a bridge network against an in-memory host.
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::{IpNet, Ipv4Net};
use parking_lot::Mutex;
use torbridge_common::{BoxError, NetworkRequest, TorbridgeError};
use torbridge_network::{
    AddressPlanner, ContainerRuntime, HostError, Link, LinkHandle, LinkManager, RetryPolicy,
    VethPair, container_ip,
};

/// Host that records every mutation and only publishes new links after a
/// number of lookups, like a kernel that is slow to announce them.
#[derive(Default)]
struct RecordingHost {
    links: Mutex<HashMap<String, (u32, Vec<IpNet>)>>,
    pending: Mutex<HashMap<String, u32>>,
    journal: Mutex<Vec<String>>,
    visible_after: u32,
}

impl RecordingHost {
    fn slow(visible_after: u32) -> Self {
        Self {
            visible_after,
            ..Self::default()
        }
    }

    fn record(&self, entry: String) {
        self.journal.lock().push(entry);
    }

    fn insert(&self, name: &str) {
        let mut links = self.links.lock();
        let index = u32::try_from(links.len()).unwrap_or(u32::MAX) + 1;
        links.insert(name.to_string(), (index, Vec::new()));
        self.pending.lock().insert(name.to_string(), self.visible_after);
    }
}

#[async_trait]
impl LinkHandle for RecordingHost {
    async fn link_by_name(&self, name: &str) -> Result<Link, HostError> {
        let not_found = || HostError::NotFound {
            name: name.to_string(),
        };
        if let Some(remaining) = self.pending.lock().get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(not_found());
            }
        }
        self.links
            .lock()
            .get(name)
            .map(|(index, _)| Link {
                name: name.to_string(),
                index: *index,
            })
            .ok_or_else(not_found)
    }

    async fn ipv4_addresses(&self, link: &Link) -> Result<Vec<Ipv4Net>, HostError> {
        Ok(self
            .links
            .lock()
            .get(&link.name)
            .map(|(_, addresses)| {
                addresses
                    .iter()
                    .filter_map(|a| match a {
                        IpNet::V4(v4) => Some(*v4),
                        IpNet::V6(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_address(&self, link: &Link, address: IpNet) -> Result<(), HostError> {
        self.record(format!("addr {} {address}", link.name));
        if let Some((_, addresses)) = self.links.lock().get_mut(&link.name) {
            addresses.push(address);
        }
        Ok(())
    }

    async fn set_up(&self, link: &Link) -> Result<(), HostError> {
        self.record(format!("up {}", link.name));
        Ok(())
    }

    async fn add_bridge(&self, name: &str, mtu: u32) -> Result<(), HostError> {
        self.record(format!("bridge {name} mtu {mtu}"));
        self.insert(name);
        Ok(())
    }

    async fn add_veth(&self, pair: &VethPair) -> Result<(), HostError> {
        self.record(format!(
            "veth {} peer {} master {}",
            pair.name, pair.peer_name, pair.master_index
        ));
        self.insert(&pair.name);
        self.insert(&pair.peer_name);
        Ok(())
    }

    async fn delete(&self, link: &Link) -> Result<(), HostError> {
        self.record(format!("delete {}", link.name));
        self.links.lock().remove(&link.name);
        Ok(())
    }
}

struct Routers;

#[async_trait]
impl ContainerRuntime for Routers {
    async fn container_ipv4(&self, name: &str) -> Result<Option<String>, BoxError> {
        match name {
            "gw1" => Ok(Some("172.17.0.5".to_string())),
            other => Err(format!("No such container: {other}").into()),
        }
    }
}

fn create_request(generic: &str) -> NetworkRequest {
    let json = format!(
        r#"{{
            "NetworkID": "abcde12345",
            "Options": {{"com.docker.network.generic": {generic}}},
            "IPv4Data": [{{"AddressSpace": "LocalDefault", "Pool": "172.18.0.0/16", "Gateway": "172.18.0.1/16", "AuxAddresses": null}}],
            "IPv6Data": []
        }}"#
    );
    serde_json::from_str(&json).unwrap()
}

#[test_log::test]
fn bridge_plan_from_driver_payload() {
    let topology = AddressPlanner::new()
        .plan_bridge(&create_request("{}"))
        .unwrap();

    assert_eq!(topology.bridge_name, "torabcde");
    assert_eq!(topology.mtu, 1500);
    assert_eq!(topology.gateway_ip, "172.18.0.1");
    assert_eq!(topology.gateway_prefix_len, "16");
}

#[test_log::test(tokio::test(start_paused = true))]
async fn provision_network_and_endpoint() {
    let request = create_request(r#"{"router-name": "gw1", "mtu": "1400"}"#);
    let topology = AddressPlanner::new().plan(&request).unwrap();
    let bridge = &topology.bridge;

    // The bridge shows up on the second lookup.
    let links = LinkManager::new(RecordingHost::slow(1));
    links.create_bridge(&bridge.bridge_name, bridge.mtu).await.unwrap();
    links
        .assign_address(&bridge.bridge_name, &bridge.gateway_cidr())
        .await
        .unwrap();
    links.activate_link(&bridge.bridge_name).await.unwrap();

    let address = links.interface_address(&bridge.bridge_name).await.unwrap();
    assert_eq!(address.to_string(), "172.18.0.1/16");

    let pair = links
        .build_veth_pair("ep123", &bridge.bridge_name)
        .await
        .unwrap();
    links.create_veth(&pair).await.unwrap();

    let router_ip = container_ip(&Routers, &topology.router_name).await.unwrap();
    assert_eq!(router_ip, "172.17.0.5");

    assert_eq!(
        *links.handle().journal.lock(),
        vec![
            "bridge torabcde mtu 1400".to_string(),
            "addr torabcde 172.18.0.1/16".to_string(),
            "up torabcde".to_string(),
            "veth torvethep123 peer ethcep123 master 1".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn slow_link_exhausts_retry_policy() {
    let links = LinkManager::new(RecordingHost::slow(5))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(250)));
    links.create_bridge("torabcde", 1500).await.unwrap();

    let start = tokio::time::Instant::now();
    let err = links
        .assign_address("torabcde", "172.18.0.1/16")
        .await
        .unwrap_err();

    assert!(matches!(err, TorbridgeError::LinkUnavailable { attempts: 3, .. }));
    assert!(start.elapsed() >= Duration::from_millis(500));
    // Nothing is rolled back: the bridge stays behind.
    assert_eq!(links.handle().journal.lock().len(), 1);
}

#[tokio::test]
async fn router_lookup_failure_is_terminal() {
    let err = container_ip(&Routers, "gw2").await.unwrap_err();
    assert!(matches!(err, TorbridgeError::ContainerInspectFailed { ref container, .. } if container == "gw2"));
}
