//! Network topology planning.
//!
//! Derives the bridge, MTU, gateway and router of a network from its creation
//! request. The planner assumes one subnet of one address family; pool
//! allocation is left to the IPAM driver.

use torbridge_common::{IpamData, NetworkRequest, TorbridgeError, TorbridgeResult};

use crate::naming::DriverNaming;
use crate::options::{NetworkOptions, OptionResolver, collect_errors};

/// Which address family's gateway wins when IPAM supplies both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatewayPreference {
    /// IPv4 gateway wins over IPv6.
    #[default]
    Ipv4First,
    /// IPv6 gateway wins over IPv4.
    Ipv6First,
}

/// Bridge-side topology of a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTopology {
    /// Bridge interface name.
    pub bridge_name: String,
    /// Bridge MTU.
    pub mtu: u32,
    /// Gateway address, without prefix.
    pub gateway_ip: String,
    /// Gateway prefix length, unparsed.
    pub gateway_prefix_len: String,
}

impl BridgeTopology {
    /// Gateway in `ip/prefix` form, as assigned to the bridge.
    #[must_use]
    pub fn gateway_cidr(&self) -> String {
        format!("{}/{}", self.gateway_ip, self.gateway_prefix_len)
    }
}

/// Full topology of a network, including its router container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopology {
    /// Bridge, MTU and gateway.
    pub bridge: BridgeTopology,
    /// Container routing the network's traffic.
    pub router_name: String,
}

/// First pool entry's gateway, if IPAM set one.
fn first_gateway(data: &[Option<IpamData>]) -> Option<&str> {
    data.first()?
        .as_ref()
        .map(|pool| pool.gateway.as_str())
        .filter(|gateway| !gateway.is_empty())
}

/// Select the gateway of `request` and split it into address and prefix.
///
/// Only the first pool entry of each family is considered.
///
/// # Errors
///
/// `NoGatewayFound` if neither family has a gateway, `MalformedGateway` if
/// the selected gateway is not `ip/prefix`.
pub fn resolve_gateway(
    request: &NetworkRequest,
    preference: GatewayPreference,
) -> TorbridgeResult<(String, String)> {
    let v4 = first_gateway(&request.ipv4_data);
    let v6 = first_gateway(&request.ipv6_data);

    let gateway = match preference {
        GatewayPreference::Ipv4First => v4.or(v6),
        GatewayPreference::Ipv6First => v6.or(v4),
    }
    .ok_or(TorbridgeError::NoGatewayFound)?;

    if v4.is_some() && v6.is_some() {
        tracing::debug!(gateway, ?preference, "Both address families carry a gateway");
    }

    let mut parts = gateway.split('/');
    match (parts.next(), parts.next()) {
        (Some(ip), Some(prefix)) if !ip.is_empty() && !prefix.is_empty() => {
            Ok((ip.to_string(), prefix.to_string()))
        }
        _ => Err(TorbridgeError::MalformedGateway {
            gateway: gateway.to_string(),
        }),
    }
}

/// Plans network topologies from creation requests.
#[derive(Debug, Clone, Default)]
pub struct AddressPlanner {
    naming: DriverNaming,
    preference: GatewayPreference,
}

impl AddressPlanner {
    /// Create a planner with default naming and IPv4 precedence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different naming conventions.
    #[must_use]
    pub fn with_naming(mut self, naming: DriverNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Use a different gateway precedence.
    #[must_use]
    pub const fn with_gateway_preference(mut self, preference: GatewayPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Naming conventions in use.
    #[must_use]
    pub const fn naming(&self) -> &DriverNaming {
        &self.naming
    }

    /// Option resolver for `request` under this planner's naming.
    #[must_use]
    pub fn options<'a>(&'a self, request: &'a NetworkRequest) -> OptionResolver<'a> {
        OptionResolver::new(request, &self.naming)
    }

    /// Gateway address and prefix under this planner's precedence.
    ///
    /// # Errors
    ///
    /// See [`resolve_gateway`].
    pub fn resolve_gateway(&self, request: &NetworkRequest) -> TorbridgeResult<(String, String)> {
        resolve_gateway(request, self.preference)
    }

    /// Bridge, MTU and gateway of the network.
    ///
    /// # Errors
    ///
    /// Option and gateway failures, aggregated when there are several.
    pub fn plan_bridge(&self, request: &NetworkRequest) -> TorbridgeResult<BridgeTopology> {
        self.plan_parts(request, false).map(|(bridge, _)| bridge)
    }

    /// Full topology of the network. The router option is required.
    ///
    /// # Errors
    ///
    /// Option, router and gateway failures, aggregated when there are several.
    pub fn plan(&self, request: &NetworkRequest) -> TorbridgeResult<ResolvedTopology> {
        let (bridge, router_name) = self.plan_parts(request, true)?;
        let router_name = match router_name {
            Some(name) => name,
            None => self.options(request).router_name()?,
        };

        let topology = ResolvedTopology {
            bridge,
            router_name,
        };
        tracing::debug!(
            network_id = %request.network_id,
            bridge = %topology.bridge.bridge_name,
            mtu = topology.bridge.mtu,
            gateway = %topology.bridge.gateway_cidr(),
            router = %topology.router_name,
            "Planned network topology"
        );
        Ok(topology)
    }

    fn plan_parts(
        &self,
        request: &NetworkRequest,
        require_router: bool,
    ) -> TorbridgeResult<(BridgeTopology, Option<String>)> {
        let resolver = self.options(request);
        resolver.generic_options()?;

        let mut errors = Vec::new();
        let options = NetworkOptions::parse(request, &self.naming)
            .map_err(|e| match e {
                TorbridgeError::InvalidOptions { errors: all } => errors.extend(all),
                other => errors.push(other),
            })
            .ok();
        let gateway = self
            .resolve_gateway(request)
            .map_err(|e| errors.push(e))
            .ok();
        if require_router {
            // A router of the wrong type is already reported by the option parse.
            if let Err(e @ TorbridgeError::MissingConfiguration { .. }) = resolver.router_name() {
                errors.push(e);
            }
        }

        match (options, gateway) {
            (Some(options), Some((gateway_ip, gateway_prefix_len))) if errors.is_empty() => Ok((
                BridgeTopology {
                    bridge_name: options.bridge_name,
                    mtu: options.mtu,
                    gateway_ip,
                    gateway_prefix_len,
                },
                options.router_name,
            )),
            _ => Err(collect_errors(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::GENERIC_OPTIONS_KEY;
    use serde_json::{Map, Value, json};

    fn request() -> NetworkRequest {
        NetworkRequest::new("abcde12345").with_generic_options(GENERIC_OPTIONS_KEY, Map::new())
    }

    #[test]
    fn no_gateway_data() {
        let err = resolve_gateway(&request(), GatewayPreference::default()).unwrap_err();
        assert!(matches!(err, TorbridgeError::NoGatewayFound));
    }

    #[test]
    fn empty_or_null_first_entry_has_no_gateway() {
        let mut req = request().with_ipv4(IpamData::default());
        req.ipv6_data.push(None);
        let err = resolve_gateway(&req, GatewayPreference::default()).unwrap_err();
        assert!(matches!(err, TorbridgeError::NoGatewayFound));
    }

    #[test]
    fn only_first_entry_is_considered() {
        let req = request()
            .with_ipv4(IpamData::default())
            .with_ipv4(IpamData::with_gateway("10.0.1.1/24"));
        let err = resolve_gateway(&req, GatewayPreference::default()).unwrap_err();
        assert!(matches!(err, TorbridgeError::NoGatewayFound));
    }

    #[test]
    fn ipv4_wins_over_ipv6_by_default() {
        let req = request()
            .with_ipv6(IpamData::with_gateway("fd00::1/64"))
            .with_ipv4(IpamData::with_gateway("10.0.0.1/24"));
        let gateway = resolve_gateway(&req, GatewayPreference::Ipv4First).unwrap();
        assert_eq!(gateway, ("10.0.0.1".to_string(), "24".to_string()));
    }

    #[test]
    fn ipv6_first_preference() {
        let req = request()
            .with_ipv6(IpamData::with_gateway("fd00::1/64"))
            .with_ipv4(IpamData::with_gateway("10.0.0.1/24"));
        let gateway = resolve_gateway(&req, GatewayPreference::Ipv6First).unwrap();
        assert_eq!(gateway, ("fd00::1".to_string(), "64".to_string()));
    }

    #[test]
    fn ipv6_only() {
        let req = request().with_ipv6(IpamData::with_gateway("fd00::1/64"));
        let gateway = resolve_gateway(&req, GatewayPreference::Ipv4First).unwrap();
        assert_eq!(gateway, ("fd00::1".to_string(), "64".to_string()));
    }

    #[test]
    fn malformed_gateways() {
        for gateway in ["10.0.0.1", "/24", "10.0.0.1/"] {
            let req = request().with_ipv4(IpamData::with_gateway(gateway));
            let err = resolve_gateway(&req, GatewayPreference::default()).unwrap_err();
            assert!(
                matches!(err, TorbridgeError::MalformedGateway { .. }),
                "{gateway} should be malformed"
            );
        }
    }

    #[test]
    fn plan_bridge_defaults() {
        let req = request().with_ipv4(IpamData::with_gateway("172.18.0.1/16"));
        let topology = AddressPlanner::new().plan_bridge(&req).unwrap();

        assert_eq!(
            topology,
            BridgeTopology {
                bridge_name: "torabcde".to_string(),
                mtu: 1500,
                gateway_ip: "172.18.0.1".to_string(),
                gateway_prefix_len: "16".to_string(),
            }
        );
        assert_eq!(topology.gateway_cidr(), "172.18.0.1/16");
    }

    #[test]
    fn plan_requires_router() {
        let req = request().with_ipv4(IpamData::with_gateway("172.18.0.1/16"));
        let err = AddressPlanner::new().plan(&req).unwrap_err();
        assert!(matches!(err, TorbridgeError::MissingConfiguration { .. }));
    }

    #[test]
    fn plan_with_router() {
        let Value::Object(generic) = json!({"router-name": "gw1", "mtu": "1400"}) else {
            unreachable!();
        };
        let req = NetworkRequest::new("abcde12345")
            .with_generic_options(GENERIC_OPTIONS_KEY, generic)
            .with_ipv4(IpamData::with_gateway("172.18.0.1/16"));

        let topology = AddressPlanner::new().plan(&req).unwrap();
        assert_eq!(topology.router_name, "gw1");
        assert_eq!(topology.bridge.mtu, 1400);
    }

    #[test]
    fn plan_aggregates_option_and_gateway_errors() {
        let Value::Object(generic) = json!({"mtu": "abc"}) else {
            unreachable!();
        };
        let req = NetworkRequest::new("abcde12345").with_generic_options(GENERIC_OPTIONS_KEY, generic);

        let err = AddressPlanner::new().plan(&req).unwrap_err();
        let TorbridgeError::InvalidOptions { errors } = err else {
            panic!("expected aggregated errors, got {err:?}");
        };
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], TorbridgeError::ParseError { .. }));
        assert!(matches!(errors[1], TorbridgeError::NoGatewayFound));
        assert!(matches!(errors[2], TorbridgeError::MissingConfiguration { .. }));
    }

    #[test]
    fn custom_naming_flows_into_bridge_name() {
        let naming = DriverNaming::default()
            .with_bridge_prefix("onion")
            .with_generic_options_key("generic");
        let req = NetworkRequest::new("0123456789")
            .with_generic_options("generic", Map::new())
            .with_ipv4(IpamData::with_gateway("10.9.0.1/24"));

        let topology = AddressPlanner::new()
            .with_naming(naming)
            .plan_bridge(&req)
            .unwrap();
        assert_eq!(topology.bridge_name, "onion01234");
    }
}
