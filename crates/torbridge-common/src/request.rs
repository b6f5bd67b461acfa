//! Network creation request as handed over by the driver protocol layer.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The protocol layer encodes empty slices and maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Address pool data supplied by the IPAM driver for one subnet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpamData {
    /// Address space the pool was allocated from.
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_space: String,
    /// Pool in CIDR form.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool: String,
    /// Gateway in CIDR form (`ip/prefix`). Empty when IPAM set none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub gateway: String,
    /// Auxiliary addresses reserved in the pool.
    #[serde(default, deserialize_with = "null_as_default")]
    pub aux_addresses: HashMap<String, String>,
}

impl IpamData {
    /// Pool data carrying only a gateway.
    #[must_use]
    pub fn with_gateway(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            ..Self::default()
        }
    }
}

/// A request to create a network.
///
/// `options` is kept untyped here; it is validated into typed options before
/// any provisioning logic reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequest {
    /// Opaque network identifier.
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    /// Driver options, including the nested generic options mapping.
    #[serde(rename = "Options", default, deserialize_with = "null_as_default")]
    pub options: Map<String, Value>,
    /// IPv4 pool data, in IPAM order. Entries may be null.
    #[serde(rename = "IPv4Data", default, deserialize_with = "null_as_default")]
    pub ipv4_data: Vec<Option<IpamData>>,
    /// IPv6 pool data, in IPAM order. Entries may be null.
    #[serde(rename = "IPv6Data", default, deserialize_with = "null_as_default")]
    pub ipv6_data: Vec<Option<IpamData>>,
}

impl NetworkRequest {
    /// Create a request with no options and no pool data.
    #[must_use]
    pub fn new(network_id: impl Into<String>) -> Self {
        Self {
            network_id: network_id.into(),
            ..Self::default()
        }
    }

    /// Set the nested generic options mapping under `key`.
    #[must_use]
    pub fn with_generic_options(mut self, key: &str, generic: Map<String, Value>) -> Self {
        self.options.insert(key.to_string(), Value::Object(generic));
        self
    }

    /// Append IPv4 pool data.
    #[must_use]
    pub fn with_ipv4(mut self, data: IpamData) -> Self {
        self.ipv4_data.push(Some(data));
        self
    }

    /// Append IPv6 pool data.
    #[must_use]
    pub fn with_ipv6(mut self, data: IpamData) -> Self {
        self.ipv6_data.push(Some(data));
        self
    }
}
