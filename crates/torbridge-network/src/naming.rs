//! Interface name prefixes and option keys.

/// Key of the nested generic options mapping in a request's options.
pub const GENERIC_OPTIONS_KEY: &str = "com.docker.network.generic";

/// Prefix of derived bridge names.
pub const BRIDGE_PREFIX: &str = "tor";

/// Prefix of the bridge-side veth interface.
pub const VETH_PREFIX: &str = "torveth";

/// Prefix of the container-side veth interface before it is moved and renamed.
pub const PEER_PREFIX: &str = "ethc";

/// Option selecting the bridge MTU.
pub const MTU_OPTION: &str = "mtu";

/// Option overriding the derived bridge name.
pub const BRIDGE_NAME_OPTION: &str = "bridge-name";

/// Option naming the router (gateway) container.
pub const ROUTER_NAME_OPTION: &str = "router-name";

/// MTU used when the request does not set one.
pub const DEFAULT_MTU: u32 = 1500;

/// Number of network ID characters kept in derived bridge names.
pub const NETWORK_ID_PREFIX_LEN: usize = 5;

/// Naming conventions shared by the option resolver and the link manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverNaming {
    /// Key of the nested generic options mapping.
    pub generic_options_key: String,
    /// Prefix of derived bridge names.
    pub bridge_prefix: String,
    /// Prefix of bridge-side veth names.
    pub veth_prefix: String,
    /// Prefix of container-side veth names.
    pub peer_prefix: String,
    /// MTU option key.
    pub mtu_option: String,
    /// Bridge name option key.
    pub bridge_name_option: String,
    /// Router container option key.
    pub router_name_option: String,
    /// MTU used when the option is absent.
    pub default_mtu: u32,
}

impl Default for DriverNaming {
    fn default() -> Self {
        Self {
            generic_options_key: GENERIC_OPTIONS_KEY.to_string(),
            bridge_prefix: BRIDGE_PREFIX.to_string(),
            veth_prefix: VETH_PREFIX.to_string(),
            peer_prefix: PEER_PREFIX.to_string(),
            mtu_option: MTU_OPTION.to_string(),
            bridge_name_option: BRIDGE_NAME_OPTION.to_string(),
            router_name_option: ROUTER_NAME_OPTION.to_string(),
            default_mtu: DEFAULT_MTU,
        }
    }
}

impl DriverNaming {
    /// Use a different bridge prefix.
    #[must_use]
    pub fn with_bridge_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bridge_prefix = prefix.into();
        self
    }

    /// Use a different bridge-side veth prefix.
    #[must_use]
    pub fn with_veth_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.veth_prefix = prefix.into();
        self
    }

    /// Use a different generic options key.
    #[must_use]
    pub fn with_generic_options_key(mut self, key: impl Into<String>) -> Self {
        self.generic_options_key = key.into();
        self
    }

    /// Bridge name derived from a network ID.
    ///
    /// IDs shorter than [`NETWORK_ID_PREFIX_LEN`] are used whole.
    #[must_use]
    pub fn bridge_name_for(&self, network_id: &str) -> String {
        let short: String = network_id.chars().take(NETWORK_ID_PREFIX_LEN).collect();
        format!("{}{short}", self.bridge_prefix)
    }

    /// Bridge-side veth name for an endpoint suffix.
    #[must_use]
    pub fn veth_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.veth_prefix)
    }

    /// Container-side veth name for an endpoint suffix.
    #[must_use]
    pub fn peer_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.peer_prefix)
    }
}
