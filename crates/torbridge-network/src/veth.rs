//! Virtual ethernet pair descriptors.

/// A veth pair to be created, with its bridge-side end enslaved to a bridge.
///
/// Building one does not touch the host; see
/// [`LinkManager::create_veth`](crate::link::LinkManager::create_veth).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VethPair {
    /// Bridge-side interface name.
    pub name: String,
    /// Container-side interface name. Renamed to `eth0` once moved into the
    /// container's namespace.
    pub peer_name: String,
    /// Index of the bridge the bridge side is attached to.
    pub master_index: u32,
}

impl VethPair {
    /// Create a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, peer_name: impl Into<String>, master_index: u32) -> Self {
        Self {
            name: name.into(),
            peer_name: peer_name.into(),
            master_index,
        }
    }
}
