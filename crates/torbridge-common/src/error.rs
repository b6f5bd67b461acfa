//! Error types for torbridge network provisioning.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`TorbridgeError`].
pub type TorbridgeResult<T> = Result<T, TorbridgeError>;

/// Boxed underlying cause carried by host and runtime failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while resolving or provisioning a network.
#[derive(Error, Diagnostic, Debug)]
pub enum TorbridgeError {
    /// A required option is absent.
    #[error("Missing configuration: {option}")]
    #[diagnostic(code(torbridge::config::missing))]
    MissingConfiguration {
        /// The option key that was looked up.
        option: String,
        /// How to supply the option.
        #[help]
        hint: String,
    },

    /// An option is present but has the wrong shape.
    #[error("Option {option} has the wrong type: expected {expected}, found {found}")]
    #[diagnostic(code(torbridge::config::type_mismatch))]
    TypeMismatch {
        /// The option key.
        option: String,
        /// The expected JSON type.
        expected: &'static str,
        /// The value that was found.
        found: String,
    },

    /// An option value could not be parsed.
    #[error("Cannot parse option {option} value {value:?}: {reason}")]
    #[diagnostic(code(torbridge::config::parse))]
    ParseError {
        /// The option key.
        option: String,
        /// The raw value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// One or more options failed validation.
    #[error("Invalid network options ({} errors)", errors.len())]
    #[diagnostic(code(torbridge::config::invalid))]
    InvalidOptions {
        /// Every individual failure.
        #[related]
        errors: Vec<TorbridgeError>,
    },

    /// Neither address family carries a gateway.
    #[error("No gateway IP found")]
    #[diagnostic(
        code(torbridge::gateway::not_found),
        help("The IPAM driver must provide a gateway for the network's pool")
    )]
    NoGatewayFound,

    /// The gateway is not of the form `ip/prefix`.
    #[error("Cannot split gateway IP address {gateway:?}")]
    #[diagnostic(code(torbridge::gateway::malformed))]
    MalformedGateway {
        /// The raw gateway string.
        gateway: String,
    },

    /// A host interface lookup failed.
    #[error("Interface not found: {name}")]
    #[diagnostic(code(torbridge::link::not_found))]
    InterfaceNotFound {
        /// The interface name.
        name: String,
        /// The lookup failure.
        #[source]
        source: BoxError,
    },

    /// The interface exists but has no IPv4 address.
    #[error("Interface {name} has no IP addresses")]
    #[diagnostic(code(torbridge::link::no_address))]
    NoAddressAssigned {
        /// The interface name.
        name: String,
    },

    /// The bridge a veth pair should attach to does not exist.
    #[error("Bridge not found: {name}")]
    #[diagnostic(code(torbridge::link::bridge_not_found))]
    BridgeNotFound {
        /// The bridge name.
        name: String,
        /// The lookup failure.
        #[source]
        source: BoxError,
    },

    /// The interface never became visible.
    #[error("Abandoning retrieving link {name} after {attempts} attempts")]
    #[diagnostic(
        code(torbridge::link::unavailable),
        help("Run `ip link` to troubleshoot the error")
    )]
    LinkUnavailable {
        /// The interface name.
        name: String,
        /// Lookups performed.
        attempts: u32,
        /// The last lookup failure.
        #[source]
        source: BoxError,
    },

    /// An address string is not valid CIDR.
    #[error("Invalid address {value:?}: {reason}")]
    #[diagnostic(code(torbridge::address::parse))]
    AddressParseError {
        /// The raw address.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Adding an address to an interface failed.
    #[error("Failed to add address {address} to {name}")]
    #[diagnostic(code(torbridge::address::assign))]
    AddressAssignFailed {
        /// The interface name.
        name: String,
        /// The address being added.
        address: String,
        /// The host failure.
        #[source]
        source: BoxError,
    },

    /// Bringing a link up failed.
    #[error("Failed to bring up link {name}")]
    #[diagnostic(code(torbridge::link::activation))]
    LinkActivationFailed {
        /// The interface name.
        name: String,
        /// The host failure.
        #[source]
        source: BoxError,
    },

    /// Creating a link failed.
    #[error("Failed to create {kind} link {name}")]
    #[diagnostic(
        code(torbridge::link::create),
        help("Try running with elevated privileges (CAP_NET_ADMIN)")
    )]
    LinkCreateFailed {
        /// The link name.
        name: String,
        /// The link kind (bridge, veth).
        kind: &'static str,
        /// The host failure.
        #[source]
        source: BoxError,
    },

    /// Deleting a link failed.
    #[error("Failed to delete link {name}")]
    #[diagnostic(code(torbridge::link::delete))]
    LinkDeleteFailed {
        /// The link name.
        name: String,
        /// The host failure.
        #[source]
        source: BoxError,
    },

    /// Inspecting a container failed.
    #[error("Getting container {container} failed")]
    #[diagnostic(code(torbridge::container::inspect))]
    ContainerInspectFailed {
        /// The container name.
        container: String,
        /// The runtime failure.
        #[source]
        source: BoxError,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(torbridge::io))]
    Io(#[from] std::io::Error),
}
