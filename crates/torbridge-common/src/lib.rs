//! # torbridge-common
//!
//! Shared types for the torbridge network driver.
//!
//! This crate provides:
//! - The error taxonomy used by every provisioning operation
//! - The network creation request handed over by the driver protocol layer

#![warn(missing_docs)]

pub mod error;
pub mod request;

pub use error::{BoxError, TorbridgeError, TorbridgeResult};
pub use request::{IpamData, NetworkRequest};
