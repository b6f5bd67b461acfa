//! Driver options carried by a network creation request.
//!
//! The request keeps its options as an untyped JSON mapping. [`OptionResolver`]
//! reads single values out of it and [`NetworkOptions::parse`] turns the whole
//! mapping into typed options, reporting every invalid option at once.

use serde_json::{Map, Value};
use torbridge_common::{NetworkRequest, TorbridgeError, TorbridgeResult};

use crate::naming::DriverNaming;

/// Reads typed values out of a request's generic options.
#[derive(Debug, Clone, Copy)]
pub struct OptionResolver<'a> {
    request: &'a NetworkRequest,
    naming: &'a DriverNaming,
}

impl<'a> OptionResolver<'a> {
    /// Create a resolver over `request`.
    #[must_use]
    pub const fn new(request: &'a NetworkRequest, naming: &'a DriverNaming) -> Self {
        Self { request, naming }
    }

    /// The nested generic options mapping.
    ///
    /// # Errors
    ///
    /// `MissingConfiguration` if the generic key is absent, `TypeMismatch` if
    /// its value is not a mapping.
    pub fn generic_options(&self) -> TorbridgeResult<&'a Map<String, Value>> {
        let key = &self.naming.generic_options_key;
        match self.request.options.get(key) {
            Some(Value::Object(generic)) => Ok(generic),
            Some(other) => Err(TorbridgeError::TypeMismatch {
                option: key.clone(),
                expected: "object",
                found: other.to_string(),
            }),
            None => Err(TorbridgeError::MissingConfiguration {
                option: key.clone(),
                hint: "The network request carries no generic options".to_string(),
            }),
        }
    }

    /// A string option, or `default` when it is absent or null.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the option is present but not a string.
    pub fn string_option(&self, key: &str, default: &str) -> TorbridgeResult<String> {
        match self.generic_options()?.get(key) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(value)) => Ok(value.clone()),
            Some(other) => Err(TorbridgeError::TypeMismatch {
                option: key.to_string(),
                expected: "string",
                found: other.to_string(),
            }),
        }
    }

    /// Bridge MTU. Falls back to the default MTU when unset or empty.
    ///
    /// # Errors
    ///
    /// `ParseError` if the value is not a positive decimal integer.
    pub fn mtu(&self) -> TorbridgeResult<u32> {
        let option = &self.naming.mtu_option;
        let raw = self.string_option(option, "")?;
        if raw.is_empty() {
            return Ok(self.naming.default_mtu);
        }

        let parse_error = |reason: String| TorbridgeError::ParseError {
            option: option.clone(),
            value: raw.clone(),
            reason,
        };
        match raw.parse::<u32>() {
            Ok(0) => Err(parse_error("MTU must be positive".to_string())),
            Ok(mtu) => Ok(mtu),
            Err(e) => Err(parse_error(e.to_string())),
        }
    }

    /// Bridge name: the explicit option, else derived from the network ID.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the option is not a string.
    pub fn bridge_name(&self) -> TorbridgeResult<String> {
        let name = self.string_option(&self.naming.bridge_name_option, "")?;
        if name.is_empty() {
            return Ok(self.naming.bridge_name_for(&self.request.network_id));
        }
        Ok(name)
    }

    /// Name of the router container. There is no default.
    ///
    /// # Errors
    ///
    /// `MissingConfiguration` if the option is absent or empty.
    pub fn router_name(&self) -> TorbridgeResult<String> {
        let option = &self.naming.router_name_option;
        let name = self.string_option(option, "")?;
        if name.is_empty() {
            return Err(TorbridgeError::MissingConfiguration {
                option: option.clone(),
                hint: format!("Specify the routing container with the '{option}' option"),
            });
        }
        Ok(name)
    }
}

/// Validated driver options of one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkOptions {
    /// Bridge interface name.
    pub bridge_name: String,
    /// Bridge MTU.
    pub mtu: u32,
    /// Router container, when the request names one.
    pub router_name: Option<String>,
}

impl NetworkOptions {
    /// Parse and validate the generic options of `request`.
    ///
    /// # Errors
    ///
    /// The single failure when only one option is invalid, otherwise
    /// `InvalidOptions` listing all of them.
    pub fn parse(request: &NetworkRequest, naming: &DriverNaming) -> TorbridgeResult<Self> {
        let resolver = OptionResolver::new(request, naming);
        resolver.generic_options()?;

        let mut errors = Vec::new();
        let bridge_name = resolver.bridge_name().map_err(|e| errors.push(e)).ok();
        let mtu = resolver.mtu().map_err(|e| errors.push(e)).ok();
        let router_name = resolver
            .string_option(&naming.router_name_option, "")
            .map_err(|e| errors.push(e))
            .ok()
            .filter(|name| !name.is_empty());

        match (bridge_name, mtu) {
            (Some(bridge_name), Some(mtu)) if errors.is_empty() => Ok(Self {
                bridge_name,
                mtu,
                router_name,
            }),
            _ => Err(collect_errors(errors)),
        }
    }
}

/// Fold validation failures into one error.
pub(crate) fn collect_errors(mut errors: Vec<TorbridgeError>) -> TorbridgeError {
    if errors.len() == 1 {
        errors.remove(0)
    } else {
        TorbridgeError::InvalidOptions { errors }
    }
}
