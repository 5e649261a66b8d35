//! Derived resource names and instance-name parsing.
//!
//! Every name here is a pure function of its inputs. The load-balancer
//! set and availability set names are derived from the endpoint name,
//! instance names from the base plus a sequential index.

use crate::error::ProvisionError;

/// Name of the per-instance direct-access endpoint.
pub const DIRECT_ENDPOINT_NAME: &str = "directInstancePort";

/// Public ports for direct endpoints start here; instance index is added.
pub const DIRECT_PORT_BASE: u16 = 30000;

/// Load-balancer set name for an endpoint.
pub fn lb_set_name(endpoint_name: &str) -> String {
    format!("LB{}", endpoint_name)
}

/// Availability set name for an endpoint.
pub fn availability_set_name(endpoint_name: &str) -> String {
    format!("{}availability", endpoint_name)
}

/// Instance name for a given index.
pub fn instance_name(base: &str, index: u32) -> String {
    format!("{}{}", base, index)
}

/// Public port of the direct-access endpoint for a given index.
/// Unique per index within a deployment.
pub fn direct_port(index: u32) -> u16 {
    DIRECT_PORT_BASE + index as u16
}

/// Parse the sequential index out of an instance name.
///
/// Returns `Ok(None)` when the name does not start with `base`.
/// A name that starts with `base` must be exactly `base` followed by
/// digits — anything else is a [`ProvisionError::Parse`].
pub fn parse_instance_index(name: &str, base: &str) -> Result<Option<u32>, ProvisionError> {
    let Some(tail) = name.strip_prefix(base) else {
        return Ok(None);
    };

    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProvisionError::Parse(format!(
            "instance name {:?} does not match {:?} followed by digits",
            name, base
        )));
    }

    let index = tail.parse::<u32>().map_err(|_| {
        ProvisionError::Parse(format!("instance index out of range in {:?}", name))
    })?;

    Ok(Some(index))
}
