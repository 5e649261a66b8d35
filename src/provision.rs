//! Per-instance configuration construction.
//!
//! Every instance in a batch gets the same shape: the shared
//! load-balanced endpoint with a health probe on the public port, plus
//! a direct-access endpoint at a per-index public port so each instance
//! stays individually addressable beside the pool.

use crate::naming;
use crate::types::{InstanceEndpoint, InstanceSpec, LoadBalancedEndpointConfig};

/// Build the creation payload for the instance at `index`.
pub fn build_instance_spec(
    base: &str,
    index: u32,
    instance_size: &str,
    image_name: &str,
    availability_set_name: Option<&str>,
    endpoint: &LoadBalancedEndpointConfig,
) -> InstanceSpec {
    let primary = InstanceEndpoint {
        name: endpoint.endpoint_name.clone(),
        protocol: endpoint.protocol,
        local_port: endpoint.local_port,
        public_port: endpoint.public_port,
        lb_set_name: Some(endpoint.lb_set_name.clone()),
        probe_port: Some(endpoint.public_port),
        probe_protocol: Some(endpoint.protocol),
        direct_server_return: endpoint.direct_server_return,
    };

    let direct = InstanceEndpoint {
        name: naming::DIRECT_ENDPOINT_NAME.to_string(),
        protocol: endpoint.protocol,
        local_port: endpoint.local_port,
        public_port: naming::direct_port(index),
        lb_set_name: None,
        probe_port: None,
        probe_protocol: None,
        direct_server_return: false,
    };

    InstanceSpec {
        name: naming::instance_name(base, index),
        instance_size: instance_size.to_string(),
        image_name: image_name.to_string(),
        availability_set_name: availability_set_name.map(str::to_string),
        endpoints: vec![primary, direct],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EndpointProtocol;
    use std::collections::HashSet;

    fn endpoint() -> LoadBalancedEndpointConfig {
        LoadBalancedEndpointConfig::derived("http", EndpointProtocol::Tcp, 8080, 80)
    }

    #[test]
    fn test_spec_shape() {
        let spec = build_instance_spec(
            "web",
            3,
            "Small",
            "ws2012-dc-201309",
            Some("httpavailability"),
            &endpoint(),
        );

        assert_eq!(spec.name, "web3");
        assert_eq!(spec.instance_size, "Small");
        assert_eq!(spec.image_name, "ws2012-dc-201309");
        assert_eq!(spec.availability_set_name.as_deref(), Some("httpavailability"));
        assert_eq!(spec.endpoints.len(), 2);

        let primary = &spec.endpoints[0];
        assert_eq!(primary.name, "http");
        assert_eq!(primary.lb_set_name.as_deref(), Some("LBhttp"));
        assert_eq!(primary.public_port, 80);
        assert_eq!(primary.local_port, 8080);
        // Probe targets the public port with the endpoint's protocol.
        assert_eq!(primary.probe_port, Some(80));
        assert_eq!(primary.probe_protocol, Some(EndpointProtocol::Tcp));

        let direct = &spec.endpoints[1];
        assert_eq!(direct.name, "directInstancePort");
        assert_eq!(direct.public_port, 30003);
        assert_eq!(direct.local_port, 8080);
        assert!(direct.lb_set_name.is_none());
        assert!(direct.probe_port.is_none());
    }

    #[test]
    fn test_direct_ports_unique_across_batch() {
        let ep = endpoint();
        let ports: HashSet<u16> = (1..=6)
            .map(|i| {
                build_instance_spec("web", i, "Small", "img", None, &ep).endpoints[1].public_port
            })
            .collect();
        assert_eq!(ports.len(), 6);
        assert!(ports.contains(&30001));
        assert!(ports.contains(&30006));
    }
}
