//! Existing-deployment inspection.
//!
//! Pure functions over the compute inventory. Appending to a deployment
//! trusts what is already running: the first matching instance becomes
//! the template for sizing, image, and endpoint configuration, and the
//! next index continues the numeric suffix sequence.

use crate::error::ProvisionError;
use crate::naming;
use crate::types::{InstanceRecord, LoadBalancedEndpointConfig};

/// Configuration extracted from a template instance.
#[derive(Debug, Clone)]
pub struct DeploymentTemplate {
    pub availability_set_name: Option<String>,
    pub source_image_name: String,
    pub instance_size: String,
    pub endpoint: LoadBalancedEndpointConfig,
}

/// What the inspector found for an occupied name base.
#[derive(Debug, Clone)]
pub struct ExistingDeployment {
    /// max existing suffix + 1.
    pub next_index: u32,
    pub template: DeploymentTemplate,
}

/// Inspect the instances of a service for an existing deployment under
/// `base`.
///
/// Returns `Ok(None)` when no instance name starts with `base` — a
/// fresh deployment starting at index 1. A matching name that is not
/// exactly `base` followed by digits fails with a parse error; a
/// template instance without a load-balanced endpoint fails with a
/// state error (a non-load-balanced deployment is not a valid append
/// target).
pub fn inspect(
    instances: &[InstanceRecord],
    base: &str,
) -> Result<Option<ExistingDeployment>, ProvisionError> {
    let mut max_index: Option<u32> = None;
    let mut template: Option<&InstanceRecord> = None;

    for record in instances {
        let Some(index) = naming::parse_instance_index(&record.name, base)? else {
            continue;
        };
        if template.is_none() {
            template = Some(record);
        }
        max_index = Some(max_index.map_or(index, |m| m.max(index)));
    }

    let (Some(record), Some(max_index)) = (template, max_index) else {
        return Ok(None);
    };

    let lb_endpoint = record
        .endpoints
        .iter()
        .find(|ep| ep.is_load_balanced())
        .ok_or_else(|| {
            ProvisionError::State(format!(
                "template instance {:?} has no load-balanced endpoint",
                record.name
            ))
        })?;
    let lb_set_name = lb_endpoint
        .lb_set_name
        .clone()
        .ok_or_else(|| ProvisionError::State("endpoint lost its LB set name".into()))?;

    Ok(Some(ExistingDeployment {
        next_index: max_index + 1,
        template: DeploymentTemplate {
            availability_set_name: record.availability_set_name.clone(),
            source_image_name: record.os_disk.source_image_name.clone(),
            instance_size: record.instance_size.clone(),
            endpoint: LoadBalancedEndpointConfig {
                endpoint_name: lb_endpoint.name.clone(),
                protocol: lb_endpoint.protocol,
                local_port: lb_endpoint.local_port,
                public_port: lb_endpoint.public_port,
                lb_set_name,
                direct_server_return: lb_endpoint.direct_server_return,
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EndpointProtocol, InstanceEndpoint, OsDisk};

    fn lb_endpoint() -> InstanceEndpoint {
        InstanceEndpoint {
            name: "http".to_string(),
            protocol: EndpointProtocol::Tcp,
            local_port: 8080,
            public_port: 80,
            lb_set_name: Some("LBhttp".to_string()),
            probe_port: Some(80),
            probe_protocol: Some(EndpointProtocol::Tcp),
            direct_server_return: false,
        }
    }

    fn record(name: &str, endpoints: Vec<InstanceEndpoint>) -> InstanceRecord {
        InstanceRecord {
            name: name.to_string(),
            availability_set_name: Some("httpavailability".to_string()),
            instance_size: "Small".to_string(),
            os_disk: OsDisk {
                source_image_name: "ws2012-dc-201309".to_string(),
            },
            endpoints,
        }
    }

    #[test]
    fn test_inspect_empty_inventory() {
        assert!(inspect(&[], "web").unwrap().is_none());
    }

    #[test]
    fn test_inspect_no_matching_names() {
        let instances = vec![record("db1", vec![lb_endpoint()])];
        assert!(inspect(&instances, "web").unwrap().is_none());
    }

    #[test]
    fn test_inspect_next_index() {
        let instances = vec![
            record("web1", vec![lb_endpoint()]),
            record("web5", vec![lb_endpoint()]),
            record("web2", vec![lb_endpoint()]),
            record("db9", vec![lb_endpoint()]),
        ];
        let existing = inspect(&instances, "web").unwrap().unwrap();
        assert_eq!(existing.next_index, 6);
    }

    #[test]
    fn test_inspect_template_is_first_match() {
        let mut other = record("web2", vec![lb_endpoint()]);
        other.instance_size = "Large".to_string();
        let instances = vec![record("web1", vec![lb_endpoint()]), other];

        let existing = inspect(&instances, "web").unwrap().unwrap();
        assert_eq!(existing.template.instance_size, "Small");
        assert_eq!(existing.template.source_image_name, "ws2012-dc-201309");
        assert_eq!(
            existing.template.availability_set_name.as_deref(),
            Some("httpavailability")
        );
        assert_eq!(existing.template.endpoint.lb_set_name, "LBhttp");
        assert_eq!(existing.template.endpoint.public_port, 80);
    }

    #[test]
    fn test_inspect_malformed_suffix_fails() {
        let instances = vec![record("web-old", vec![lb_endpoint()])];
        let err = inspect(&instances, "web").unwrap_err();
        assert!(matches!(err, ProvisionError::Parse(_)));
    }

    #[test]
    fn test_inspect_no_lb_endpoint_fails() {
        let direct_only = InstanceEndpoint {
            name: "rdp".to_string(),
            protocol: EndpointProtocol::Tcp,
            local_port: 3389,
            public_port: 3389,
            lb_set_name: None,
            probe_port: None,
            probe_protocol: None,
            direct_server_return: false,
        };
        let instances = vec![record("web1", vec![direct_only])];
        let err = inspect(&instances, "web").unwrap_err();
        assert!(matches!(err, ProvisionError::State(_)));
    }
}
