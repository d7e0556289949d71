//! EgressIPClaim CRD
//!
//! Requests a batch of egress IP allocations from the controller's pool.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::Condition;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "egressops.microscaler.io",
    version = "v1alpha1",
    kind = "EgressIPClaim",
    namespaced,
    status = "EgressIPClaimStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct EgressIPClaimSpec {
    /// Number of egress IPs to allocate for this claim (positive, defaults to 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub desired_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EgressIPClaimStatus {
    /// Addresses allocated from the pool, in allocation order; length equals
    /// `desiredCount` once allocation has succeeded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocated_addresses: Vec<String>,

    /// Latest allocation observations, one per condition type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{CONDITION_TYPE_ALLOCATED, ConditionStatus, set_condition};

    #[test]
    fn test_status_serializes_camel_case() {
        let mut status = EgressIPClaimStatus {
            allocated_addresses: vec!["10.201.0.1".to_string()],
            conditions: Vec::new(),
        };
        set_condition(
            &mut status.conditions,
            Condition {
                type_: CONDITION_TYPE_ALLOCATED.to_string(),
                status: ConditionStatus::True,
                reason: Some("Success".to_string()),
                message: Some("Allocated 1 egress IP(s)".to_string()),
                last_transition_time: None,
            },
        );

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["allocatedAddresses"][0], "10.201.0.1");
        assert_eq!(value["conditions"][0]["type"], "Allocated");
        assert_eq!(value["conditions"][0]["status"], "True");
        assert!(value["conditions"][0]["lastTransitionTime"].is_string());
    }

    #[test]
    fn test_empty_status_serializes_to_empty_object() {
        let status = EgressIPClaimStatus::default();

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_crd_schema_requires_positive_desired_count() {
        use kube::CustomResourceExt;

        let crd = serde_json::to_value(EgressIPClaim::crd()).unwrap();

        let desired_count = &crd["spec"]["versions"][0]["schema"]["openAPIV3Schema"]
            ["properties"]["spec"]["properties"]["desiredCount"];
        assert_eq!(desired_count["minimum"], 1.0);
    }
}
