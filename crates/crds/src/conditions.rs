//! Status conditions for EgressOps CRDs
//!
//! Conditions follow the Kubernetes `metav1.Condition` convention: one record
//! per condition type, replaced in place when the observation changes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type recording the outcome of egress IP allocation.
pub const CONDITION_TYPE_ALLOCATED: &str = "Allocated";

/// A typed, timestamped observation about a resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (e.g. "Allocated")
    #[serde(rename = "type")]
    pub type_: String,

    /// Whether the condition currently holds
    pub status: ConditionStatus,

    /// Machine-readable reason for the latest transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable detail for the latest transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// When the condition last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Truth value of a condition, following the Kubernetes convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// The condition cannot be determined
    Unknown,
}

/// Merges a condition into the list, keyed by condition type.
///
/// A condition of the same type is replaced rather than duplicated. When the
/// existing record already carries the same status, reason, and message it is
/// left untouched so its transition time survives redundant reconciliations.
/// Inserted and replaced records are stamped with the current time.
///
/// Returns true when the list was modified.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            if existing.status == condition.status
                && existing.reason == condition.reason
                && existing.message == condition.message
            {
                return false;
            }
            *existing = Condition {
                last_transition_time: Some(Utc::now()),
                ..condition
            };
            true
        }
        None => {
            conditions.push(Condition {
                last_transition_time: Some(Utc::now()),
                ..condition
            });
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocated(status: ConditionStatus, reason: &str, message: &str) -> Condition {
        Condition {
            type_: CONDITION_TYPE_ALLOCATED.to_string(),
            status,
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            last_transition_time: None,
        }
    }

    #[test]
    fn test_set_condition_appends_new_type() {
        let mut conditions = Vec::new();

        let changed = set_condition(
            &mut conditions,
            allocated(ConditionStatus::True, "Success", "Allocated 1 egress IP(s)"),
        );

        assert!(changed);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].type_, "Allocated");
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert!(conditions[0].last_transition_time.is_some());
    }

    #[test]
    fn test_set_condition_replaces_same_type() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            allocated(
                ConditionStatus::False,
                "IpPoolAllocationFailed",
                "Error allocating 5 egress IP(s) from the pool: pool exhausted",
            ),
        );

        let changed = set_condition(
            &mut conditions,
            allocated(ConditionStatus::True, "Success", "Allocated 5 egress IP(s)"),
        );

        // Replaced in place, never duplicated
        assert!(changed);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].reason.as_deref(), Some("Success"));
    }

    #[test]
    fn test_set_condition_keeps_identical_condition_untouched() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            allocated(ConditionStatus::True, "Success", "Allocated 1 egress IP(s)"),
        );
        let first_transition = conditions[0].last_transition_time;

        let changed = set_condition(
            &mut conditions,
            allocated(ConditionStatus::True, "Success", "Allocated 1 egress IP(s)"),
        );

        assert!(!changed);
        assert_eq!(conditions.len(), 1);
        // Transition time survives a redundant write
        assert_eq!(conditions[0].last_transition_time, first_transition);
    }

    #[test]
    fn test_set_condition_tracks_types_independently() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            allocated(ConditionStatus::True, "Success", "Allocated 1 egress IP(s)"),
        );

        let changed = set_condition(
            &mut conditions,
            Condition {
                type_: "Ready".to_string(),
                status: ConditionStatus::Unknown,
                reason: None,
                message: None,
                last_transition_time: None,
            },
        );

        assert!(changed);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].type_, "Allocated");
        assert_eq!(conditions[1].type_, "Ready");
    }
}
