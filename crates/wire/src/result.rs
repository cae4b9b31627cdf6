//! The module-output envelope the result handler (spec §4.6) parses.
//!
//! Module output schemas are opaque to the engine beyond `workflow_id` and
//! an optional `success` indicator (spec §4.6 "Result handler"). This type
//! wraps the raw JSON and implements the decision rule from that section
//! verbatim: explicit `success` boolean, else `true` if the payload
//! contains an identifying result field, else `false`.

use fleet_core::WorkflowId;

/// Fields whose presence is read as "this looks like a completed result"
/// when the payload carries no explicit `success` flag.
const IDENTIFYING_RESULT_FIELDS: &[&str] = &["result", "value", "data"];

#[derive(Debug, Clone)]
pub struct ResultEnvelope(pub serde_json::Value);

impl ResultEnvelope {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }

    /// `None` means the payload carried no `workflow_id` and should be
    /// discarded as an untracked request (spec §4.6 step 1).
    pub fn workflow_id(&self) -> Option<WorkflowId> {
        self.0.get("workflow_id")?.as_str().map(WorkflowId::from_string)
    }

    pub fn is_success(&self) -> bool {
        if let Some(explicit) = self.0.get("success").and_then(|v| v.as_bool()) {
            return explicit;
        }
        IDENTIFYING_RESULT_FIELDS.iter().any(|field| self.0.get(field).is_some())
    }

    pub fn error_message(&self) -> Option<String> {
        self.0.get("error").and_then(|v| v.as_str()).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_success_true_wins_over_missing_fields() {
        let env = ResultEnvelope(serde_json::json!({"success": true, "workflow_id": "wfl-1"}));
        assert!(env.is_success());
    }

    #[test]
    fn explicit_success_false_wins_over_result_field() {
        let env = ResultEnvelope(serde_json::json!({"success": false, "result": 42}));
        assert!(!env.is_success());
    }

    #[test]
    fn identifying_field_implies_success_without_explicit_flag() {
        let env = ResultEnvelope(serde_json::json!({"value": 1.23}));
        assert!(env.is_success());
    }

    #[test]
    fn absence_of_everything_implies_failure() {
        let env = ResultEnvelope(serde_json::json!({"note": "nothing useful"}));
        assert!(!env.is_success());
    }

    #[test]
    fn missing_workflow_id_is_none() {
        let env = ResultEnvelope(serde_json::json!({"success": true}));
        assert_eq!(env.workflow_id(), None);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(ResultEnvelope::parse(b"not json").is_err());
    }
}
