use super::test_support::{sample_agent, sample_capabilities};
use super::*;
use chrono::Duration as ChronoDuration;

#[test]
fn descriptor_rejects_empty_subject() {
    let err = ModuleDescriptor::new("echo", serde_json::json!({}), "", "out", "err").unwrap_err();
    assert_eq!(err, DescriptorError::EmptySubject("echo".to_string()));
}

#[test]
fn descriptor_rejects_duplicate_subjects() {
    let err =
        ModuleDescriptor::new("echo", serde_json::json!({}), "a.in", "a.in", "a.err")
            .unwrap_err();
    assert_eq!(err, DescriptorError::DuplicateSubject("echo".to_string()));
}

#[test]
fn descriptor_accepts_distinct_nonempty_subjects() {
    let d = ModuleDescriptor::new("echo", serde_json::json!({}), "a.in", "a.out", "a.err");
    assert!(d.is_ok());
}

#[test]
fn capability_documents_compare_by_value() {
    let a = sample_capabilities(&["echo"]);
    let b = sample_capabilities(&["echo"]);
    assert_eq!(a, b);

    let c = sample_capabilities(&["echo", "ping"]);
    assert_ne!(a, c);
}

#[test]
fn output_subjects_enumerates_every_module() {
    let caps = sample_capabilities(&["echo", "ping"]);
    let mut subjects: Vec<&str> = caps.output_subjects().collect();
    subjects.sort_unstable();
    assert_eq!(subjects, vec!["agent.a1.echo.out", "agent.a1.ping.out"]);
}

#[test]
fn first_heartbeat_seeds_record_with_count_one() {
    let now = chrono::Utc::now();
    let record = sample_agent(AgentId::new(), now);
    assert_eq!(record.heartbeat_count, 1);
    assert!(record.alive);
    assert_eq!(record.first_seen, record.last_seen);
}

#[test]
fn repeat_heartbeat_bumps_bookkeeping_without_changing_capabilities() {
    let now = chrono::Utc::now();
    let mut record = sample_agent(AgentId::new(), now);
    let caps_before = record.capabilities.clone();

    let later = now + ChronoDuration::seconds(5);
    record.record_repeat_heartbeat(later);

    assert_eq!(record.heartbeat_count, 2);
    assert_eq!(record.last_seen, later);
    assert_eq!(record.capabilities, caps_before);
}

#[test]
fn changed_heartbeat_replaces_capabilities() {
    let now = chrono::Utc::now();
    let mut record = sample_agent(AgentId::new(), now);

    let new_caps = sample_capabilities(&["echo", "ping"]);
    record.record_changed_heartbeat(new_caps.clone(), now + ChronoDuration::seconds(1));

    assert_eq!(record.capabilities, new_caps);
    assert_eq!(record.heartbeat_count, 2);
}

#[test]
fn is_stale_at_exact_timeout_boundary() {
    let now = chrono::Utc::now();
    let mut record = sample_agent(AgentId::new(), now);
    record.last_seen = now;

    let timeout = ChronoDuration::seconds(10);
    // Exactly-at-timeout must already count as stale (spec boundary case).
    assert!(record.is_stale(now + timeout, timeout));
    assert!(!record.is_stale(now + timeout - ChronoDuration::seconds(1), timeout));
}

#[test]
fn descriptor_in_document_validates_transitively() {
    let mut caps = sample_capabilities(&["echo"]);
    if let Some(descriptor) = caps.modules.get_mut("echo") {
        descriptor.error_subject = descriptor.output_subject.clone();
    }
    assert!(caps.validate().is_err());
}

#[test]
fn get_looks_up_by_module_name() {
    let caps = sample_capabilities(&["echo", "ping"]);
    assert!(caps.get("echo").is_some());
    assert!(caps.get("missing").is_none());
}
