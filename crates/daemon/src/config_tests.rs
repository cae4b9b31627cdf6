use super::*;
use serial_test::serial;

fn clear_env() {
    for key in ["NATS_URL", "FLEET_STATE_DIR", "FLEET_CONTROL_SOCKET", "AGENT_HEARTBEAT_TIMEOUT_SECS", "FLEET_LIVENESS_SWEEP_SECS", "XDG_STATE_HOME"] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn from_env_rejects_a_missing_nats_url() {
    clear_env();
    assert!(matches!(DaemonConfig::from_env(), Err(ConfigError::Missing("NATS_URL"))));
}

#[test]
#[serial]
fn from_env_derives_the_control_socket_from_the_state_dir() {
    clear_env();
    std::env::set_var("NATS_URL", "nats://localhost:4222");
    std::env::set_var("FLEET_STATE_DIR", "/tmp/fleet-state-test");
    let config = DaemonConfig::from_env().unwrap();
    assert_eq!(config.control_socket, std::path::PathBuf::from("/tmp/fleet-state-test/control.sock"));
    clear_env();
}

#[test]
#[serial]
fn from_env_splits_a_comma_separated_nats_url_list() {
    clear_env();
    std::env::set_var("NATS_URL", "nats://a:4222, nats://b:4222");
    std::env::set_var("FLEET_STATE_DIR", "/tmp/fleet-state-test");
    let config = DaemonConfig::from_env().unwrap();
    assert_eq!(config.nats_servers, vec!["nats://a:4222".to_string(), "nats://b:4222".to_string()]);
    clear_env();
}

#[test]
#[serial]
fn from_env_rejects_a_non_numeric_heartbeat_timeout() {
    clear_env();
    std::env::set_var("NATS_URL", "nats://localhost:4222");
    std::env::set_var("FLEET_STATE_DIR", "/tmp/fleet-state-test");
    std::env::set_var("AGENT_HEARTBEAT_TIMEOUT_SECS", "soon");
    assert!(matches!(DaemonConfig::from_env(), Err(ConfigError::Invalid("AGENT_HEARTBEAT_TIMEOUT_SECS", _))));
    clear_env();
}
