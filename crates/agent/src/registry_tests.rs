use super::*;
use fleet_bus::FakeBusClient;

#[test]
fn builtins_cover_the_three_demo_modules() {
    let registry: ModuleRegistry<FakeBusClient> = ModuleRegistry::with_builtins();
    let mut names: Vec<_> = registry.names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["echo", "faulty", "ping"]);
}

#[test]
fn create_for_unknown_module_is_none() {
    let registry: ModuleRegistry<FakeBusClient> = ModuleRegistry::with_builtins();
    assert!(registry.create("nonexistent").is_none());
}

#[test]
fn create_returns_a_module_with_the_matching_name() {
    let registry: ModuleRegistry<FakeBusClient> = ModuleRegistry::with_builtins();
    let module = registry.create("echo").unwrap();
    assert_eq!(module.name(), "echo");
}
