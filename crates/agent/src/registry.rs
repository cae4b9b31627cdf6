//! Static module registry (SPEC_FULL.md §REDESIGN FLAGS #4): a compile-time
//! map from manifest `module` name to a constructor, replacing
//! `module_manager.py`'s `importlib` dynamic loading with the statically
//! linked alternative spec §9 names.

use crate::modules::{EchoModule, FaultyModule, PingModule};
use crate::module::Module;
use fleet_bus::BusClient;
use std::collections::HashMap;

type Factory<B> = fn() -> Box<dyn Module<B>>;

pub struct ModuleRegistry<B: BusClient> {
    factories: HashMap<&'static str, Factory<B>>,
}

impl<B: BusClient + Clone + 'static> ModuleRegistry<B> {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// The three demo modules from `original_source/modules/` (SPEC_FULL.md
    /// §C "Demo modules").
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("echo", || Box::new(EchoModule::default()));
        registry.register("ping", || Box::new(PingModule::default()));
        registry.register("faulty", || Box::new(FaultyModule::default()));
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: Factory<B>) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Module<B>>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl<B: BusClient + Clone + 'static> Default for ModuleRegistry<B> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
