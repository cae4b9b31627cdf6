//! The Module Host (C2, spec §4.2): loads manifests, resolves them against
//! the static registry, and supervises the resulting tasks. Grounded on
//! `original_source/src/aiori_agent/module_manager.py`'s `ModuleManager`.

use crate::manifest::{self, ModuleManifest};
use crate::module::ModuleContext;
use crate::registry::ModuleRegistry;
use crate::supervisor::{SupervisedModule, Supervisor, DEFAULT_STOP_TIMEOUT};
use fleet_bus::BusClient;
use fleet_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct ModuleHost<B: BusClient> {
    registry: ModuleRegistry<B>,
    supervisor: Supervisor<B>,
    bus: B,
    agent_id: AgentId,
    agent_name: String,
    modules_dir: PathBuf,
    running: Mutex<HashMap<String, SupervisedModule>>,
}

impl<B: BusClient + Clone + 'static> ModuleHost<B> {
    pub fn new(registry: ModuleRegistry<B>, bus: B, agent_id: AgentId, agent_name: String, modules_dir: PathBuf, crash_dir: PathBuf) -> Self {
        let supervisor = Supervisor::new(bus.clone(), agent_id, crash_dir);
        Self { registry, supervisor, bus, agent_id, agent_name, modules_dir, running: Mutex::new(HashMap::new()) }
    }

    /// Loads every manifest in the modules directory and starts the
    /// enabled ones (spec §4.2 step 1, "`start_all`").
    pub async fn load_all(&self) -> Result<(), manifest::ManifestError> {
        for manifest in manifest::load_all(&self.modules_dir).await? {
            self.apply(manifest).await;
        }
        Ok(())
    }

    /// Stops a previous instance of this module if running, then starts a
    /// fresh one from the manifest (spec §4.2 step 4 "hot-reload: stop then
    /// start"). A manifest naming an unregistered module, or `enabled =
    /// false`, just stops the existing instance.
    pub async fn apply(&self, manifest: ModuleManifest) {
        self.stop(&manifest.module).await;

        if !manifest.enabled {
            tracing::info!(module = %manifest.module, "module disabled, not starting");
            return;
        }

        let Some(module) = self.registry.create(&manifest.module) else {
            tracing::warn!(module = %manifest.module, "no registered module for manifest");
            return;
        };

        let mut module = module;
        if !module.setup().await {
            tracing::warn!(module = %manifest.module, "setup() returned false, skipping start");
            return;
        }

        let ctx = ModuleContext::new(self.agent_id, self.agent_name.clone(), self.bus.clone(), &manifest.module);
        let supervised = self.supervisor.start(module, ctx).await;
        self.running.lock().insert(manifest.module, supervised);
    }

    pub async fn stop(&self, module_name: &str) {
        let supervised = self.running.lock().remove(module_name);
        if let Some(supervised) = supervised {
            if let Err(error) = self.supervisor.stop(supervised, DEFAULT_STOP_TIMEOUT).await {
                tracing::warn!(module = module_name, %error, "module did not stop cleanly");
            }
        }
    }

    pub async fn stop_all(&self) {
        let names: Vec<String> = self.running.lock().keys().cloned().collect();
        for name in names {
            self.stop(&name).await;
        }
    }

    pub fn running_modules(&self) -> Vec<String> {
        self.running.lock().keys().cloned().collect()
    }

    /// The capability document a heartbeat advertises (spec §4.3
    /// "`_safe_loaded_modules`"): one descriptor per currently running
    /// module, built from a throwaway instance since the registry holds
    /// constructors, not live instances.
    pub fn capabilities(&self) -> fleet_core::CapabilityDocument {
        let descriptors = self.running_modules().into_iter().filter_map(|name| {
            let module = self.registry.create(&name)?;
            fleet_core::ModuleDescriptor::new(
                name.clone(),
                module.input_schema(),
                fleet_bus::subject::module_in(&self.agent_id, &name),
                fleet_bus::subject::module_out(&self.agent_id, &name),
                fleet_bus::subject::module_error(&self.agent_id, &name),
            )
            .ok()
        });
        fleet_core::CapabilityDocument::new(descriptors)
    }

    /// Reloads the manifest at `path` in response to a watcher event (spec
    /// §4.2 "hot-reload").
    pub async fn reload_from_path(&self, path: &Path) {
        let module_name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(name) => name.to_string(),
            None => return,
        };
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(module = %module_name, %error, "failed to read manifest for reload");
                return;
            }
        };
        match ModuleManifest::parse(&raw, &path.display().to_string()) {
            Ok(manifest) => self.apply(manifest).await,
            Err(error) => tracing::warn!(module = %module_name, %error, "failed to parse manifest for reload"),
        }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
