//! # Demo Registry
//!
//! Maps demo names to constructors, so a host can list, inspect and run demos
//! by name. Name and version come from each type's
//! [`DemoClass`](applied_api::DemoClass) implementation, usually derived.

use std::fmt;

use tracing::{debug, info};

use applied_api::demo::{Demo, DemoClass};
use applied_api::errors::DemoError;

type DemoFactory = Box<dyn Fn() -> Box<dyn Demo> + Send + Sync>;

struct DemoEntry {
    name: &'static str,
    version: f64,
    factory: DemoFactory,
}

/// Registered demos, in registration order.
#[derive(Default)]
pub struct DemoRegistry {
    entries: Vec<DemoEntry>,
}

impl fmt::Debug for DemoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl DemoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `D`, built with `D::default()` each time it runs.
    pub fn register<D>(&mut self) -> &mut Self
    where
        D: Demo + DemoClass + Default + 'static,
    {
        self.register_with(D::default)
    }

    /// Registers `D`, built by `factory` each time it runs.
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_with<D, F>(&mut self, factory: F) -> &mut Self
    where
        D: Demo + DemoClass + 'static,
        F: Fn() -> D + Send + Sync + 'static,
    {
        let entry = DemoEntry {
            name: D::demo_name(),
            version: D::demo_version(),
            factory: Box::new(move || -> Box<dyn Demo> { Box::new(factory()) }),
        };
        debug!(demo = entry.name, version = entry.version, "demo registered");

        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Names of every registered demo, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_ok()
    }

    /// Declared version of the named demo, `0.0` when it declares none.
    pub fn demo_class_version(&self, name: &str) -> Result<f64, DemoError> {
        self.find(name).map(|e| e.version)
    }

    /// Builds and runs the named demo.
    ///
    /// # Errors
    /// - [`DemoError::NotFound`] if no demo is registered under `name`
    /// - [`DemoError::Failed`] if the demo reports a failure
    pub fn run_demo(&self, name: &str) -> Result<(), DemoError> {
        let entry = self.find(name)?;
        let _span = tracing::info_span!("demo", name = entry.name, version = entry.version).entered();

        info!("running demo");
        (entry.factory)().demo().map_err(|source| DemoError::Failed {
            name: entry.name.to_string(),
            source,
        })
    }

    fn find(&self, name: &str) -> Result<&DemoEntry, DemoError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DemoError::NotFound(name.to_string()))
    }
}
