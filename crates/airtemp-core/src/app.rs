use anyhow::Result;
use std::sync::Arc;

use crate::{Accessory, AccessoryContext, Config};

/// Host state: configuration plus the lifecycle of registered accessories
pub struct App {
    config: Arc<Config>,
    accessories: Vec<Box<dyn Accessory>>,
    context: AccessoryContext,
}

impl App {
    /// Create a host from configuration on disk
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Create a host from an already-loaded configuration
    pub fn with_config(config: Config) -> Self {
        let config = Arc::new(config);
        let context = AccessoryContext::new(config.clone());

        Self {
            config,
            accessories: Vec::new(),
            context,
        }
    }

    /// Register an accessory with the host
    pub fn register_accessory(&mut self, accessory: Box<dyn Accessory>) {
        tracing::info!(
            "Registering accessory: {} ({:?})",
            accessory.name(),
            accessory.service()
        );
        self.accessories.push(accessory);
    }

    /// Initialize all registered accessories
    pub fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing host with {} accessories",
            self.accessories.len()
        );

        for accessory in &mut self.accessories {
            tracing::debug!("Initializing accessory: {}", accessory.name());
            accessory.initialize(&self.context)?;
        }

        Ok(())
    }

    /// Shut down every accessory; failures are logged, not propagated
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down host");

        for accessory in &mut self.accessories {
            tracing::debug!("Shutting down accessory: {}", accessory.name());
            if let Err(e) = accessory.shutdown() {
                tracing::error!("Error shutting down accessory {}: {}", accessory.name(), e);
            }
        }

        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn accessories(&self) -> &[Box<dyn Accessory>] {
        &self.accessories
    }
}
