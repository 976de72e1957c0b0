use anyhow::Result;
use std::sync::Arc;

use crate::Config;

/// An accessory the host exposes (a sensor, a switch, ...).
pub trait Accessory: Send + Sync {
    /// Stable identifier for this accessory
    fn id(&self) -> &str;

    /// Display label; only used for logging and presentation
    fn name(&self) -> &str;

    /// The kind of value this accessory publishes
    fn service(&self) -> ServiceKind;

    /// Called once after registration, before the host starts reading values
    fn initialize(&mut self, ctx: &AccessoryContext) -> Result<()>;

    /// Called when the host is going away
    fn shutdown(&mut self) -> Result<()>;
}

/// Context handed to accessories during initialization
pub struct AccessoryContext {
    pub config: Arc<Config>,
}

impl AccessoryContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// Service types an accessory can publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Ambient temperature in degrees Celsius
    TemperatureSensor,
}

impl ServiceKind {
    pub fn characteristic(&self) -> &'static str {
        match self {
            ServiceKind::TemperatureSensor => "CurrentTemperature",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_characteristic() {
        assert_eq!(
            ServiceKind::TemperatureSensor.characteristic(),
            "CurrentTemperature"
        );
    }
}
