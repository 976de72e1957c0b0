use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use airtemp_core::{App, AppError};
use airtemp_sensor::{TemperatureAccessory, TemperatureSensor};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    airtemp_core::init()?;

    let mut app = App::new()?;
    let sensor = Arc::new(TemperatureSensor::new(&app.config().sensor)?);
    app.register_accessory(Box::new(TemperatureAccessory::new(sensor.clone())));
    app.initialize()?;

    let mut changes = sensor.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            if let Some(value) = *changes.borrow_and_update() {
                tracing::info!("Current temperature: {:.1} °C", value);
            }
        }
    });

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let period = Duration::from_secs(app.config().host.poll_seconds);
    run_until(&sensor, period, ctrl_c).await;

    app.shutdown()?;
    watcher.abort();

    Ok(())
}

/// Read the sensor every `period` until `shutdown` resolves.
///
/// `shutdown` is polled for the whole run, including while a read is in
/// flight; a read interrupted by shutdown is dropped.
async fn run_until<F>(sensor: &TemperatureSensor, period: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = interval.tick() => {}
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = sensor.get_temperature() => {
                if let Err(e) = result {
                    let err = AppError::accessory(sensor.name(), e.to_string());
                    tracing::warn!("{} ({})", err, err.user_message());
                }
            }
        }
    }

    tracing::info!("Stopped polling {}", sensor.name());
}
