use anyhow::{Context, Result};
use sprout_app::AppServices;
use sprout_core::Config;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    sprout_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Config directory: {}", config.config_dir.display());

    let services = AppServices::build(&config).context("Failed to start Sprout")?;
    services.reschedule_pending().await?;

    let plants = services.repository().snapshot();
    println!("Sprout - {} plants tracked", plants.len());
    for plant in plants.iter() {
        println!(
            "  {} (next watering {})",
            plant.name,
            plant.watering_schedule.format("%Y-%m-%d %H:%M")
        );
    }

    if !config.weather.effective_api_key().is_empty() {
        match services
            .weather()
            .lookup_current_location(services.location())
            .await
        {
            Ok(weather) => println!(
                "Weather in {}: {:.1}°C, {}",
                weather.location, weather.temperature, weather.condition
            ),
            Err(e) => tracing::warn!("Skipping local weather: {}", e),
        }
    }

    let mut posted = services.notifications().subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            received = posted.recv() => match received {
                Ok(notification) => println!(
                    "[{}] {} {}",
                    notification.posted_at.format("%H:%M"),
                    notification.title,
                    notification.body
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Missed {} notifications", missed);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    services.shutdown();
    Ok(())
}
