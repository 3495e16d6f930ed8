use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use skycast_weather::{
    ConfiguredPosition, LocationResolver, NoPositionSource, NominatimClient, PositionSource,
    RefreshEngine, WeatherContext, WeatherProvider,
};

use crate::error::{AppError, ConfigError};
use crate::Config;

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    context: Arc<WeatherContext>,
    resolver: LocationResolver,
    engine: Arc<RefreshEngine>,
}

impl App {
    /// Create a new application instance from the user's config file
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config)?)
    }

    /// Wire up the weather services for `config`
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        let weather = &config.weather;
        let timeout = Duration::from_secs(weather.request_timeout_secs);
        let provider = WeatherProvider::with_base_url(&weather.forecast_url, timeout)?;
        let places =
            NominatimClient::with_base_url(&weather.geocode_url, &weather.user_agent, timeout)?;

        let source: Arc<dyn PositionSource> = match config.location.position() {
            Some((lat, lon)) => Arc::new(ConfiguredPosition::new(lat, lon)),
            None => Arc::new(NoPositionSource),
        };

        let resolver = LocationResolver::new(source, Arc::new(places), config.location.fallback())
            .with_options(config.location.position_options())
            .with_unit_inference(weather.temperature_unit.fixed().is_none());

        let context = Arc::new(WeatherContext::new(weather.unit_preferences()));
        let engine = RefreshEngine::new(
            context.clone(),
            Arc::new(provider),
            weather.refresh_settings(),
        );

        Ok(Self {
            config: Arc::new(config),
            context,
            resolver,
            engine,
        })
    }

    /// Resolve the location, fetch the first forecast and start refreshing
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!("Initializing application");

        let coordinate = self.resolver.resolve(&self.context).await;
        self.engine.initialize(coordinate).await;

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Re-run location resolution; a moved location triggers a fetch
    pub async fn relocate(&self) -> bool {
        let coordinate = self.resolver.resolve(&self.context).await;
        self.engine.set_location(coordinate).await
    }

    /// Stop background refreshes
    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application");
        self.engine.stop();
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Arc<WeatherContext> {
        &self.context
    }

    pub fn engine(&self) -> &Arc<RefreshEngine> {
        &self.engine
    }
}
