use crate::config::types::{
    Config, OutputConfig, PacingConfig, ProgressConfig, SourceConfig, WorkersConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_pacing_config(&config.pacing)?;
    validate_workers_config(&config.workers)?;
    validate_output_config(&config.output)?;
    validate_progress_config(&config.progress)?;
    Ok(())
}

/// Validates remote source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;
    validate_http_url("image_cdn_url", &config.image_cdn_url)?;
    validate_path("list_path", &config.list_path)?;
    validate_path("detail_path", &config.detail_path)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.request_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be <= 60000ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.batch_delay_ms > 600_000 {
        return Err(ConfigError::Validation(format!(
            "batch_delay_ms must be <= 600000ms, got {}ms",
            config.batch_delay_ms
        )));
    }

    Ok(())
}

/// Validates worker pool sizing
fn validate_workers_config(config: &WorkersConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sessions < 1 || config.max_concurrent_sessions > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sessions must be between 1 and 32, got {}",
            config.max_concurrent_sessions
        )));
    }

    if config.queue_capacity > 1000 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be <= 1000, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_progress_config(config: &ProgressConfig) -> Result<(), ConfigError> {
    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel_capacity must be >= 1".to_string(),
        ));
    }
    Ok(())
}

/// Validates that a URL parses and uses an HTTP scheme
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates an endpoint path
fn validate_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            field, value
        )));
    }
    Ok(())
}
