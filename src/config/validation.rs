use crate::config::types::{
    Config, ExtractionConfig, OutputConfig, PipelineConfig, TimingConfig, UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
///
/// Any error here is a setup failure: the run must not start.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_pipeline_config(&config.pipeline)?;
    validate_timing_config(&config.timing)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.fetch_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_workers must be >= 1, got {}",
            config.fetch_workers
        )));
    }

    if config.extraction_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "extraction_workers must be >= 1, got {}",
            config.extraction_workers
        )));
    }

    Ok(())
}

/// Upper bound for every configured delay or timeout: one day
const MAX_TIMING_SECS: f64 = 86_400.0;

fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    validate_seconds("rate_limit_delay", config.rate_limit_delay, true)?;
    validate_seconds("fetch_timeout", config.fetch_timeout, false)?;
    validate_seconds(
        "extraction_idle_timeout",
        config.extraction_idle_timeout,
        false,
    )?;
    Ok(())
}

/// Checks that `value` seconds converts to a `Duration` within bounds
fn validate_seconds(name: &str, value: f64, allow_zero: bool) -> Result<(), ConfigError> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !value.is_finite() || !lower_ok {
        return Err(ConfigError::Validation(format!(
            "{} must be {} 0 seconds, got {}",
            name,
            if allow_zero { ">=" } else { ">" },
            value
        )));
    }

    if value > MAX_TIMING_SECS || Duration::try_from_secs_f64(value).is_err() {
        return Err(ConfigError::Validation(format!(
            "{} must be at most {} seconds, got {}",
            name, MAX_TIMING_SECS, value
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens/underscores only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url).map_err(|e| {
            ConfigError::Validation(format!("Invalid contact_url '{}': {}", contact_url, e))
        })?;
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if Selector::parse(&config.selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "selector '{}' is not a valid CSS selector",
            config.selector
        )));
    }

    if config.sentinel.contains(['\t', '\n', '\r']) {
        return Err(ConfigError::Validation(
            "sentinel cannot contain tabs or line breaks".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    if let Some(report_path) = &config.report_path {
        if report_path == &config.path {
            return Err(ConfigError::Validation(
                "report_path must differ from the record output path".to_string(),
            ));
        }
    }

    Ok(())
}
