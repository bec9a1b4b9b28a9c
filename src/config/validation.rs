use crate::config::types::{Config, CrawlConfig};
use crate::storage::{StorageConfig, StorageKind};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation("url cannot be empty".to_string()));
    }

    if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
        return Err(ConfigError::InvalidUrl(format!(
            "url must be a valid HTTP or HTTPS URL, got '{}'",
            config.url
        )));
    }

    if config.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be non-negative, got {}",
            config.delay
        )));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be positive".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
///
/// Local storage needs an output directory; the cloud and SFTP kinds need
/// their target identifiers present before the backend factory runs.
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    match config.kind {
        StorageKind::Local => {
            if config.output.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "storage output directory cannot be empty".to_string(),
                ));
            }
        }
        StorageKind::S3 | StorageKind::Gcs => {
            if config.bucket.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{:?} storage requires a bucket name",
                    config.kind
                )));
            }
        }
        StorageKind::Azure => {
            if config.container.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(
                    "azure storage requires a container name".to_string(),
                ));
            }
        }
        StorageKind::Sftp => {
            if config.host.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(
                    "sftp storage requires a host".to_string(),
                ));
            }
        }
    }

    Ok(())
}
