use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let errors: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: errors.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if reqwest::Url::parse(&config.row_store.url).is_err() {
        return Err(ConfigError::Validation {
            message: format!("Row store URL is not a valid URL: {}", config.row_store.url),
        });
    }

    if !config.row_store.api_key.is_configured() {
        return Err(ConfigError::MissingSecret {
            name: "row_store.api_key".to_string(),
            reason: "no value, file or envVar given".to_string(),
        });
    }

    if !config.google.client_id.is_configured() {
        return Err(ConfigError::MissingSecret {
            name: "google.client_id".to_string(),
            reason: "no value, file or envVar given".to_string(),
        });
    }

    let auth = &config.auth;
    if auth.refresh_lead_secs >= auth.token_lifetime_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "auth.refresh_lead_secs ({}) must be shorter than the token lifetime ({})",
                auth.refresh_lead_secs, auth.token_lifetime_secs
            ),
        });
    }
    if auth.expiry_margin_secs >= auth.token_lifetime_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "auth.expiry_margin_secs ({}) must be shorter than the token lifetime ({})",
                auth.expiry_margin_secs, auth.token_lifetime_secs
            ),
        });
    }
    if auth.encrypt_token_store && auth.token_store_path.is_none() {
        return Err(ConfigError::Validation {
            message: "auth.encrypt_token_store requires auth.token_store_path".to_string(),
        });
    }

    for (category, skus) in &config.product_catalog {
        if category.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "Product catalog contains an empty category name".to_string(),
            });
        }
        if skus.is_empty() {
            return Err(ConfigError::Validation {
                message: format!("Product category '{}' has no SKUs", category),
            });
        }
    }

    if config
        .server
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        return Err(ConfigError::Validation {
            message: format!("Invalid server bind address: {}", config.server.bind_address),
        });
    }

    Ok(())
}

#[cfg(test)]
pub(crate) const MINIMAL_CONFIG: &str = r#"
{
    "version": "1.0",
    "company_email_domain": "@pw.live",
    "row_store": {
        "url": "https://rows.example.com",
        "api_key": { "value": "anon-key" }
    },
    "google": {
        "client_id": { "value": "client-id" },
        "client_secret": { "value": "client-secret" }
    },
    "sheets": {
        "response_spreadsheet_id": "sheet-1",
        "image_folder_id": "folder-1"
    }
}
"#;
