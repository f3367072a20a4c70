use super::types::*;
use crate::config::expand_env_vars;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid value for {var}: {message}")]
    Env { var: String, message: String },
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config_str(&yaml_string)
}

/// Parse and validate a YAML config, expanding `$env{VAR}` references first.
pub fn parse_config_str(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);

    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;
    normalize(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Build the config from the process environment.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    from_env_vars(std::env::vars())
}

/// Build the config from environment-style key/value pairs.
///
/// `ENVIRONMENT_ID` is accepted when `RAILWAY_ENVIRONMENT_ID` is unset.
pub fn from_env_vars<I>(vars: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let get = |key: &str| vars.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

    let mut environment_id = get("RAILWAY_ENVIRONMENT_ID");
    if environment_id.is_empty() {
        environment_id = get("ENVIRONMENT_ID");
    }

    let project_id = Some(get("RAILWAY_PROJECT_ID")).filter(|p| !p.is_empty());

    let report_status_every = match vars.get("REPORT_STATUS_EVERY") {
        Some(raw) if !raw.trim().is_empty() => parse_duration_var("REPORT_STATUS_EVERY", raw)?,
        _ => StreamConfig::default().report_status_every,
    };

    let ingest_url = get("INGEST_URL");
    let webhook = if ingest_url.is_empty() {
        None
    } else {
        let headers = match vars.get("ADDITIONAL_HEADERS") {
            Some(raw) if !raw.trim().is_empty() => {
                parse_headers(raw).map_err(|message| ConfigError::Env {
                    var: "ADDITIONAL_HEADERS".to_string(),
                    message,
                })?
            }
            _ => BTreeMap::new(),
        };

        Some(WebhookConfig {
            url: ingest_url,
            headers,
            filters: FilterConfig {
                levels: split_list(&get("LOGS_FILTER_WEBHOOK")),
                content: get("LOGS_CONTENT_FILTER_WEBHOOK"),
            },
        })
    };

    let mut config = Config {
        railway: RailwayConfig {
            api_key: get("RAILWAY_API_KEY"),
            project_id,
            environment_id,
            services: split_list(&get("TRAIN")),
            api_url: Some(get("RAILWAY_API_URL"))
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| crate::graphql::DEFAULT_API_URL.to_string()),
            subscription_url: Some(get("RAILWAY_SUBSCRIPTION_URL"))
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| crate::subscription::DEFAULT_SUBSCRIPTION_URL.to_string()),
        },
        filters: FilterConfig {
            levels: split_list(&get("LOGS_FILTER")),
            content: get("LOGS_CONTENT_FILTER"),
        },
        stream: StreamConfig {
            report_status_every,
            ..StreamConfig::default()
        },
        webhook,
    };

    normalize(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn parse_duration_var(var: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime_serde::re::humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Env {
        var: var.to_string(),
        message: e.to_string(),
    })
}

/// Split a comma separated list, dropping empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `key=value;key2=value2` header pairs.
pub fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, String> {
    let mut headers = BTreeMap::new();

    for pair in raw.split(';').filter(|p| !p.trim().is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| "header key value pair must be in format k=v".to_string())?;

        let key = key.trim();
        if key.is_empty() {
            return Err("header key must not be empty".to_string());
        }

        headers.insert(key.to_string(), value.trim().to_string());
    }

    Ok(headers)
}

fn normalize(config: &mut Config) {
    let railway = &mut config.railway;
    railway.api_key = railway.api_key.trim().to_string();
    railway.environment_id = railway.environment_id.trim().to_string();
    railway.project_id = railway
        .project_id
        .take()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    railway.services.retain(|s| !s.trim().is_empty());
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut unexpanded_vars: Vec<String> = re
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}",
        unexpanded_vars.join(", ")
    )))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    let railway = &config.railway;

    if railway.api_key.is_empty() {
        errors.push("railway.api_key (RAILWAY_API_KEY) is required".to_string());
    }

    if railway.environment_id.is_empty() {
        errors.push(
            "railway.environment_id (RAILWAY_ENVIRONMENT_ID or ENVIRONMENT_ID) is required"
                .to_string(),
        );
    }

    // Without a project there is nothing to discover services from
    if railway.project_id.is_none() && railway.services.is_empty() {
        errors.push(
            "railway.services (TRAIN) must be specified when no project ID is given".to_string(),
        );
    }

    match &config.webhook {
        None => errors.push("at least one sink must be configured (webhook / INGEST_URL)".to_string()),
        Some(webhook) => {
            if !(webhook.url.starts_with("http://") || webhook.url.starts_with("https://")) {
                errors.push(format!("webhook.url must be an http(s) URL, got '{}'", webhook.url));
            }
            for key in webhook.headers.keys() {
                if key.trim().is_empty() {
                    errors.push("webhook.headers contains an empty header name".to_string());
                }
            }
        }
    }

    if config.stream.channel_capacity == 0 {
        errors.push("stream.channel_capacity must be greater than 0".to_string());
    }

    if config.stream.report_status_every.is_zero() {
        errors.push("stream.report_status_every must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers("Authorization=Bearer x; X-Tenant = acme ;").unwrap();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer x");
        assert_eq!(headers.get("X-Tenant").unwrap(), "acme");

        // Values may contain '='
        let headers = parse_headers("X-Sig=a=b").unwrap();
        assert_eq!(headers.get("X-Sig").unwrap(), "a=b");

        assert!(parse_headers("nokey").is_err());
        assert!(parse_headers("=value").is_err());
    }

    #[test]
    fn test_env_legacy_environment_id() {
        let config = from_env_vars(env(&[
            ("RAILWAY_API_KEY", "key"),
            ("ENVIRONMENT_ID", "e1"),
            ("TRAIN", "s1,s2"),
            ("INGEST_URL", "https://ingest.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.railway.environment_id, "e1");
        assert_eq!(config.railway.services, vec!["s1", "s2"]);
        assert!(config.railway.project_id.is_none());
    }

    #[test]
    fn test_env_status_interval() {
        let config = from_env_vars(env(&[
            ("RAILWAY_API_KEY", "key"),
            ("RAILWAY_PROJECT_ID", "p1"),
            ("RAILWAY_ENVIRONMENT_ID", "e1"),
            ("INGEST_URL", "https://ingest.example.com"),
            ("REPORT_STATUS_EVERY", "1m"),
        ]))
        .unwrap();

        assert_eq!(config.stream.report_status_every, Duration::from_secs(60));

        let err = from_env_vars(env(&[
            ("RAILWAY_API_KEY", "key"),
            ("RAILWAY_PROJECT_ID", "p1"),
            ("RAILWAY_ENVIRONMENT_ID", "e1"),
            ("INGEST_URL", "https://ingest.example.com"),
            ("REPORT_STATUS_EVERY", "often"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let err = from_env_vars(env(&[])).unwrap_err();

        match err {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 4);
                assert!(errors.iter().any(|e| e.contains("api_key")));
                assert!(errors.iter().any(|e| e.contains("environment_id")));
                assert!(errors.iter().any(|e| e.contains("TRAIN")));
                assert!(errors.iter().any(|e| e.contains("sink")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
