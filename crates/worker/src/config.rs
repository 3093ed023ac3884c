use std::fmt;

use crate::submit::DEFAULT_METHOD_TAG;

const DEFAULT_PLATFORM_API_URL: &str = "https://platform.flatfile.com/api/v1";
const DEFAULT_DESTINATION: &str = "webhook.site";
const DEFAULT_NAMESPACE: &str = "space:red";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Worker configuration loaded from environment variables.
///
/// Everything except the platform secret and the webhook URL has a default
/// suitable for local development.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Bind address for the event intake server (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Base URL of the platform REST API.
    pub platform_api_url: String,
    /// Platform secret key, sent as a bearer token.
    pub platform_api_key: String,
    /// Where submitted workbook data is POSTed.
    pub webhook_url: String,
    /// Name of the webhook receiver shown in job messages.
    pub webhook_destination: String,
    /// Value of `"method"` in every delivery body.
    pub submit_method_tag: String,
    /// Space namespace the record hook and submit action listen in.
    pub listener_namespace: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("platform_api_url", &self.platform_api_url)
            .field("platform_api_key", &"<redacted>")
            .field("webhook_url", &self.webhook_url)
            .field("webhook_destination", &self.webhook_destination)
            .field("submit_method_tag", &self.submit_method_tag)
            .field("listener_namespace", &self.listener_namespace)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                                |
    /// |-----------------------|----------------------------------------|
    /// | `HOST`                | `0.0.0.0`                              |
    /// | `PORT`                | `3000`                                 |
    /// | `PLATFORM_API_URL`    | `https://platform.flatfile.com/api/v1` |
    /// | `PLATFORM_API_KEY`    | required                               |
    /// | `WEBHOOK_URL`         | required                               |
    /// | `WEBHOOK_DESTINATION` | `webhook.site`                         |
    /// | `SUBMIT_METHOD_TAG`   | `reqwest`                              |
    /// | `LISTENER_NAMESPACE`  | `space:red`                            |
    /// | `LOG_FORMAT`          | `text` (`json` for JSON lines)         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port_raw = var("PORT", "3000");
        let port: u16 = port_raw
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "PORT",
                value: port_raw.clone(),
                reason: e.to_string(),
            })?;

        let platform_api_url = parse_url(
            "PLATFORM_API_URL",
            var("PLATFORM_API_URL", DEFAULT_PLATFORM_API_URL),
        )?;
        let webhook_url = parse_url("WEBHOOK_URL", required("WEBHOOK_URL")?)?;

        let log_json = match var("LOG_FORMAT", "text").as_str() {
            "json" => true,
            "text" => false,
            other => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected 'text' or 'json'".to_string(),
                })
            }
        };

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port,
            platform_api_url,
            platform_api_key: required("PLATFORM_API_KEY")?,
            webhook_url,
            webhook_destination: var("WEBHOOK_DESTINATION", DEFAULT_DESTINATION),
            submit_method_tag: var("SUBMIT_METHOD_TAG", DEFAULT_METHOD_TAG),
            listener_namespace: var("LISTENER_NAMESPACE", DEFAULT_NAMESPACE),
            log_json,
        })
    }
}

/// Require an absolute http(s) URL.
fn parse_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: value.clone(),
        reason,
    };
    let url = reqwest::Url::parse(&value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PLATFORM_API_KEY", "sk_test"),
            ("WEBHOOK_URL", "https://webhook.site/1234"),
        ]
    }

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let config = WorkerConfig::from_lookup(lookup(&minimal())).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.platform_api_url, DEFAULT_PLATFORM_API_URL);
        assert_eq!(config.webhook_destination, "webhook.site");
        assert_eq!(config.submit_method_tag, "reqwest");
        assert_eq!(config.listener_namespace, "space:red");
        assert!(!config.log_json);
    }

    #[test]
    fn missing_webhook_url_is_an_error() {
        let result = WorkerConfig::from_lookup(lookup(&[("PLATFORM_API_KEY", "sk_test")]));
        assert_matches!(result, Err(ConfigError::Missing("WEBHOOK_URL")));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut pairs = minimal();
        pairs[0] = ("PLATFORM_API_KEY", "  ");
        let result = WorkerConfig::from_lookup(lookup(&pairs));
        assert_matches!(result, Err(ConfigError::Missing("PLATFORM_API_KEY")));
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut pairs = minimal();
        pairs.push(("PORT", "http"));
        let result = WorkerConfig::from_lookup(lookup(&pairs));
        assert_matches!(result, Err(ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn webhook_url_must_be_http() {
        let mut pairs = minimal();
        pairs[1] = ("WEBHOOK_URL", "ftp://example.com/hook");
        let result = WorkerConfig::from_lookup(lookup(&pairs));
        assert_matches!(result, Err(ConfigError::Invalid { var: "WEBHOOK_URL", .. }));

        pairs[1] = ("WEBHOOK_URL", "<WEBHOOK URL>");
        let result = WorkerConfig::from_lookup(lookup(&pairs));
        assert_matches!(result, Err(ConfigError::Invalid { var: "WEBHOOK_URL", .. }));
    }

    #[test]
    fn overrides_are_respected() {
        let mut pairs = minimal();
        pairs.extend([
            ("PORT", "8080"),
            ("LISTENER_NAMESPACE", "space:blue"),
            ("SUBMIT_METHOD_TAG", "fetch"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = WorkerConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.listener_namespace, "space:blue");
        assert_eq!(config.submit_method_tag, "fetch");
        assert!(config.log_json);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = WorkerConfig::from_lookup(lookup(&minimal())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk_test"));
        assert!(debug.contains("<redacted>"));
    }
}
