//! Connection configuration for [`crate::EdgeClient`].

use std::time::Duration;

use dql::EdgeError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the server base URL.
pub const ENV_BASE_URL: &str = "DITTO_BASE_URL";
/// Environment variable holding the application (database) identifier.
pub const ENV_APP_ID: &str = "DITTO_APP_ID";
/// Environment variable holding the HTTP timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "DITTO_HTTP_TIMEOUT_SECS";
/// Environment variable overriding the collection used by the status probe.
pub const ENV_PROBE_COLLECTION: &str = "DITTO_PROBE_COLLECTION";

fn default_timeout() -> Duration {
    ClientConfig::DEFAULT_TIMEOUT
}

fn default_probe_collection() -> String {
    ClientConfig::DEFAULT_PROBE_COLLECTION.to_string()
}

/// Where and how to reach the Edge server's HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:8090`. A trailing
    /// slash is tolerated.
    pub base_url: String,

    /// Application (database) identifier; the second path segment of every
    /// request.
    pub app_id: String,

    /// Whole-request timeout applied by the HTTP client.
    #[serde(default = "default_timeout", rename = "timeout_secs", with = "secs")]
    pub timeout: Duration,

    /// Collection queried by the `status` probe.
    #[serde(default = "default_probe_collection")]
    pub probe_collection: String,
}

impl ClientConfig {
    /// Base URL used when none is configured.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8090";

    /// Request timeout used when none is configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Probe collection used when none is configured.
    pub const DEFAULT_PROBE_COLLECTION: &'static str = "chat";

    /// Creates a config with the default timeout and probe collection.
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            probe_collection: default_probe_collection(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the probe collection.
    #[must_use]
    pub fn with_probe_collection(mut self, collection: impl Into<String>) -> Self {
        self.probe_collection = collection.into();
        self
    }

    /// Reads the config from `DITTO_*` environment variables.
    ///
    /// `DITTO_APP_ID` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, EdgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EdgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        let app_id = lookup(ENV_APP_ID).ok_or_else(|| EdgeError::Configuration {
            message: format!("{ENV_APP_ID} is not set"),
        })?;

        let mut config = Self::new(base_url, app_id);
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| EdgeError::Configuration {
                message: format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(collection) = lookup(ENV_PROBE_COLLECTION) {
            config.probe_collection = collection;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the config is usable.
    pub fn validate(&self) -> Result<(), EdgeError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| EdgeError::Configuration {
            message: format!("base URL '{}' is invalid: {e}", self.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EdgeError::Configuration {
                message: format!("base URL '{}' must use http or https", self.base_url),
            });
        }
        if self.app_id.trim().is_empty() {
            return Err(EdgeError::Configuration {
                message: "app id must not be empty".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(EdgeError::Configuration {
                message: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// `<base_url>/<app_id>/execute`, with any trailing slash on the base removed.
    pub fn execute_url(&self) -> String {
        format!("{}/{}/execute", self.base_url.trim_end_matches('/'), self.app_id)
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn env_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_APP_ID, "exampledb")])).unwrap();
        assert_eq!(config.base_url, "http://localhost:8090");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.probe_collection, "chat");
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_APP_ID, "app"),
            (ENV_BASE_URL, "https://edge.internal:9000/"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_PROBE_COLLECTION, "health"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.probe_collection, "health");
        assert_eq!(config.execute_url(), "https://edge.internal:9000/app/execute");
    }

    #[test]
    fn missing_app_id_is_a_configuration_error() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, EdgeError::Configuration { .. }));
        assert!(err.to_string().contains(ENV_APP_ID));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_APP_ID, "a"), (ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("soon"));

        let err = ClientConfig::from_lookup(lookup(&[(ENV_APP_ID, "a"), (ENV_TIMEOUT_SECS, "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        assert!(ClientConfig::new("ftp://host", "a").validate().is_err());
        assert!(ClientConfig::new("not a url", "a").validate().is_err());
        assert!(ClientConfig::new("http://host", " ").validate().is_err());
        assert!(ClientConfig::new("http://host", "a").validate().is_ok());
    }

    #[test]
    fn deserialises_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://h:1", "app_id": "a", "timeout_secs": 7}"#)
                .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.probe_collection, "chat");
    }
}
